//! Gemini TTS Client - 调用 Gemini generateContent 语音合成接口
//!
//! 实现 TtsEnginePort trait
//!
//! 外部 API:
//! POST {base_url}/v1beta/models/{model}:generateContent
//! Header: x-goog-api-key
//! Request: contents + generationConfig.responseModalities=["AUDIO"] + speechConfig
//! Response: candidates[0].content.parts[].inlineData { mimeType, data(base64) }
//!
//! 返回的音频通常是 `audio/L16;codec=pcm;rate=24000`，也兼容 `audio/wav`

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{PcmAudio, SynthesisInput, TtsEnginePort, TtsError};
use crate::domain::read_wav;

/// Gemini TTS 客户端配置
#[derive(Debug, Clone)]
pub struct GeminiTtsClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// API Key
    pub api_key: String,
    /// 模型名
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 双人朗读时两个说话人的标签（需与文本中的标签一致）
    pub speaker_labels: [String; 2],
}

impl Default for GeminiTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            model: "gemini-2.5-flash-preview-tts".to_string(),
            timeout_secs: 120,
            speaker_labels: ["Speaker1".to_string(), "Speaker2".to_string()],
        }
    }
}

impl GeminiTtsClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

// ============================================================================
// 请求体
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
    speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum SpeechConfig {
    VoiceConfig(VoiceConfig),
    MultiSpeakerVoiceConfig(MultiSpeakerVoiceConfig),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

impl VoiceConfig {
    fn named(voice: &str) -> Self {
        Self {
            prebuilt_voice_config: PrebuiltVoiceConfig {
                voice_name: voice.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MultiSpeakerVoiceConfig {
    speaker_voice_configs: Vec<SpeakerVoiceConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeakerVoiceConfig {
    speaker: String,
    voice_config: VoiceConfig,
}

// ============================================================================
// 响应体
// ============================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

/// Gemini TTS 客户端
pub struct GeminiTtsClient {
    client: Client,
    config: GeminiTtsClientConfig,
}

impl GeminiTtsClient {
    /// 创建新的客户端
    pub fn new(config: GeminiTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取合成 URL
    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, input: &SynthesisInput) -> GenerateContentRequest {
        let speech_config = match &input.voice2 {
            Some(voice2) => SpeechConfig::MultiSpeakerVoiceConfig(MultiSpeakerVoiceConfig {
                speaker_voice_configs: vec![
                    SpeakerVoiceConfig {
                        speaker: self.config.speaker_labels[0].clone(),
                        voice_config: VoiceConfig::named(&input.voice1),
                    },
                    SpeakerVoiceConfig {
                        speaker: self.config.speaker_labels[1].clone(),
                        voice_config: VoiceConfig::named(voice2),
                    },
                ],
            }),
            None => SpeechConfig::VoiceConfig(VoiceConfig::named(&input.voice1)),
        };

        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![TextPart {
                    text: input.text.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO"],
                speech_config,
            },
        }
    }
}

/// 从 `audio/L16;codec=pcm;rate=24000` 中取出采样率
fn parse_rate(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .find(|(name, _)| name.eq_ignore_ascii_case("rate"))
        .and_then(|(_, value)| value.trim().parse().ok())
}

fn is_wav(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or("").trim();
    matches!(
        essence.to_ascii_lowercase().as_str(),
        "audio/wav" | "audio/x-wav" | "audio/wave"
    )
}

/// 取出第一个带音频的 part 并解码为 PCM
fn extract_pcm(response: GenerateContentResponse) -> Result<PcmAudio, TtsError> {
    let inline = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.inline_data)
        .ok_or(TtsError::EmptyAudio)?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(inline.data.as_bytes())
        .map_err(|e| TtsError::InvalidResponse(format!("Invalid base64 audio: {}", e)))?;

    let pcm = if is_wav(&inline.mime_type) {
        let container = read_wav(&bytes)
            .map_err(|e| TtsError::InvalidResponse(format!("Invalid WAV payload: {}", e)))?;
        PcmAudio {
            samples: container.samples.to_vec(),
            sample_rate: Some(container.format.sample_rate),
        }
    } else {
        PcmAudio {
            sample_rate: parse_rate(&inline.mime_type),
            samples: bytes,
        }
    };

    if pcm.samples.is_empty() {
        return Err(TtsError::EmptyAudio);
    }

    Ok(pcm)
}

#[async_trait]
impl TtsEnginePort for GeminiTtsClient {
    async fn synthesize(&self, input: SynthesisInput) -> Result<PcmAudio, TtsError> {
        let body = self.build_request(&input);

        tracing::debug!(
            url = %self.generate_url(),
            text_len = input.text.len(),
            voice1 = %input.voice1,
            voice2 = ?input.voice2,
            "Sending TTS request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let pcm = extract_pcm(parsed)?;

        tracing::info!(
            model = %self.config.model,
            sample_rate = ?pcm.sample_rate,
            audio_size = pcm.samples.len(),
            "TTS synthesis completed"
        );

        Ok(pcm)
    }
}
