//! Fake TTS Client - 用于测试和离线开发的 TTS 客户端
//!
//! 不调用外部服务，按文本长度生成一段正弦波 PCM

use async_trait::async_trait;
use std::f32::consts::PI;
use std::time::Duration;

use crate::application::ports::{PcmAudio, SynthesisInput, TtsEnginePort, TtsError};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 输出采样率
    pub sample_rate: u32,
    /// 每个字符对应的时长（毫秒）
    pub ms_per_char: u64,
    /// 音频时长上限（毫秒）
    pub max_duration_ms: u64,
    /// 模拟推理延迟
    pub latency: Duration,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            ms_per_char: 60,
            max_duration_ms: 10_000,
            latency: Duration::from_millis(50),
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            ms_per_char = config.ms_per_char,
            "FakeTtsClient initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }

    /// 第二说话人用更低的音高，方便人耳区分
    fn tone(&self, input: &SynthesisInput) -> Vec<u8> {
        let chars = input.text.chars().count() as u64;
        let duration_ms = (chars * self.config.ms_per_char)
            .clamp(100, self.config.max_duration_ms.max(100));
        let frames = (self.config.sample_rate as u64 * duration_ms / 1000) as usize;
        let frequency = if input.voice2.is_some() { 330.0 } else { 440.0 };

        let mut samples = Vec::with_capacity(frames * 2);
        for n in 0..frames {
            let t = n as f32 / self.config.sample_rate as f32;
            let value = (2.0 * PI * frequency * t).sin() * 0.3 * i16::MAX as f32;
            samples.extend_from_slice(&(value as i16).to_le_bytes());
        }
        samples
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, input: SynthesisInput) -> Result<PcmAudio, TtsError> {
        tracing::debug!(
            text_len = input.text.len(),
            voice1 = %input.voice1,
            voice2 = ?input.voice2,
            "FakeTtsClient: generating tone"
        );

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        Ok(PcmAudio {
            samples: self.tone(&input),
            sample_rate: Some(self.config.sample_rate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FakeTtsClient {
        FakeTtsClient::new(FakeTtsClientConfig {
            latency: Duration::ZERO,
            ..Default::default()
        })
    }

    fn input(text: &str, voice2: Option<&str>) -> SynthesisInput {
        SynthesisInput {
            text: text.to_string(),
            voice1: "Kore".to_string(),
            voice2: voice2.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_length_follows_text() {
        let client = client();
        // 10 字符 * 60ms = 600ms = 14400 帧 = 28800 字节
        let pcm = client.synthesize(input("0123456789", None)).await.unwrap();
        assert_eq!(pcm.samples.len(), 28_800);
        assert_eq!(pcm.sample_rate, Some(24_000));
    }

    #[tokio::test]
    async fn test_duration_is_clamped() {
        let client = client();
        let short = client.synthesize(input("a", None)).await.unwrap();
        assert_eq!(short.samples.len(), 4_800);

        let long = client.synthesize(input(&"x".repeat(1000), None)).await.unwrap();
        assert_eq!(long.samples.len(), 480_000);
    }

    #[tokio::test]
    async fn test_second_voice_changes_tone() {
        let client = client();
        let one = client.synthesize(input("question", None)).await.unwrap();
        let two = client.synthesize(input("question", Some("Puck"))).await.unwrap();
        assert_eq!(one.samples.len(), two.samples.len());
        assert_ne!(one.samples, two.samples);
    }
}
