//! Speech Command Handlers
//!
//! 合成编排：
//! - 题目请求: 读指针 → 打开 blob；指针为空或 blob 缺失则重新合成
//! - 任意文本: 计算内容 key → 打开 blob；缺失则合成
//! - 合成: 调用外部服务 → WAV 封装 → 写 blob → （题目请求）更新指针
//!
//! 指针只会在 blob 写入成功之后推进；指针指向缺失文件时自愈重建，而不是报错

use std::sync::Arc;
use std::time::Instant;

use crate::application::commands::speech_commands::{SpeechAudio, SynthesizeSpeechCommand};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    BlobStorePort, EntityLockPort, QuestionAudioRepositoryPort, RepositoryError, SynthesisInput,
    TtsEnginePort,
};
use crate::domain::speech::{
    CacheKey, CacheKeyResolver, KeyNamespace, QuestionId, SpeechRequest, SpeechText, VoicePair,
};
use crate::domain::{encode_wav, PcmFormat};

/// 合成参数
#[derive(Debug, Clone)]
pub struct SpeechSettings {
    /// 未指定 voice1 时使用
    pub default_voice1: String,
    /// 未指定 voice2 时使用，None 表示单人朗读
    pub default_voice2: Option<String>,
    /// 文本最大字符数，0 表示不限制
    pub max_text_chars: usize,
    /// 外部服务输出的 PCM 格式
    pub format: PcmFormat,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            default_voice1: "Kore".to_string(),
            default_voice2: None,
            max_text_chars: 5000,
            format: PcmFormat::default(),
        }
    }
}

/// SynthesizeSpeech Handler - 获取或合成音频
pub struct SynthesizeSpeechHandler {
    settings: SpeechSettings,
    tts_engine: Arc<dyn TtsEnginePort>,
    blob_store: Arc<dyn BlobStorePort>,
    question_repo: Arc<dyn QuestionAudioRepositoryPort>,
    entity_locks: Option<Arc<dyn EntityLockPort>>,
    resolver: CacheKeyResolver,
}

impl SynthesizeSpeechHandler {
    pub fn new(
        settings: SpeechSettings,
        tts_engine: Arc<dyn TtsEnginePort>,
        blob_store: Arc<dyn BlobStorePort>,
        question_repo: Arc<dyn QuestionAudioRepositoryPort>,
    ) -> Self {
        Self {
            settings,
            tts_engine,
            blob_store,
            question_repo,
            entity_locks: None,
            resolver: CacheKeyResolver::new(),
        }
    }

    /// 同一题目的重新生成串行执行，等待者会复用前一个请求的结果
    pub fn with_entity_locks(mut self, locks: Arc<dyn EntityLockPort>) -> Self {
        self.entity_locks = Some(locks);
        self
    }

    pub async fn handle(&self, cmd: SynthesizeSpeechCommand) -> Result<SpeechAudio, ApplicationError> {
        let request = self.build_request(cmd)?;

        match request.question_id {
            Some(question_id) => self.handle_question(&request, question_id).await,
            None => self.handle_content(&request).await,
        }
    }

    fn build_request(&self, cmd: SynthesizeSpeechCommand) -> Result<SpeechRequest, ApplicationError> {
        let text = SpeechText::new(cmd.text, self.settings.max_text_chars)?;
        let voices = VoicePair::resolve(
            cmd.voice1,
            cmd.voice2,
            &self.settings.default_voice1,
            self.settings.default_voice2.as_deref(),
        )?;
        let question_id = cmd.question_id.map(QuestionId::new).transpose()?;

        Ok(SpeechRequest {
            text,
            voices,
            question_id,
        })
    }

    async fn handle_question(
        &self,
        request: &SpeechRequest,
        question_id: QuestionId,
    ) -> Result<SpeechAudio, ApplicationError> {
        let _guard = match &self.entity_locks {
            Some(locks) => Some(locks.lock(question_id).await),
            None => None,
        };

        if let Some(cached) = self.lookup_question(question_id).await? {
            return Ok(cached);
        }

        let wav = self.synthesize(request).await?;

        let (_, key) = self.resolver.resolve(request);
        self.persist(&key, &wav).await?;

        // blob 已经落盘，指针更新失败只会让下次请求重新合成
        match self.question_repo.set_pointer(question_id, &key).await {
            Ok(()) => {
                tracing::info!(
                    question_id = %question_id,
                    key = %key,
                    "Question audio pointer advanced"
                );
            }
            Err(e) => {
                tracing::error!(
                    question_id = %question_id,
                    key = %key,
                    error = %e,
                    "Failed to update question audio pointer"
                );
            }
        }

        Ok(SpeechAudio::fresh(key, wav))
    }

    /// 读取题目指针并尝试打开 blob
    ///
    /// 返回 `None` 表示需要合成（无指针、指针无效或 blob 缺失）
    async fn lookup_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Option<SpeechAudio>, ApplicationError> {
        let pointer = self
            .question_repo
            .get_pointer(question_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => ApplicationError::not_found("Question", question_id),
                other => other.into(),
            })?;

        let Some(raw) = pointer else {
            tracing::debug!(question_id = %question_id, "No audio pointer, synthesizing");
            return Ok(None);
        };

        let key = match CacheKey::parse(&raw) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(
                    question_id = %question_id,
                    pointer = %raw,
                    error = %e,
                    "Unusable audio pointer, regenerating"
                );
                return Ok(None);
            }
        };

        match self.blob_store.open_read_stream(&key).await? {
            Some(stream) => {
                tracing::debug!(question_id = %question_id, key = %key, "Cache hit");
                Ok(Some(SpeechAudio::cached(key, stream)))
            }
            None => {
                tracing::warn!(
                    question_id = %question_id,
                    key = %key,
                    "Audio pointer references a missing blob, regenerating"
                );
                Ok(None)
            }
        }
    }

    async fn handle_content(&self, request: &SpeechRequest) -> Result<SpeechAudio, ApplicationError> {
        let (_, key) = self.resolver.resolve(request);

        if let Some(stream) = self.blob_store.open_read_stream(&key).await? {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(SpeechAudio::cached(key, stream));
        }

        tracing::debug!(key = %key, "Cache miss, synthesizing");
        let wav = self.synthesize(request).await?;
        self.persist(&key, &wav).await?;

        Ok(SpeechAudio::fresh(key, wav))
    }

    /// 调用外部服务并封装为 WAV
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, ApplicationError> {
        let input = SynthesisInput {
            text: request.text.as_str().to_string(),
            voice1: request.voices.primary().to_string(),
            voice2: request.voices.secondary().map(str::to_string),
        };

        let started = Instant::now();
        let pcm = self.tts_engine.synthesize(input).await.map_err(|e| {
            tracing::error!(error = %e, "TTS synthesis failed");
            ApplicationError::from(e)
        })?;

        if pcm.samples.is_empty() {
            tracing::error!("TTS service returned no audio samples");
            return Err(ApplicationError::SynthesisFailed(
                "No audio returned by the synthesis service".to_string(),
            ));
        }

        let format = self.settings.format;
        if let Some(rate) = pcm.sample_rate.filter(|rate| *rate != format.sample_rate) {
            tracing::warn!(
                reported = rate,
                expected = format.sample_rate,
                "TTS sample rate differs from configured format"
            );
        }

        let wav = encode_wav(&pcm.samples, format);

        tracing::info!(
            chars = request.text.char_count(),
            two_speaker = request.voices.is_two_speaker(),
            pcm_bytes = pcm.samples.len(),
            duration_ms = format.duration_ms(pcm.samples.len()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Speech synthesized"
        );

        Ok(wav)
    }

    /// 写入 blob 并确认完整落盘
    async fn persist(&self, key: &CacheKey, wav: &[u8]) -> Result<(), ApplicationError> {
        // 内容寻址的 blob 相同 key 即相同内容，并发请求可能已经写过
        if key.namespace() == KeyNamespace::Content && self.blob_store.exists(key).await? {
            tracing::debug!(key = %key, "Blob already written by a concurrent request");
            return Ok(());
        }

        self.blob_store.write(key, wav).await.map_err(|e| {
            tracing::error!(key = %key, error = %e, "Failed to write audio blob");
            ApplicationError::StoreWriteFailed(e.to_string())
        })?;

        let size = self
            .blob_store
            .size_of(key)
            .await
            .map_err(|e| ApplicationError::StoreWriteFailed(e.to_string()))?;
        if size != wav.len() as u64 {
            return Err(ApplicationError::StoreWriteFailed(format!(
                "Blob {} has {} bytes, expected {}",
                key,
                size,
                wav.len()
            )));
        }

        tracing::debug!(key = %key, size = size, "Audio blob stored");
        Ok(())
    }
}
