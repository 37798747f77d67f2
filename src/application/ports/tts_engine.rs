//! TTS Engine Port - 外部语音合成能力抽象
//!
//! 黑盒：给定文本和音色，返回原始 PCM 或失败。具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No audio in response")]
    EmptyAudio,
}

/// 合成输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisInput {
    pub text: String,
    pub voice1: String,
    /// 第二说话人音色，存在时走双人朗读
    pub voice2: Option<String>,
}

/// 合成输出：16 位小端 PCM 原始样本
#[derive(Debug, Clone)]
pub struct PcmAudio {
    pub samples: Vec<u8>,
    /// 服务声明的采样率（如果有）
    pub sample_rate: Option<u32>,
}

/// TTS Engine Port
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 执行合成
    async fn synthesize(&self, input: SynthesisInput) -> Result<PcmAudio, TtsError>;
}
