//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、BlobStore、QuestionAudioRepository、EntityLock）
//! - commands: 语音合成命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;

// Re-exports
pub use commands::{
    handlers::{SpeechSettings, SynthesizeSpeechHandler},
    AudioBody, CacheStatus, SpeechAudio, SynthesizeSpeechCommand, WAV_CONTENT_TYPE,
};

pub use error::ApplicationError;

pub use ports::{
    // Blob store
    BlobStoreError,
    BlobStorePort,
    BlobStream,
    // Entity lock
    EntityLockGuard,
    EntityLockPort,
    // Repositories
    QuestionAudioRepositoryPort,
    RepositoryError,
    // TTS engine
    PcmAudio,
    SynthesisInput,
    TtsEnginePort,
    TtsError,
};
