//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_storage;
mod entity_lock;
mod repositories;
mod tts_engine;

pub use audio_storage::{BlobStoreError, BlobStorePort, BlobStream};
pub use entity_lock::{EntityLockGuard, EntityLockPort};
pub use repositories::{QuestionAudioRepositoryPort, RepositoryError};
pub use tts_engine::{PcmAudio, SynthesisInput, TtsEnginePort, TtsError};
