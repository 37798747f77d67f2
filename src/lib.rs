//! Quiz TTS - 题目语音合成缓存与音频分发
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - speech: 缓存 key（题目 key / 内容 key）、文本与音色值对象
//! - wav_container: PCM → WAV 容器编码
//!
//! 应用层 (application/):
//! - Ports: TtsEngine, BlobStore, QuestionAudioRepository, EntityLock
//! - Commands: 语音合成编排（指针自愈、先写 blob 再推进指针）
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: /api/tts, /api/ping
//! - Adapters: Gemini TTS Client, 文件 blob 存储
//! - Persistence: SQLite 题目音频指针
//! - Memory: 按题目的重新生成锁

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
