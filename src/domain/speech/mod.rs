//! Speech Context - 语音合成限界上下文
//!
//! 职责:
//! - 合成请求校验（文本、音色、题目）
//! - 缓存 key 的两种命名空间

mod cache_key;
mod errors;
mod value_objects;

pub use cache_key::{CacheKey, CacheKeyResolver, GenerationClock, KeyNamespace};
pub use errors::SpeechError;
pub use value_objects::{QuestionId, SpeechRequest, SpeechText, VoicePair};
