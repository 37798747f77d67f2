//! Speech Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpeechError {
    #[error("Text is required")]
    EmptyText,

    #[error("Text too long: {chars} characters, limit {limit}")]
    TextTooLong { chars: usize, limit: usize },

    #[error("Invalid question id: {0}")]
    InvalidQuestionId(i64),

    #[error("No voice configured")]
    MissingVoice,

    #[error("Invalid cache key: {0}")]
    InvalidCacheKey(String),
}
