//! 应用层错误定义
//!
//! 统一的命令错误类型

use thiserror::Error;

use crate::application::ports::{BlobStoreError, RepositoryError, TtsError};
use crate::domain::speech::SpeechError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误（在任何状态迁移之前拒绝）
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 外部合成服务失败或没有返回音频
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    /// 新 blob 写入失败，指针未更新
    #[error("Failed to store audio: {0}")]
    StoreWriteFailed(String),

    /// 存储读取错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

impl From<SpeechError> for ApplicationError {
    fn from(err: SpeechError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<BlobStoreError> for ApplicationError {
    fn from(err: BlobStoreError) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<TtsError> for ApplicationError {
    fn from(err: TtsError) -> Self {
        Self::SynthesisFailed(err.to_string())
    }
}
