//! Repository Ports - 出站端口
//!
//! 题目表由外部 CRUD 层维护，这里只暴露它的一个可空字段：当前音频的缓存 key

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::speech::{CacheKey, QuestionId};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Question Audio Repository Port
///
/// 指针是对 blob 的弱引用：非空不代表文件一定存在
#[async_trait]
pub trait QuestionAudioRepositoryPort: Send + Sync {
    /// 读取题目当前的音频指针
    ///
    /// 题目不存在时返回 `RepositoryError::NotFound`；返回原始字符串，由调用方校验
    async fn get_pointer(&self, question_id: QuestionId) -> Result<Option<String>, RepositoryError>;

    /// 更新题目的音频指针
    async fn set_pointer(
        &self,
        question_id: QuestionId,
        key: &CacheKey,
    ) -> Result<(), RepositoryError>;
}
