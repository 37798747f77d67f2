//! SQLite Question Audio Repository

use async_trait::async_trait;
use chrono::Utc;

use super::DbPool;
use crate::application::ports::{QuestionAudioRepositoryPort, RepositoryError};
use crate::domain::speech::{CacheKey, QuestionId};

/// SQLite Question Audio Repository
pub struct SqliteQuestionAudioRepository {
    pool: DbPool,
}

impl SqliteQuestionAudioRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 写入（或更新）题目文本，不改动已有的音频指针
    ///
    /// 正常由题库管理负责，这里用于初始化数据和测试
    pub async fn upsert_question(
        &self,
        question_id: QuestionId,
        text: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO questions (id, text) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET text = excluded.text
            "#,
        )
        .bind(question_id.value())
        .bind(text)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl QuestionAudioRepositoryPort for SqliteQuestionAudioRepository {
    async fn get_pointer(&self, question_id: QuestionId) -> Result<Option<String>, RepositoryError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT audio_key FROM questions WHERE id = ?")
                .bind(question_id.value())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        match row {
            Some((pointer,)) => Ok(pointer.filter(|key| !key.is_empty())),
            None => Err(RepositoryError::NotFound(format!("question {}", question_id))),
        }
    }

    async fn set_pointer(
        &self,
        question_id: QuestionId,
        key: &CacheKey,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE questions SET audio_key = ?, audio_updated_at = ? WHERE id = ?")
                .bind(key.as_str())
                .bind(Utc::now().to_rfc3339())
                .bind(question_id.value())
                .execute(&self.pool)
                .await
                .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("question {}", question_id)));
        }

        tracing::debug!(
            question_id = %question_id,
            key = %key,
            "Question audio pointer updated"
        );

        Ok(())
    }
}
