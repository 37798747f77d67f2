//! Entity Lock Port - 按题目串行化音频重新生成
//!
//! 可选：不启用时同一题目的并发请求可能各自合成，最后写入的指针生效

use async_trait::async_trait;

use crate::domain::speech::QuestionId;

/// 持有期间同一题目的其他请求会等待；drop 即释放
pub struct EntityLockGuard(#[allow(dead_code)] Box<dyn Send>);

impl EntityLockGuard {
    pub fn new(inner: impl Send + 'static) -> Self {
        Self(Box::new(inner))
    }
}

/// Entity Lock Port
#[async_trait]
pub trait EntityLockPort: Send + Sync {
    /// 获取题目的重新生成锁
    async fn lock(&self, question_id: QuestionId) -> EntityLockGuard;
}
