//! In-Memory Entity Locks Implementation

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::application::ports::{EntityLockGuard, EntityLockPort};
use crate::domain::speech::QuestionId;

type LockMap = DashMap<i64, Arc<Mutex<()>>>;

/// 内存题目锁
///
/// 每个题目一个 `tokio::sync::Mutex`，最后一个持有者释放时从表中移除
pub struct InMemoryEntityLocks {
    locks: Arc<LockMap>,
}

impl InMemoryEntityLocks {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 当前被持有或等待中的题目数
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

impl Default for InMemoryEntityLocks {
    fn default() -> Self {
        Self::new()
    }
}

struct QuestionLock {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
    question_id: i64,
}

impl Drop for QuestionLock {
    fn drop(&mut self) {
        // 先释放互斥锁，再判断是否还有等待者
        drop(self.guard.take());
        self.locks
            .remove_if(&self.question_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[async_trait]
impl EntityLockPort for InMemoryEntityLocks {
    async fn lock(&self, question_id: QuestionId) -> EntityLockGuard {
        let mutex = self
            .locks
            .entry(question_id.value())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;
        tracing::trace!(question_id = %question_id, "Question lock acquired");

        EntityLockGuard::new(QuestionLock {
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
            question_id: question_id.value(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn id(value: i64) -> QuestionId {
        QuestionId::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_lock_is_released_and_removed() {
        let locks = InMemoryEntityLocks::new();

        let guard = locks.lock(id(1)).await;
        assert_eq!(locks.active(), 1);
        drop(guard);
        assert_eq!(locks.active(), 0);

        // 可以再次获取
        let _guard = locks.lock(id(1)).await;
        assert_eq!(locks.active(), 1);
    }

    #[tokio::test]
    async fn test_different_questions_do_not_block() {
        let locks = InMemoryEntityLocks::new();

        let _a = locks.lock(id(1)).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(id(2))).await;
        assert!(b.is_ok());
        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn test_same_question_is_serialized() {
        let locks = InMemoryEntityLocks::new().arc();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            tasks.push(tokio::spawn(async move {
                let _guard = locks.lock(id(7)).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_waiter_keeps_entry_alive() {
        let locks = InMemoryEntityLocks::new().arc();
        let first = locks.lock(id(3)).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(id(3)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        // 等待者持有 Arc 时表项保留，全部释放后才移除
        waiter.await.unwrap();
        assert_eq!(locks.active(), 0);
    }
}
