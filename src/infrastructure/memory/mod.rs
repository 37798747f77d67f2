//! Memory Layer - In-Memory State Management
//!
//! 按题目的重新生成锁，只在单进程内有效

mod entity_locks;

pub use entity_locks::InMemoryEntityLocks;
