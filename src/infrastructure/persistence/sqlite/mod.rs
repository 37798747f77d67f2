//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod question_audio_repo;

pub use database::*;
pub use question_audio_repo::*;
