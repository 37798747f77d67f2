//! Storage Adapter - 文件系统 blob 存储

mod file_storage;

pub use file_storage::{FileBlobStore, AUDIO_EXTENSION};
