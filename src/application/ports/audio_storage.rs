//! Audio Storage Port - 出站端口
//!
//! 以缓存 key 为名的不可变音频 blob 存储

use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::domain::speech::CacheKey;

/// Blob 存储错误
#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 打开的 blob 读取流
pub struct BlobStream {
    pub reader: Pin<Box<dyn AsyncRead + Send>>,
    /// 文件大小（字节），用于 Content-Length
    pub size: u64,
}

impl std::fmt::Debug for BlobStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStream")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Blob Store Port
///
/// - 写入后不可变，同一个 key 不会被覆盖写
/// - 写入必须是原子的：读者要么看不到文件，要么看到完整文件
#[async_trait]
pub trait BlobStorePort: Send + Sync {
    /// 检查 blob 是否存在
    async fn exists(&self, key: &CacheKey) -> Result<bool, BlobStoreError>;

    /// 打开读取流，不存在时返回 `None`
    async fn open_read_stream(&self, key: &CacheKey) -> Result<Option<BlobStream>, BlobStoreError>;

    /// 写入 blob
    async fn write(&self, key: &CacheKey, data: &[u8]) -> Result<(), BlobStoreError>;

    /// 获取 blob 大小（字节）
    async fn size_of(&self, key: &CacheKey) -> Result<u64, BlobStoreError>;
}
