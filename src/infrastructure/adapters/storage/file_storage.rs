//! File Storage - 文件系统 blob 存储实现
//!
//! 实现 BlobStorePort trait
//!
//! 每个 key 对应目录下的一个 `<key>.wav` 文件。写入先落到同目录的临时文件，
//! 再 rename 到目标路径，读者不会看到写了一半的文件

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::application::ports::{BlobStoreError, BlobStorePort, BlobStream};
use crate::domain::speech::CacheKey;

/// 音频文件扩展名
pub const AUDIO_EXTENSION: &str = "wav";

/// 文件系统 blob 存储
pub struct FileBlobStore {
    /// 存储根目录
    base_dir: PathBuf,
}

impl FileBlobStore {
    /// 创建存储（不触碰文件系统，启动时需调用 `init`）
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// 确保存储目录存在
    pub async fn init(&self) -> Result<(), BlobStoreError> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| BlobStoreError::IoError(e.to_string()))?;

        tracing::info!(dir = %self.base_dir.display(), "Blob store ready");
        Ok(())
    }

    /// 创建并初始化
    pub async fn open(base_dir: impl AsRef<Path>) -> Result<Self, BlobStoreError> {
        let store = Self::new(base_dir);
        store.init().await?;
        Ok(store)
    }

    /// 获取存储根目录
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 获取 blob 文件路径
    pub fn blob_path(&self, key: &CacheKey) -> PathBuf {
        self.base_dir
            .join(format!("{}.{}", key.as_str(), AUDIO_EXTENSION))
    }

    fn temp_path(&self, key: &CacheKey) -> PathBuf {
        self.base_dir
            .join(format!(".{}.{}.tmp", key.as_str(), Uuid::new_v4().simple()))
    }

    async fn write_temp(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl BlobStorePort for FileBlobStore {
    async fn exists(&self, key: &CacheKey) -> Result<bool, BlobStoreError> {
        fs::try_exists(self.blob_path(key))
            .await
            .map_err(|e| BlobStoreError::IoError(e.to_string()))
    }

    async fn open_read_stream(&self, key: &CacheKey) -> Result<Option<BlobStream>, BlobStoreError> {
        let path = self.blob_path(key);

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BlobStoreError::IoError(e.to_string())),
        };

        let size = file
            .metadata()
            .await
            .map_err(|e| BlobStoreError::IoError(e.to_string()))?
            .len();

        Ok(Some(BlobStream {
            reader: Box::pin(file),
            size,
        }))
    }

    async fn write(&self, key: &CacheKey, data: &[u8]) -> Result<(), BlobStoreError> {
        let temp_path = self.temp_path(key);

        if let Err(e) = Self::write_temp(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(BlobStoreError::IoError(e.to_string()));
        }

        let blob_path = self.blob_path(key);
        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(BlobStoreError::IoError(e.to_string()));
        }

        tracing::debug!(
            key = %key,
            size = data.len(),
            "Saved audio blob"
        );

        Ok(())
    }

    async fn size_of(&self, key: &CacheKey) -> Result<u64, BlobStoreError> {
        match fs::metadata(self.blob_path(key)).await {
            Ok(metadata) => Ok(metadata.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BlobStoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(BlobStoreError::IoError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::speech::QuestionId;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;

    fn key(generation: i64) -> CacheKey {
        CacheKey::entity(QuestionId::new(7).unwrap(), generation)
    }

    #[tokio::test]
    async fn test_write_and_read_blob() {
        let temp_dir = tempdir().unwrap();
        let store = FileBlobStore::open(temp_dir.path()).await.unwrap();
        let key = key(1);
        let data = b"fake wav data";

        assert!(!store.exists(&key).await.unwrap());
        assert!(store.open_read_stream(&key).await.unwrap().is_none());

        store.write(&key, data).await.unwrap();

        assert!(store.exists(&key).await.unwrap());
        assert_eq!(store.size_of(&key).await.unwrap(), data.len() as u64);
        assert!(temp_dir.path().join("entity_7_1.wav").exists());

        let mut stream = store.open_read_stream(&key).await.unwrap().unwrap();
        assert_eq!(stream.size, data.len() as u64);
        let mut read_data = Vec::new();
        stream.reader.read_to_end(&mut read_data).await.unwrap();
        assert_eq!(read_data, data);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let temp_dir = tempdir().unwrap();
        let store = FileBlobStore::open(temp_dir.path()).await.unwrap();

        for generation in 0..3 {
            store.write(&key(generation), b"data").await.unwrap();
        }

        let mut names = Vec::new();
        let mut entries = fs::read_dir(temp_dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        assert_eq!(
            names,
            vec!["entity_7_0.wav", "entity_7_1.wav", "entity_7_2.wav"]
        );
    }

    #[tokio::test]
    async fn test_size_of_missing_blob() {
        let temp_dir = tempdir().unwrap();
        let store = FileBlobStore::open(temp_dir.path()).await.unwrap();

        assert!(matches!(
            store.size_of(&key(9)).await,
            Err(BlobStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_init_creates_nested_directory() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path().join("data").join("audio");
        let store = FileBlobStore::new(&dir);
        assert!(!dir.exists());

        store.init().await.unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.base_dir(), dir.as_path());
    }

    #[tokio::test]
    async fn test_write_fails_when_directory_missing() {
        let temp_dir = tempdir().unwrap();
        let store = FileBlobStore::new(temp_dir.path().join("missing"));

        let err = store.write(&key(1), b"data").await.unwrap_err();
        assert!(matches!(err, BlobStoreError::IoError(_)));
        assert!(!store.exists(&key(1)).await.unwrap());
    }
}
