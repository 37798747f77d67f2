//! Speech Commands - 语音合成命令

use crate::application::ports::BlobStream;
use crate::domain::speech::CacheKey;

/// WAV 的 MIME 类型
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

/// 获取（必要时合成）题目或任意文本的音频
#[derive(Debug, Clone, Default)]
pub struct SynthesizeSpeechCommand {
    pub text: String,
    pub voice1: Option<String>,
    pub voice2: Option<String>,
    pub question_id: Option<i64>,
}

/// 缓存状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// 直接从 blob 存储读取
    Hit,
    /// 本次请求新合成
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }
}

/// 音频内容：缓存命中时是文件流，新合成时是内存中的字节
#[derive(Debug)]
pub enum AudioBody {
    Stream(BlobStream),
    Bytes(Vec<u8>),
}

/// 合成响应
#[derive(Debug)]
pub struct SpeechAudio {
    pub key: CacheKey,
    pub cache: CacheStatus,
    pub content_type: &'static str,
    pub content_length: u64,
    pub body: AudioBody,
}

impl SpeechAudio {
    pub fn cached(key: CacheKey, stream: BlobStream) -> Self {
        Self {
            key,
            cache: CacheStatus::Hit,
            content_type: WAV_CONTENT_TYPE,
            content_length: stream.size,
            body: AudioBody::Stream(stream),
        }
    }

    pub fn fresh(key: CacheKey, wav: Vec<u8>) -> Self {
        Self {
            key,
            cache: CacheStatus::Miss,
            content_type: WAV_CONTENT_TYPE,
            content_length: wav.len() as u64,
            body: AudioBody::Bytes(wav),
        }
    }
}
