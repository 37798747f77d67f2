//! Domain Layer - 领域层
//!
//! - Speech Context: 合成请求与缓存 key
//! - WAV 容器编码（纯函数）

pub mod speech;

mod wav_container;

pub use wav_container::{
    encode_wav, read_wav, PcmFormat, WavContainer, WavError, WAV_HEADER_LEN,
};
