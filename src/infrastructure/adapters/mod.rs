//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现：合成服务客户端和 blob 存储

pub mod storage;
pub mod tts;

pub use storage::*;
pub use tts::*;
