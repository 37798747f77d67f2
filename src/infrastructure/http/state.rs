//! Application State
//!
//! HTTP handler 共享的应用状态

use std::sync::Arc;

use crate::application::SynthesizeSpeechHandler;

/// 应用状态
pub struct AppState {
    pub synthesize_handler: SynthesizeSpeechHandler,
    /// 合成服务名称，用于健康检查
    pub tts_provider: String,
}

impl AppState {
    /// 创建应用状态
    pub fn new(synthesize_handler: SynthesizeSpeechHandler, tts_provider: impl Into<String>) -> Self {
        Self {
            synthesize_handler,
            tts_provider: tts_provider.into(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}
