//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, TtsProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "QUIZ_TTS";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `QUIZ_TTS_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `QUIZ_TTS_SERVER__PORT=8080`
/// - `QUIZ_TTS_TTS__API_KEY=...`
/// - `QUIZ_TTS_TTS__DEFAULT_VOICE2=Puck`
/// - `QUIZ_TTS_STORAGE__AUDIO_DIR=/var/lib/quiz/audio`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("tts.provider", "gemini")?
        .set_default("tts.base_url", "https://generativelanguage.googleapis.com")?
        .set_default("tts.model", "gemini-2.5-flash-preview-tts")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("tts.default_voice1", "Kore")?
        .set_default("tts.max_text_chars", 5000)?
        .set_default("tts.serialize_entity_regeneration", false)?
        .set_default("audio.sample_rate", 24_000)?
        .set_default("audio.channels", 1)?
        .set_default("audio.bits_per_sample", 16)?
        .set_default("database.path", "data/quiz.db")?
        .set_default("database.max_connections", 5)?
        .set_default("storage.audio_dir", "data/audio")?
        .set_default("log.level", "info")?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: QUIZ_TTS_TTS__MODEL=gemini-2.5-pro-preview-tts
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("Server port cannot be 0"));
    }

    if config.tts.provider == TtsProvider::Gemini {
        if config.tts.base_url.trim().is_empty() {
            return Err(invalid("TTS base_url cannot be empty"));
        }
        if config.tts.api_key.trim().is_empty() {
            return Err(invalid("TTS api_key is required for the gemini provider"));
        }
    }

    if config.tts.default_voice1.trim().is_empty() {
        return Err(invalid("TTS default_voice1 cannot be empty"));
    }

    if config.tts.timeout_secs == 0 {
        return Err(invalid("TTS timeout cannot be 0"));
    }

    // 容器编码只支持 16 位 PCM
    if config.audio.bits_per_sample != 16 {
        return Err(invalid("Audio bits_per_sample must be 16"));
    }

    if config.audio.sample_rate == 0 || config.audio.channels == 0 {
        return Err(invalid("Audio sample_rate and channels must be positive"));
    }

    if config.database.path.is_empty() {
        return Err(invalid("Database path cannot be empty"));
    }

    if config.storage.audio_dir.as_os_str().is_empty() {
        return Err(invalid("Storage audio_dir cannot be empty"));
    }

    Ok(())
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        "<unset>".to_string()
    } else if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", secret.chars().take(4).collect::<String>())
    }
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("TTS Provider: {}", config.tts.provider.as_str());
    tracing::info!("TTS Base URL: {}", config.tts.base_url);
    tracing::info!("TTS Model: {}", config.tts.model);
    tracing::info!("TTS API Key: {}", mask_secret(&config.tts.api_key));
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!(
        "Default Voices: {} / {}",
        config.tts.default_voice1,
        config.tts.default_voice2.as_deref().unwrap_or("-")
    );
    tracing::info!("Max Text Chars: {}", config.tts.max_text_chars);
    tracing::info!(
        "Serialize Entity Regeneration: {}",
        config.tts.serialize_entity_regeneration
    );
    tracing::info!(
        "Audio Format: {}Hz {}ch {}bit",
        config.audio.sample_rate,
        config.audio.channels,
        config.audio.bits_per_sample
    );
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Audio Directory: {:?}", config.storage.audio_dir);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
