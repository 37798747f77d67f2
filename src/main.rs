//! Quiz TTS - 题目语音合成服务
//!
//! 启动顺序: 配置 → 日志 → blob 目录 → 数据库 → 合成服务 → HTTP

use std::sync::Arc;

use quiz_tts::application::{SpeechSettings, SynthesizeSpeechHandler, TtsEnginePort};
use quiz_tts::config::{load_config, print_config, AppConfig, TtsProvider};
use quiz_tts::infrastructure::adapters::{
    FakeTtsClient, FakeTtsClientConfig, FileBlobStore, GeminiTtsClient, GeminiTtsClientConfig,
};
use quiz_tts::infrastructure::http::{AppState, HttpServer, ServerConfig};
use quiz_tts::infrastructure::memory::InMemoryEntityLocks;
use quiz_tts::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteQuestionAudioRepository,
};

fn create_tts_engine(config: &AppConfig) -> anyhow::Result<Arc<dyn TtsEnginePort>> {
    let engine: Arc<dyn TtsEnginePort> = match config.tts.provider {
        TtsProvider::Gemini => {
            let tts_config = GeminiTtsClientConfig {
                base_url: config.tts.base_url.clone(),
                api_key: config.tts.api_key.clone(),
                model: config.tts.model.clone(),
                timeout_secs: config.tts.timeout_secs,
                ..Default::default()
            };
            Arc::new(GeminiTtsClient::new(tts_config)?)
        }
        TtsProvider::Fake => Arc::new(FakeTtsClient::new(FakeTtsClientConfig {
            sample_rate: config.audio.sample_rate,
            ..Default::default()
        })),
    };
    Ok(engine)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},quiz_tts={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Quiz TTS - 题目语音合成服务");
    print_config(&config);

    // blob 目录在启动时显式创建
    let blob_store = Arc::new(FileBlobStore::open(&config.storage.audio_dir).await?);

    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config =
        DatabaseConfig::new(&config.database.path).with_max_connections(config.database.max_connections);
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    let question_repo = Arc::new(SqliteQuestionAudioRepository::new(pool));
    let tts_engine = create_tts_engine(&config)?;

    let settings = SpeechSettings {
        default_voice1: config.tts.default_voice1.clone(),
        default_voice2: config.tts.default_voice2.clone(),
        max_text_chars: config.tts.max_text_chars,
        format: config.audio.pcm_format(),
    };
    let mut handler = SynthesizeSpeechHandler::new(settings, tts_engine, blob_store, question_repo);
    if config.tts.serialize_entity_regeneration {
        handler = handler.with_entity_locks(InMemoryEntityLocks::new().arc());
    }

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(handler, config.tts.provider.as_str());
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
