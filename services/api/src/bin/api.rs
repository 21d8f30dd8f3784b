//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{JsonFileStore, OpenAiChatAdapter, OpenAiSstAdapter, OpenAiTtsAdapter},
    config::Config,
    error::ApiError,
    web::{build_router, AppState},
};
use async_openai::{config::OpenAIConfig, types::audio::SpeechModel, Client};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutor_core::{seed::sample_scenarios, ScenarioStore};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Scenario Catalogue ---
    let store = Arc::new(JsonFileStore::new(
        config.scenarios_dir.clone(),
        config.progress_dir.clone(),
    ));
    let mut scenarios = ScenarioStore::open(store.clone()).await?;
    if scenarios.is_empty() && config.seed_sample_scenarios {
        info!("Scenario catalogue is empty, writing the sample scenarios");
        for scenario in sample_scenarios() {
            scenarios.save(scenario).await?;
        }
    }
    info!(count = scenarios.len(), dir = %config.scenarios_dir.display(), "Scenarios ready");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(config.require_openai_api_key()?);
    let openai_client = Client::with_config(openai_config);

    let conversation = Arc::new(OpenAiChatAdapter::new(
        openai_client.clone(),
        config.chat_model.clone(),
    ));
    let summarizer = Arc::new(OpenAiChatAdapter::new(
        openai_client.clone(),
        config.summary_model.clone(),
    ));
    let sst_adapter = Arc::new(OpenAiSstAdapter::new(
        openai_client.clone(),
        config.stt_model.clone(),
    ));
    let tts_adapter = Arc::new(OpenAiTtsAdapter::new(openai_client, SpeechModel::Tts1));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        scenarios: RwLock::new(scenarios),
        progress_repo: store,
        progress_lock: Mutex::new(()),
        conversation,
        summarizer,
        sst_adapter,
        tts_adapter,
    });

    // --- 5. Create the Web Router ---
    let app = build_router(app_state)?;

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
