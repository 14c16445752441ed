use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sheetchat_api::{build_router, config::Config, state::AppState};
use sheetchat_llm::OpenAIClient;
use sheetchat_persist::{PersistenceClient, SqlitePersistenceClient};
use sheetchat_relay::{ChatRelay, SheetToolExecutor};
use sheetchat_workbook::Workbook;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting Sheetchat API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Initialize persistence client (SQLite)
    tracing::info!(url = %config.storage.database_url, "Opening database");
    let sqlite = SqlitePersistenceClient::connect(&config.storage.database_url).await?;
    let persist: Arc<dyn PersistenceClient> = Arc::new(sqlite);

    // Open (or seed) the workbook
    let workbook = Workbook::open(&config.storage.workbook_path)?;
    tracing::info!(path = %workbook.path().display(), "Workbook ready");

    // Initialize the chat relay when a provider key is available
    let relay = match config.openai_api_key.clone() {
        Some(api_key) => {
            let mut client = OpenAIClient::new(api_key)?;
            if let Some(base_url) = &config.openai_base_url {
                tracing::info!(base_url = %base_url, "Using alternate OpenAI base URL");
                client = client.with_base_url(base_url.clone());
            }
            let executor = SheetToolExecutor::new(workbook.clone());
            Some(ChatRelay::new(
                Arc::new(client),
                Arc::new(executor),
                config.llm.model.clone(),
            ))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY is not set; chat requests will fail with 500");
            None
        }
    };

    // Create application state
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&persist), workbook, relay));

    // Build router
    let app = build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    persist.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
