mod handlers;
mod metrics;
mod routes;
mod store;

use axum::Router;
use examrunner_common::{Config, LanguageCatalog};
use examrunner_grader::{Executor, PistonEngine, QuestionTracker, SubmissionRunner};
use redis::aio::ConnectionManager;
use std::path::Path;
use std::sync::Arc;
use store::{RedisStore, SubmissionStore};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubmissionStore>,
    pub runner: Arc<dyn SubmissionRunner>,
    pub tracker: QuestionTracker,
    /// Catalog language names, used to bound metric labels
    pub languages: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .with_target(false)
        .init();

    info!("Examrunner API booting...");

    let config = Config::from_env();

    metrics::init_metrics()?;
    info!("Metrics registry initialized");

    // Load language catalog
    let catalog = LanguageCatalog::load_or_empty(Path::new(&config.language_config_path))?;
    let languages = catalog.list_languages();
    if catalog.entries().is_empty() {
        warn!(
            path = %config.language_config_path,
            "No language catalog found; every language runs with the wildcard version"
        );
    } else {
        info!(languages = ?languages, "Loaded language catalog");
    }

    let engine = PistonEngine::new(config.execution_api_url.clone())
        .with_timeout(config.execution_timeout);
    let executor = Executor::new(engine, catalog)
        .with_limits(config.max_source_bytes, config.max_input_bytes);

    info!(
        url = %config.execution_api_url,
        timeout_ms = ?config.execution_timeout.map(|t| t.as_millis()),
        "Execution service configured"
    );

    // Connect to Redis
    let client = redis::Client::open(config.redis_url.as_str())?;
    let redis_conn = ConnectionManager::new(client).await?;

    info!("Connected to Redis: {}", config.redis_url);

    let state = Arc::new(AppState {
        store: Arc::new(RedisStore::new(redis_conn)),
        runner: Arc::new(executor),
        tracker: QuestionTracker::new(),
        languages,
    });

    // Build router
    let app = Router::new()
        .merge(routes::routes())
        .with_state(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
