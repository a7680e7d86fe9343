use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use hydralearn_api::auth::oauth::OAuthClient;
use hydralearn_api::auth::SessionCodec;
use hydralearn_api::config::AppConfig;
use hydralearn_api::database::{MemoryStore, PgStore, Store};
use hydralearn_api::handlers::app_registry;
use hydralearn_api::llm::{DisabledGenerator, OpenAiCompatible, TextGenerator};
use hydralearn_api::rpc::Dispatcher;
use hydralearn_api::server::{self, ServerState};
use hydralearn_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hydralearn_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting HydraLearn API in {:?} mode", config.environment);

    let store = open_store(&config).await?;
    let llm = text_generator(&config)?;
    let oauth = OAuthClient::from_config(&config.oauth)?;
    if oauth.is_none() {
        tracing::warn!("OAUTH_SERVER_URL not set; external login is disabled");
    }

    let sessions = SessionCodec::new(&config.session, &config.oauth.app_id)?;
    let registry = app_registry()?;
    tracing::info!("Registered {} procedures", registry.len());

    let port = config.server.port;
    let state = AppState::new(store.clone(), llm, config, sessions);
    let app = server::router(ServerState::new(Dispatcher::new(registry, state), oauth));

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("HydraLearn API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    if config.database.url.is_none() {
        tracing::warn!("DATABASE_URL not set; using the in-memory store (data is lost on exit)");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PgStore::connect(&config.database).await?;
    if config.database.run_migrations {
        store.migrate().await?;
    }
    Ok(Arc::new(store))
}

fn text_generator(config: &AppConfig) -> anyhow::Result<Arc<dyn TextGenerator>> {
    match OpenAiCompatible::from_config(&config.llm)? {
        Some(client) => {
            tracing::info!(model = %config.llm.model, "Text generation backend configured");
            Ok(Arc::new(client))
        }
        None => {
            tracing::warn!("LLM_API_URL not set; AI procedures will report the backend as unavailable");
            Ok(Arc::new(DisabledGenerator))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
