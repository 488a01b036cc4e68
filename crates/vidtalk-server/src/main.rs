//! VidTalk Server - Main entry point

use anyhow::Result;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;
use vidtalk_common::logging::{init_logging, LogConfig};

use vidtalk_server::{
    ai::gemini::GeminiClient,
    api::{self, AppState},
    config::Config,
    db,
    features::{
        auth::Bcrypt,
        chats::{SessionLocks, SessionReconciler},
    },
    storage::Storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let log_config = LogConfig::builder()
        .log_file_prefix("vidtalk-server")
        .filter_directives("vidtalk_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting VidTalk Server");

    let config = Config::load()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        model = %config.gemini.model,
        "Configuration loaded"
    );

    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    let storage = Arc::new(Storage::new(config.storage.clone()).await?);

    let gemini = Arc::new(GeminiClient::new(config.gemini.clone())?);

    let reconciler = SessionReconciler::new(
        db_pool.clone(),
        storage.clone(),
        gemini.clone(),
        gemini,
        SessionLocks::default(),
    );

    let state = AppState {
        db: db_pool,
        media: storage,
        hasher: Arc::new(Bcrypt::default()),
        reconciler,
        auth: config.auth.clone(),
    };

    let app = api::create_router(state, &config.server, &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
