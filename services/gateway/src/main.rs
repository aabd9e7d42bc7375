mod config;
mod error;
mod handlers;
mod models;
mod router;
mod state;

use axum::Router;
use config::GatewayConfig;
use matching_engine::MemoryStore;
use router::create_router;
use state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Gateway API service");

    let config = GatewayConfig::from_env()?;
    let addr = config.socket_addr();
    let grace = config.shutdown_grace;

    let (state, pool) = build_state(config).await?;
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    let served = serve(listener, app, grace).await;
    close_pool(pool).await;

    tracing::info!("Gateway stopped");
    served
}

/// Run until the server exits or a shutdown signal has drained it
async fn serve(listener: TcpListener, app: Router, grace: Duration) -> Result<(), anyhow::Error> {
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            joined??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    tracing::info!(grace_secs = grace.as_secs(), "Shutdown requested, draining connections");
    let _ = stop_tx.send(true);

    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined??,
        Err(_) => tracing::warn!("Grace period elapsed, closing remaining connections"),
    }
    Ok(())
}

/// Pool handle closed once the server has stopped
#[cfg(feature = "postgres")]
type Pool = Option<matching_engine::PgStore>;

#[cfg(not(feature = "postgres"))]
struct Pool;

#[cfg(feature = "postgres")]
async fn build_state(config: GatewayConfig) -> Result<(AppState, Pool), anyhow::Error> {
    use matching_engine::PgStore;

    if let Some(url) = config.database_url.as_deref() {
        let store = PgStore::connect(url, config.db_max_connections, config.db_connect_timeout).await?;
        store.migrate().await?;
        tracing::info!("Using PostgreSQL order store");
        let state = AppState::new(Arc::new(store.clone()), config);
        return Ok((state, Some(store)));
    }

    tracing::info!("Using in-memory order store");
    Ok((AppState::new(Arc::new(MemoryStore::new()), config), None))
}

#[cfg(feature = "postgres")]
async fn close_pool(pool: Pool) {
    if let Some(store) = pool {
        store.close().await;
        tracing::info!("Database pool closed");
    }
}

#[cfg(not(feature = "postgres"))]
async fn build_state(config: GatewayConfig) -> Result<(AppState, Pool), anyhow::Error> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but the postgres feature is not compiled in");
    }

    tracing::info!("Using in-memory order store");
    Ok((AppState::new(Arc::new(MemoryStore::new()), config), Pool))
}

#[cfg(not(feature = "postgres"))]
async fn close_pool(_pool: Pool) {}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
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
}
