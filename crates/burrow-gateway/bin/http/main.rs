mod cli;

use crate::cli::{CLI, DEVELOPMENT_TOKEN_SECRET};
use burrow_core::StorageBackend;
use burrow_gateway::{telemetry, App, AppState, DynGenerator};
use burrow_generator::Base62Generator;
use burrow_identity::{IdentityService, TokenService};
use burrow_shortener::{ServiceOptions, ShortenerService};
use burrow_storage::{FileRepository, InMemoryRepository, PostgresRepository};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

const DATABASE_MAX_CONNECTIONS: u32 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    telemetry::init(&config.log_level, config.log_format)?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        "starting burrow"
    );

    let backend = open_backend(&config).await?;
    info!(backend = backend.kind(), "storage backend ready");

    let secret = match config.token_secret.as_deref() {
        Some(secret) if !secret.is_empty() => secret.to_string(),
        _ => {
            warn!("token secret not configured, using the development secret");
            DEVELOPMENT_TOKEN_SECRET.to_string()
        }
    };
    let identity = IdentityService::new(TokenService::new(
        secret.as_bytes(),
        Duration::from_secs(config.token_ttl_secs),
    ));

    let generator: DynGenerator = Box::new(Base62Generator::new());
    let shortener = Arc::new(ShortenerService::new(
        backend,
        generator,
        identity,
        ServiceOptions::builder()
            .base_url(config.base_url.clone())
            .deletion_queue_capacity(config.deletion_queue_capacity)
            .build(),
    ));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, App::router(AppState::new(shortener.clone())))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shortener.shutdown().await;
    info!("shutdown complete");
    Ok(())
}

async fn open_backend(config: &CLI) -> anyhow::Result<StorageBackend> {
    if let Some(dsn) = config.database_dsn.as_deref() {
        let repository = PostgresRepository::connect(dsn, DATABASE_MAX_CONNECTIONS).await?;
        repository.migrate().await?;
        return Ok(StorageBackend::database(repository));
    }

    if let Some(path) = config.file_storage_path.as_ref() {
        let repository = FileRepository::open(path.clone()).await?;
        info!(path = %path.display(), "file storage opened");
        return Ok(StorageBackend::plain(repository));
    }

    Ok(StorageBackend::plain(InMemoryRepository::new()))
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
