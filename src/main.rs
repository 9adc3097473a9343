//! Notification endpoint binary.
//!
//! Loads configuration, brings the platform certificate set up to date and
//! serves the webhook route until interrupted.

use std::sync::Arc;

use thiserror::Error;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wechatpay_trust::adapters::http::{notification_router, NotificationAppState, NOTIFICATION_PATH};
use wechatpay_trust::adapters::{FileCertificateRepository, ReqwestTransport};
use wechatpay_trust::application::CertificateDownloader;
use wechatpay_trust::config::{AppConfig, ConfigError, ServerConfig};
use wechatpay_trust::domain::notification::{HandlerOutcome, NotificationEvent, NotificationProcessor};
use wechatpay_trust::domain::trust::{CertificateStore, Signer, TrustError, Verifier};
use wechatpay_trust::ports::{PlatformTransport, TransportError};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Trust(#[from] TrustError),

    #[error("HTTP client: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::load().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.server);

    if let Err(e) = run(config).await {
        error!(error = %e, "Server stopped");
        std::process::exit(1);
    }
}

fn init_logging(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if server.is_production() {
        tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    let identity = Arc::new(config.merchant.identity()?);
    let timeout = config.server.request_timeout();

    let transport: Arc<dyn PlatformTransport> = Arc::new(ReqwestTransport::new(
        config.platform.api_base_url.clone(),
        Signer::new(identity.clone()),
        timeout,
    )?);
    let repository = Arc::new(FileCertificateRepository::new(&config.platform.certificate_dir));
    let store = Arc::new(CertificateStore::new());

    let downloader = Arc::new(CertificateDownloader::new(
        identity.clone(),
        store.clone(),
        transport,
        repository,
        config.platform.refresh_policy(),
    ));
    let loaded = downloader.initialize().await?;
    info!(certificates = loaded, "Platform certificates ready");

    let processor = NotificationProcessor::new(identity, Verifier::new(store))?;
    let state = NotificationAppState::new(Arc::new(processor), Arc::new(acknowledge), downloader);

    let app = notification_router()
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, path = NOTIFICATION_PATH, "Listening for platform notifications");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Default handler: record the event and acknowledge it.
fn acknowledge(event: &NotificationEvent) -> HandlerOutcome {
    info!(
        event_id = %event.id,
        event_type = %event.event_type,
        result = ?event.result,
        "Notification accepted"
    );
    HandlerOutcome::success()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
