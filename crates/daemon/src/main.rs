//! qnd daemon - Main Entry Point
//!
//! Serves the data plane and management surfaces over one SQLite store.

mod telemetry;

use anyhow::Result;
use qnd_api_rpc::{RpcServer, Surface};
use qnd_daemon::config::LogFormat;
use qnd_daemon::{build_handler, open_store, shutdown_channel, supervise, DaemonConfig};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env()?;

    // 2. Initialize logging
    let (writer, _log_guard) = tracing_appender::non_blocking(std::io::stdout());
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("qnd=info"))?;
    let (otel_layer, otel_status) = telemetry::layer();

    let registry = tracing_subscriber::registry().with(otel_layer).with(env_filter);
    match config.log_format {
        // Production: JSON structured logging
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(writer)).init(),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => registry.with(fmt::layer().pretty().with_writer(writer)).init(),
    }

    info!("qnd daemon v{} starting...", VERSION);
    if let Some(status) = otel_status {
        info!("{}", status);
    }
    if config.generated_secret {
        warn!("QND_SECRET_KEY not set; using a random key, issued tokens will not survive a restart");
    }

    // 3. Initialize database
    let pool = open_store(&config.db_path).await?;

    // 4. Setup dependencies (DI wiring)
    let handler = build_handler(pool.clone(), &config.service);
    let server = RpcServer::new(config.rpc.clone(), handler);
    info!(
        delete_policy = ?config.service.delete_policy,
        token_ttl_secs = config.service.token_ttl_secs,
        "Services ready"
    );

    // 5. Start both surfaces, each under its own supervisor
    let (shutdown_tx, shutdown) = shutdown_channel();
    let mut listeners = JoinSet::new();

    for surface in [Surface::Data, Surface::Management] {
        let server = server.clone();
        listeners.spawn(supervise(
            surface,
            move || {
                let server = server.clone();
                async move { server.start(surface).await.map(|(_, handle)| handle) }
            },
            config.restart_delay,
            shutdown.clone(),
        ));
    }

    info!("Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 7. Graceful shutdown
    shutdown_tx.shutdown();
    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while let Some(result) = listeners.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Listener supervisor failed");
            }
        }
    })
    .await;
    if drained.is_err() {
        warn!("Listeners did not stop within {:?}", SHUTDOWN_GRACE);
    }

    pool.close().await;
    info!("Shutdown complete.");

    Ok(())
}
