// # failoverd - DNS Failover Daemon
//
// This daemon is a THIN integration layer:
// - DO NOT add decision, DNS or persistence logic here
// - All failover logic lives in failover-core
// - Configuration is via environment variables ONLY
//
// The failoverd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the Cloudflare provider, state file and notifier into the engine
// 4. Serving webhooks, metrics and the operator API until a shutdown signal
//
// ## Configuration
//
// ### Targets
// - `FAILOVER_TARGET1_IP`: Primary target (required)
// - `FAILOVER_TARGET2_IP`: Fallback target (required)
//
// ### DNS Provider
// - `FAILOVER_CLOUDFLARE_API_TOKEN`: API token with Zone:DNS:Edit (required)
// - `FAILOVER_CLOUDFLARE_ZONE_ID`: Zone holding the records (required)
// - `FAILOVER_RECORDS`: Comma-separated allow-list (empty = every A/AAAA record)
// - `FAILOVER_HTTP_TIMEOUT_SECS`: Registrar request timeout (default 15)
// - `FAILOVER_MODE`: `live` or `dry-run` (default live)
//
// ### State
// - `FAILOVER_STATE_PATH`: State file (default ./failover-state.json)
// - `FAILOVER_TTL`: TTL for a fresh state (default 60, minimum 30)
//
// ### Notifications
// - `FAILOVER_TELEGRAM_BOT_TOKEN`, `FAILOVER_TELEGRAM_CHAT_ID`: both or nothing
//
// ### HTTP
// - `FAILOVER_LISTEN`: Listen address (default 0.0.0.0:5000)
// - `FAILOVER_ADMIN_TOKEN`: `X-API-Key` required on /api/* (unset = open)
// - `FAILOVER_DOH_URL`: DoH JSON resolver used by /api/diagnostics
//   (default Cloudflare, `off` disables)
//
// ## Example
//
// ```bash
// export FAILOVER_TARGET1_IP=203.0.113.10
// export FAILOVER_TARGET2_IP=198.51.100.20
// export FAILOVER_CLOUDFLARE_API_TOKEN=your_token
// export FAILOVER_CLOUDFLARE_ZONE_ID=your_zone
// export FAILOVER_RECORDS=example.com,www.example.com
//
// failoverd
// ```

mod api;
mod config;
mod dns_check;

use anyhow::{Context, Result};
use config::Config;
use failover_core::traits::{Notifier, NoopNotifier, SystemClock};
use failover_core::{EngineEvent, FailoverEngine};
use failover_notify_telegram::TelegramNotifier;
use failover_provider_cloudflare::CloudflareProvider;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long in-flight requests may take to drain after a shutdown signal
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum FailoverExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<FailoverExitCode> for ExitCode {
    fn from(code: FailoverExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return FailoverExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return FailoverExitCode::ConfigError.into();
    }

    // validate() already checked the level
    let log_level = config.log_level().unwrap_or(tracing::Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return FailoverExitCode::ConfigError.into();
    }

    info!("Starting failoverd daemon");
    debug!("Configuration: {:?}", config);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return FailoverExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => FailoverExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                FailoverExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let failover = config.to_failover_config()?;

    let provider = CloudflareProvider::from_config(&failover.provider, config.http_timeout()?)
        .with_context(|| format!("Failed to create {} provider", failover.provider.type_name()))?;
    if provider.is_dry_run() {
        warn!("Dry-run mode: registrar writes are logged, not sent");
    }

    let state_store = failover_core::state::from_config(&failover.state_store)
        .await
        .context("Failed to open state store")?;

    let notifier: Arc<dyn Notifier> = match TelegramNotifier::from_config(&failover.notifier)? {
        Some(telegram) => {
            info!("Telegram notifications enabled");
            Arc::new(telegram)
        }
        None => {
            info!("Notifications disabled");
            Arc::new(NoopNotifier)
        }
    };

    let (engine, events) = FailoverEngine::new(
        Arc::new(provider),
        state_store,
        notifier,
        Arc::new(SystemClock),
        &failover,
    )
    .await
    .context("Failed to start failover engine")?;
    let engine = Arc::new(engine);

    // An unreachable registrar must not block startup; the cache fills on
    // the first publish or an explicit refresh.
    match engine.refresh().await {
        Ok(count) => info!("Managing {} DNS record(s)", count),
        Err(e) => warn!("Initial record fetch failed, starting with an empty cache: {}", e),
    }

    tokio::spawn(log_events(events));

    let listen = config.listen_addr()?;
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!("Listening on {}", listener.local_addr()?);

    if config.admin_token.is_none() {
        warn!("FAILOVER_ADMIN_TOKEN is not set; the /api endpoints are unauthenticated");
    }

    let resolver = config
        .doh_url()?
        .map(dns_check::DohResolver::new)
        .transpose()?;

    let app = api::router(api::AppState {
        engine: engine.clone(),
        admin_token: config.admin_token.as_deref().map(Arc::from),
        resolver,
    });

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        signal = wait_for_shutdown() => {
            let signal = signal?;
            info!("Received shutdown signal: {}", signal);
        }
        result = &mut server => {
            // The server only returns on its own when something broke.
            engine.flush().await.context("Failed to save state")?;
            return match result {
                Ok(Ok(())) => Err(anyhow::anyhow!("HTTP server stopped unexpectedly")),
                Ok(Err(e)) => Err(anyhow::anyhow!("HTTP server error: {}", e)),
                Err(e) => Err(anyhow::anyhow!("HTTP server task failed: {}", e)),
            };
        }
    }

    info!("Shutting down daemon");
    let _ = stop_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, &mut server).await {
        Ok(Ok(Ok(()))) => debug!("HTTP server drained"),
        Ok(Ok(Err(e))) => warn!("HTTP server error during shutdown: {}", e),
        Ok(Err(e)) => warn!("HTTP server task failed: {}", e),
        Err(_) => {
            warn!("Requests still in flight after {:?}, abandoning them", DRAIN_TIMEOUT);
            server.abort();
        }
    }

    engine.flush().await.context("Failed to save state")?;
    info!("State saved to {}", engine.state_location());

    Ok(())
}

/// Log engine events as they arrive
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::PersistFailed { error } => {
                warn!("State not persisted: {}", error)
            }
            EngineEvent::RecordUpdateFailed { record_name, error } => {
                debug!("Record {} not updated: {}", record_name, error)
            }
            other => debug!("Engine event: {:?}", other),
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
