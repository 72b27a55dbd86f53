// # subcastd - subcast relay daemon
//
// Thin integration layer over subcast-core. The daemon is responsible for:
// 1. Reading the category configuration file
// 2. Initializing logging and the runtime
// 3. Building one CategoryService per valid config section
// 4. Driving the three entry points of every service on a fixed interval
//
// ## Configuration
//
// - `SUBCAST_CONFIG`: path to the TOML config file (default: subcast.toml
//   in the working directory)
// - `SUBCAST_LOG_LEVEL`: trace | debug | info | warn | error (default:
//   info)
//
// One table per category; see subcast-core's config module for the fields.
//
// ## Example
//
// ```bash
// cat > subcast.toml <<'EOF'
// [heartbeat]
// key_regex = "^ping$"
// port = 5015
// subscriber_port = 5016
// EOF
//
// subcastd
// ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use subcast_core::{CategoryService, RelayConfig};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Interval between poll-loop passes
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum RelayExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<RelayExitCode> for ExitCode {
    fn from(code: RelayExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn config_path() -> PathBuf {
    env::var("SUBCAST_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("subcast.toml"))
}

fn log_level() -> Level {
    match env::var("SUBCAST_LOG_LEVEL")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RelayExitCode::ConfigError.into();
    }

    // Load configuration
    let path = config_path();
    let config = match RelayConfig::load(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{} not usable: {}. Quitting.", path.display(), e);
            return RelayExitCode::ConfigError.into();
        }
    };

    if config.is_empty() {
        error!("No valid notification categories were configured. Quitting.");
        return RelayExitCode::ConfigError.into();
    }

    info!("Starting subcastd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RelayExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(code) => code,
            Err(e) => {
                error!("Daemon error: {}", e);
                RelayExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run the poll loop until a shutdown signal arrives
async fn run_daemon(config: RelayConfig) -> Result<RelayExitCode> {
    let mut services = Vec::new();
    for (name, category) in &config.categories {
        match CategoryService::start(name, category).await {
            Ok(service) => {
                info!(
                    category = %name,
                    pattern = service.pattern(),
                    "Category activated"
                );
                services.push(service);
            }
            Err(e) => {
                warn!(category = %name, "Skipping category: {}", e);
            }
        }
    }

    if services.is_empty() {
        error!("No valid notification categories were processed. Quitting.");
        return Ok(RelayExitCode::ConfigError);
    }

    info!("Running with {} active categories", services.len());

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for service in &mut services {
                    service.poll_publish().await;
                    service.poll_subscribe().await;
                    service.sweep_resend().await;
                }
            }
            signal = &mut shutdown => {
                info!("Received {}, shutting down", signal?);
                break;
            }
        }
    }

    Ok(RelayExitCode::CleanShutdown)
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
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
