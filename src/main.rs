use anyhow::{Context, Result};
use hearth_mirror::config::{validate_config, ConfigLoader, DEFAULT_CONFIG_FILE};
use hearth_mirror::{Mirror, MirrorError};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    let config = ConfigLoader::new(&path)
        .load_or_default()
        .with_context(|| format!("failed to load config from {}", path))?;
    validate_config(&config).context("invalid configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting hearth-mirror v{} for {}",
        env!("CARGO_PKG_VERSION"),
        config.target.process_name
    );

    let mut ticker = tokio::time::interval(config.poll.interval());
    let mirror = Arc::new(Mirror::new(config));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mirror = Arc::clone(&mirror);
                let snapshot = tokio::task::spawn_blocking(move || mirror.snapshot())
                    .await
                    .context("snapshot task panicked")?;
                match snapshot {
                    Ok(snapshot) => println!("{}", serde_json::to_string(&snapshot)?),
                    Err(MirrorError::AttachFailed(reason)) => {
                        info!(%reason, "Target not attached, retrying next tick");
                    }
                    Err(e) if e.is_retryable() => {
                        info!(error = %e, "Runtime not ready, retrying next tick");
                    }
                    Err(e) => warn!(error = %e, "Snapshot failed"),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!(error = %e, "Failed to listen for ctrl-c");
                }
                break;
            }
        }
    }

    info!("Shutting down hearth-mirror");
    Ok(())
}
