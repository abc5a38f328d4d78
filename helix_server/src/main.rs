//! Helix control server entry point.
//!
//! Builds the service envelope over a simulated control runtime and serves
//! until shutdown. The transport in front of the envelope is deployment
//! specific; this binary keeps the envelope alive, reports operational
//! status periodically and demonstrates fault recovery via clear-faults.

use clap::Parser;
use helix::config::{ConfigLoader, SharedConfig};
use helix_control::ServerConfig;
use helix_server::{Envelope, EnvelopeConfig, SimRuntimeOptions, sim_runtime_factory};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "helix_server", about = "Helix control server")]
struct Args {
    /// Path to the server TOML configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rebuild watchdog deadline in seconds.
    #[arg(long, default_value_t = 30)]
    rebuild_timeout_s: u64,
}

#[derive(Debug, serde::Deserialize)]
struct AppConfig {
    shared: SharedConfig,
    #[serde(default)]
    server: ServerConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let server_config = match &args.config {
        Some(path) => {
            let config = AppConfig::load(path)?;
            config.shared.validate()?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                        tracing_subscriber::EnvFilter::new(config.shared.log_level.as_filter_str())
                    }),
                )
                .with_target(false)
                .init();
            info!(service = %config.shared.service_name, "loaded configuration");
            config.server
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_target(false)
                .init();
            ServerConfig::default()
        }
    };

    info!("starting Helix control server (simulation runtime)");

    let (factory, _handle) = sim_runtime_factory(SimRuntimeOptions {
        config: server_config,
        honor_cancellation: true,
    });
    let envelope = Envelope::new(
        EnvelopeConfig {
            rebuild_timeout: Duration::from_secs(args.rebuild_timeout_s),
        },
        factory,
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        })?;
    }

    while !shutdown.load(Ordering::SeqCst) {
        let status = envelope.get_operational_status();
        match &status.fault_reason {
            Some(reason) => {
                error!(%reason, "control runtime faulted, attempting clear-faults");
                if let Err(e) = envelope.clear_faults() {
                    error!(error = %e, "clear-faults failed, will retry");
                }
            }
            None => {
                info!(state = ?status.state, "control runtime serving");
            }
        }
        std::thread::sleep(Duration::from_secs(5));
    }

    info!("shutdown requested, stopping server");
    Ok(())
}
