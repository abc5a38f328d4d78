//! Simulated hardware module entry point.

use clap::Parser;
use helix::config::ConfigLoader;
use helix_hal::{HalConfig, HalModule, ModuleConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "helix_hal", about = "Helix simulated hardware module")]
struct Args {
    /// Path to the module TOML configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Module name override (used when no config file is given).
    #[arg(long, default_value = "arm")]
    name: String,

    /// Joint count override (used when no config file is given).
    #[arg(long, default_value_t = 6)]
    dof: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let module_config = match &args.config {
        Some(path) => {
            let config = HalConfig::load(path)?;
            config.shared.validate()?;
            config.module.validate()?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                        tracing_subscriber::EnvFilter::new(config.shared.log_level.as_filter_str())
                    }),
                )
                .with_target(false)
                .init();
            info!(service = %config.shared.service_name, "loaded configuration");
            config.module
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_target(false)
                .init();
            let config = ModuleConfig {
                name: args.name.clone(),
                dof: args.dof,
                ..ModuleConfig::default()
            };
            config.validate()?;
            config
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        })?;
    }

    let mut module = HalModule::publish(module_config)?;
    module.run(&shutdown);

    info!("shutdown requested, removing published segments");
    Ok(())
}
