//! nsinput-mux daemon entry point.
//!
//! Loads the configuration, builds an in-memory namespace manager with the
//! configured namespaces, registers the configured devices, and runs the
//! switch handler until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()            -- TOML file or defaults
//!  └─ InMemoryNamespaceManager -- namespaces, foreground flag
//!  └─ Multiplexer              -- devices, clients, grabs
//!  └─ spawn_switch_handler()   -- applies ACTIVATE / DEACTIVATE
//!  └─ rotation (optional)      -- cycles the foreground namespace
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nsinput_core::{InputEvent, NamespaceId};
use nsinput_mux::infrastructure::namespace_manager::InMemoryNamespaceManager;
use nsinput_mux::infrastructure::storage::config::{self, AppConfig};
use nsinput_mux::infrastructure::switch_handler::spawn_switch_handler;
use nsinput_mux::{Multiplexer, NamespaceManager};

#[derive(Debug, Parser)]
#[command(name = "nsinput-mux", version, about = "Namespace-aware input multiplexer")]
struct Args {
    /// Path to the TOML config file.
    #[arg(long, env = "NSINPUT_CONFIG")]
    config: Option<PathBuf>,

    /// Switch the foreground namespace every N seconds.
    #[arg(long, env = "NSINPUT_ROTATE_SECS")]
    rotate_secs: Option<u64>,

    /// Overrides the configured log level.  `RUST_LOG` still wins.
    #[arg(long)]
    log_level: Option<String>,

    /// Open one grabbing client per namespace and device, and feed a
    /// synthetic key event on every rotation.
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .context("failed to load configuration")?;

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    let level = args.log_level.clone().unwrap_or_else(|| config.mux.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    info!("nsinput-mux starting");

    let manager = Arc::new(InMemoryNamespaceManager::new());
    for entry in &config.namespaces {
        manager.add_namespace(entry.id, entry.name.clone());
    }

    let (mux, stream) = Multiplexer::new(
        Arc::clone(&manager) as Arc<dyn NamespaceManager>,
        config.mux.queue_capacity,
    );
    let mux = Arc::new(mux);
    let handler = spawn_switch_handler(mux.arbiter(), stream);

    for entry in &config.devices {
        mux.register_device(entry.name.clone());
    }

    if args.demo {
        open_demo_clients(&mux, &config)?;
    }

    if let Some(secs) = args.rotate_secs.filter(|secs| *secs > 0) {
        let order: Vec<NamespaceId> = manager.namespaces().iter().map(|info| info.id).collect();
        let manager = Arc::clone(&manager);
        let mux = Arc::clone(&mux);
        let demo = args.demo;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs));
            ticker.tick().await;
            for next in order.iter().cycle().skip(1) {
                ticker.tick().await;
                match manager.switch_to(*next).await {
                    Ok(reports) => {
                        for report in reports {
                            info!(
                                namespace = %report.namespace,
                                kind = %report.kind,
                                open_clients = mux.clients_of(report.namespace).len(),
                                restored = report.restored,
                                suspended = report.suspended,
                                conflicts = report.conflicts,
                                "switch applied"
                            );
                        }
                    }
                    Err(e) => warn!("switch to {next} failed: {e}"),
                }
                if demo {
                    for device in mux.devices() {
                        let delivered = mux.deliver(&device, InputEvent::key(30, true));
                        info!(device = %device.name(), delivered, "demo event delivered");
                    }
                }
            }
        });
    }

    info!("nsinput-mux ready.  Press Ctrl-C to exit.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutdown signal received");

    handler.abort();
    info!("nsinput-mux stopped");
    Ok(())
}

/// Opens a grabbing client per namespace and device, and logs what each one
/// receives.
fn open_demo_clients(mux: &Arc<Multiplexer>, config: &AppConfig) -> anyhow::Result<()> {
    for device in mux.devices() {
        for entry in &config.namespaces {
            let (client, mut events) = mux
                .client_open(device.id(), entry.id)
                .with_context(|| format!("failed to open demo client in {}", entry.id))?;
            let state = mux.client_request_grab(&client);
            info!(client = %client.id(), namespace = %entry.id, device = %device.name(), ?state, "demo client opened");

            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    info!(client = %client.id(), namespace = %client.namespace(), code = event.code, value = event.value, "demo client received event");
                }
            });
        }
    }
    Ok(())
}
