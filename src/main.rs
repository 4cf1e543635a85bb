//! Batch fan-out handler.
//!
//! Accepts a JSON array on `POST /`, sends every element to one downstream
//! service concurrently, and answers with the per-item responses in order.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────┐
//!                      │                 SPLIT-FANOUT                  │
//!   POST / [a, b, c]   │  ┌────────┐   ┌───────────┐   ┌────────────┐  │
//!   ───────────────────┼─▶│  http  │──▶│   batch   │──▶│ dispatcher │──┼──▶ POST a ─┐
//!                      │  │ server │   │ validate  │   │ (bounded)  │──┼──▶ POST b ─┤ downstream
//!                      │  └────────┘   └───────────┘   └─────┬──────┘──┼──▶ POST c ─┘
//!                      │       ▲                             │ (i, outcome)
//!   200 {count,        │  ┌────┴─────┐                 ┌─────▼──────┐  │
//!        responses}    │  │ response │◀────────────────│ aggregator │  │
//!   ◀──────────────────┼──│  render  │                 │  (slots)   │  │
//!                      │  └──────────┘                 └────────────┘  │
//!                      │  config · logging · metrics · lifecycle       │
//!                      └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::mpsc;

use split_fanout::config::{loader::load_config, watcher::ConfigWatcher, FanoutConfig};
use split_fanout::lifecycle::{signals, Shutdown};
use split_fanout::net::listener;
use split_fanout::observability::{logging, metrics};
use split_fanout::HttpServer;

#[derive(Parser)]
#[command(name = "split-fanout")]
#[command(about = "Fan a JSON batch out to a downstream service and gather the replies", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults are used without one.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration file when it changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => FanoutConfig::default(),
    };

    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "split-fanout starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        downstream = %config.downstream.url,
        max_in_flight = config.dispatch.max_in_flight,
        call_timeout_ms = config.timeouts.call_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = listener::bind(&config.listener).await?;

    // The watcher must outlive the server; without one the channel just stays idle.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_signal(shutdown));

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
