// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Odd Jobs Daemon (ojd)
//!
//! Background process that owns the tick loop: drains per-instance events,
//! dispatches bounded `npc_admin` calls, and periodically persists every
//! instance to `oj-storage`. `oj-daemon`'s library crate does the wiring;
//! this binary just reads config, sets up logging, and runs until a
//! shutdown signal arrives.

use oj_daemon::{Daemon, DaemonConfig};
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::{interval, Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DaemonConfig::load();
    info!(state_dir = %config.state_dir.display(), tick_rate = ?config.tick_rate, "starting ojd");

    let daemon = Daemon::new(config);
    daemon.start()?;

    let persist_every = daemon.config.tick_rate.max(Duration::from_secs(1)) * 10;
    let simulation = daemon.simulation.clone();
    let store = daemon.store.clone();
    tokio::spawn(async move {
        let mut ticker = interval(persist_every);
        loop {
            ticker.tick().await;
            oj_daemon::persist_simulation(&simulation, &store);
        }
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }

    info!("shutdown signal received");
    daemon.shutdown().await?;
    Ok(())
}
