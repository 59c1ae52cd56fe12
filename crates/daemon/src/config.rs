// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, read once at startup from the environment.

use crate::env;
use std::path::PathBuf;
use std::time::Duration;

/// `ADMIN_TOKEN` (default `dev-token`), `TICK_RATE` (seconds, default
/// `1.0`), and the resolved state directory instance snapshots persist
/// under.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub admin_token: String,
    pub tick_rate: Duration,
    pub state_dir: PathBuf,
}

impl DaemonConfig {
    pub fn load() -> Self {
        Self {
            admin_token: env::admin_token(),
            tick_rate: Duration::from_secs_f64(env::tick_rate_secs()),
            state_dir: env::state_dir(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::load()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
