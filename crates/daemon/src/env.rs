// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate. Each
//! public entry point splits into a pure `resolve_*` function (taking the
//! raw value already read) so defaulting/parsing logic is testable without
//! mutating process environment.

use std::path::PathBuf;

pub fn resolve_state_dir(oj_state_dir: Option<String>, xdg_state_home: Option<String>, platform_state_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = oj_state_dir {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = xdg_state_home {
        return PathBuf::from(xdg).join("oj");
    }
    platform_state_dir.unwrap_or_else(std::env::temp_dir).join("oj")
}

/// Resolve the state directory: `OJ_STATE_DIR` > `XDG_STATE_HOME/oj` >
/// the platform state directory's `oj` subdirectory.
pub fn state_dir() -> PathBuf {
    resolve_state_dir(std::env::var("OJ_STATE_DIR").ok(), std::env::var("XDG_STATE_HOME").ok(), dirs::state_dir())
}

pub fn resolve_admin_token(raw: Option<String>) -> String {
    raw.unwrap_or_else(|| "dev-token".to_string())
}

/// Admin bearer token a real HTTP layer would check; this crate only reads
/// and carries it (auth enforcement is out of scope, §1).
pub fn admin_token() -> String {
    resolve_admin_token(std::env::var("ADMIN_TOKEN").ok())
}

pub fn resolve_tick_rate_secs(raw: Option<String>) -> f64 {
    raw.and_then(|s| s.parse::<f64>().ok()).filter(|v| *v > 0.0).unwrap_or(1.0)
}

/// Seconds between ticks. Non-positive or unparseable values fall back to
/// the 1.0s default rather than producing a zero-duration interval.
pub fn tick_rate_secs() -> f64 {
    resolve_tick_rate_secs(std::env::var("TICK_RATE").ok())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
