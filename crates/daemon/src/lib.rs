// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! oj-daemon: process wiring for the `ojd` binary. Builds one
//! `InstanceRegistry`, one `AgentPool`, one `Scheduler`, and the
//! `Simulation` facade over them, then runs the tick loop alongside a
//! periodic persistence pass against `oj-storage`.

pub mod config;
pub mod env;
pub mod persistence;
pub mod runtime;

pub use config::DaemonConfig;
pub use persistence::persist_all as persist_simulation;
pub use runtime::{Daemon, DaemonError, DaemonSimulation};
