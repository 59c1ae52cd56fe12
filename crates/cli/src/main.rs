// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj`: a thin in-process admin client over `oj-engine`'s `Simulation`
//! facade — exactly the calls a real HTTP layer would make from its
//! request handlers (`create`, `join`, `action`, `stop`, `delete`, `list`,
//! `status`), without this crate inventing a wire protocol. Each
//! invocation rehydrates persisted instances from `oj-storage`, performs
//! one operation, and persists back before exiting.

mod commands;

use clap::{Parser, Subcommand};
use oj_core::{EntityId, InstanceId};
use oj_daemon::{Daemon, DaemonConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oj", about = "Admin client for the Odd Jobs simulation engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new scenario instance and wait for generation to finish.
    Create {
        scenario_id: String,
    },
    /// Join an active instance as a player.
    Join {
        instance_id: String,
        player_id: String,
    },
    /// Submit a player action. Params are `key=value` pairs, parsed as JSON
    /// when possible and falling back to a plain string.
    Action {
        instance_id: String,
        player_id: String,
        verb: String,
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, serde_json::Value)>,
    },
    /// Stop an instance (rejects future joins/actions).
    Stop {
        instance_id: String,
    },
    /// Delete an instance and its persisted record.
    Delete {
        instance_id: String,
    },
    /// List every persisted instance and its status.
    List,
    /// Print an instance's current world snapshot.
    Status {
        instance_id: String,
    },
}

fn parse_param(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let daemon = Daemon::new(DaemonConfig::load());

    match cli.command {
        Command::Create { scenario_id } => commands::create(&daemon, &scenario_id).await?,
        Command::Join { instance_id, player_id } => {
            commands::join(&daemon, &InstanceId::new(instance_id), EntityId::new(player_id))?
        }
        Command::Action { instance_id, player_id, verb, params } => commands::action(
            &daemon,
            &InstanceId::new(instance_id),
            &EntityId::new(player_id),
            &verb,
            params.into_iter().collect(),
        )?,
        Command::Stop { instance_id } => commands::stop(&daemon, &InstanceId::new(instance_id))?,
        Command::Delete { instance_id } => commands::delete(&daemon, &InstanceId::new(instance_id))?,
        Command::List => commands::list(&daemon),
        Command::Status { instance_id } => commands::status(&daemon, &InstanceId::new(instance_id))?,
    }

    Ok(())
}
