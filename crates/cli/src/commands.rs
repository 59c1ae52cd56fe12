// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One function per subcommand. Each one talks to `daemon.simulation`
//! directly and persists its own side effects through `daemon.store` —
//! there's no running background process to hand off to, so every
//! invocation of the `oj` binary is itself a complete read-modify-persist
//! cycle.

use oj_core::{EntityId, InstanceId};
use oj_daemon::Daemon;
use std::collections::HashMap;
use std::time::Duration;

pub async fn create(daemon: &Daemon, scenario_id: &str) -> anyhow::Result<()> {
    let instance_id = daemon.simulation.create_instance(scenario_id)?;

    loop {
        let status = daemon.simulation.instance_status(&instance_id)?;
        if status != oj_engine::InstanceStatus::Generating {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    daemon.persist_now();
    println!("{instance_id}");
    Ok(())
}

pub fn join(daemon: &Daemon, instance_id: &InstanceId, player_id: EntityId) -> anyhow::Result<()> {
    let game_id = daemon.simulation.join(instance_id, player_id)?;
    daemon.persist_now();
    println!("{game_id}");
    Ok(())
}

pub fn action(
    daemon: &Daemon,
    instance_id: &InstanceId,
    player_id: &EntityId,
    verb: &str,
    params: HashMap<String, serde_json::Value>,
) -> anyhow::Result<()> {
    let outcome = daemon.simulation.submit_action(instance_id, player_id, verb, &params)?;
    daemon.persist_now();
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub fn stop(daemon: &Daemon, instance_id: &InstanceId) -> anyhow::Result<()> {
    daemon.simulation.stop_instance(instance_id)?;
    daemon.persist_now();
    println!("stopped {instance_id}");
    Ok(())
}

pub fn delete(daemon: &Daemon, instance_id: &InstanceId) -> anyhow::Result<()> {
    daemon.simulation.delete_instance(instance_id)?;
    daemon.store.delete(instance_id)?;
    println!("deleted {instance_id}");
    Ok(())
}

pub fn list(daemon: &Daemon) {
    for instance in daemon.simulation.list_instances() {
        println!("{}\t{}\t{:?}", instance.instance_id, instance.scenario_id, instance.status());
    }
}

pub fn status(daemon: &Daemon, instance_id: &InstanceId) -> anyhow::Result<()> {
    let status = daemon.simulation.instance_status(instance_id)?;
    let snapshot = daemon.simulation.snapshot(instance_id)?;
    println!("status: {status:?}");
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
