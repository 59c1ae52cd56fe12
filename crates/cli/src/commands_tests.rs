use super::*;
use oj_daemon::DaemonConfig;
use std::time::Duration;
use tempfile::tempdir;

fn test_daemon(dir: &std::path::Path) -> Daemon {
    Daemon::new(DaemonConfig {
        admin_token: "test-token".to_string(),
        tick_rate: Duration::from_millis(5),
        state_dir: dir.to_path_buf(),
    })
}

#[tokio::test]
async fn create_persists_an_active_instance() {
    let dir = tempdir().unwrap();
    let daemon = test_daemon(dir.path());

    create(&daemon, "market_square").await.unwrap();

    let instance = daemon.simulation.list_instances().into_iter().next().unwrap();
    assert_eq!(instance.status(), oj_engine::InstanceStatus::Active);
    assert!(daemon.store.load(&instance.instance_id).unwrap().is_some());
}

#[tokio::test]
async fn join_then_action_round_trip() {
    let dir = tempdir().unwrap();
    let daemon = test_daemon(dir.path());
    create(&daemon, "market_square").await.unwrap();
    let instance = daemon.simulation.list_instances().into_iter().next().unwrap();
    let player_id = EntityId::new("p1");

    join(&daemon, &instance.instance_id, player_id.clone()).unwrap();
    action(&daemon, &instance.instance_id, &player_id, "look", HashMap::new()).unwrap();

    let record = daemon.store.load(&instance.instance_id).unwrap().unwrap();
    assert!(record.players.contains(&player_id));
}

#[tokio::test]
async fn stop_then_delete_removes_the_persisted_record() {
    let dir = tempdir().unwrap();
    let daemon = test_daemon(dir.path());
    create(&daemon, "market_square").await.unwrap();
    let instance = daemon.simulation.list_instances().into_iter().next().unwrap();

    stop(&daemon, &instance.instance_id).unwrap();
    delete(&daemon, &instance.instance_id).unwrap();

    assert!(daemon.store.load(&instance.instance_id).unwrap().is_none());
    assert!(daemon.simulation.instance_status(&instance.instance_id).is_err());
}

#[tokio::test]
async fn status_reports_active_instance() {
    let dir = tempdir().unwrap();
    let daemon = test_daemon(dir.path());
    create(&daemon, "market_square").await.unwrap();
    let instance = daemon.simulation.list_instances().into_iter().next().unwrap();

    status(&daemon, &instance.instance_id).unwrap();
}
