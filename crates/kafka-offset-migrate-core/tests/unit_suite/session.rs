//! Interactive session tests.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use kafka_offset_migrate_core::migrate::{MigrationSession, SessionSettings};
use kafka_offset_migrate_core::{Error, ExclusionList, ResetOutcome};

use super::helpers::{FakeCluster, RecordingApplier, ScriptedPrompter};

fn settings(dir: &tempfile::TempDir) -> (SessionSettings, PathBuf) {
    let path = dir.path().join("offsets.csv");
    (
        SessionSettings {
            artifact_path: path.clone(),
            ..Default::default()
        },
        path,
    )
}

#[tokio::test]
async fn full_interactive_run_migrates_pruned_offsets() {
    let dir = tempfile::tempdir().unwrap();
    let (settings, path) = settings(&dir);
    let cluster = FakeCluster::with_offsets(&[("t2", 0, 50), ("t1", 0, 100)]);
    let applier = RecordingApplier::default();
    let mut prompter = ScriptedPrompter::answering(&[
        "kafka1:9092, kafka2:9092",
        "orders-v1",
        "y",
        "t2",
        "y",
        "y",
        "orders-v2",
        "y",
        "y",
    ]);

    let outcome = MigrationSession::new(settings, &cluster, &applier, &mut prompter)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, ResetOutcome::Committed);
    assert_eq!(prompter.remaining(), 0);
    assert!(!path.exists());

    let applied = applier.applications.lock().unwrap()[0].clone();
    assert_eq!(applied.group_id, "orders-v2");
    assert_eq!(applied.bootstrap_servers, vec!["kafka1:9092", "kafka2:9092"]);
    assert_eq!(applied.artifact, "t1,0,100\n");

    assert!(prompter
        .transcript()
        .contains("orders-v1 is currently subscribed to the following topics: t1, t2"));

    // One connection for the topic listing, one for the offsets.
    assert_eq!(cluster.connects.load(Ordering::SeqCst), 2);
    assert_eq!(cluster.closes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_group_proceeds_with_empty_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let (settings, path) = settings(&dir);
    let cluster = FakeCluster::with_offsets(&[]);
    let applier = RecordingApplier::default();
    let mut prompter = ScriptedPrompter::answering(&[
        "kafka1:9092",
        "idle-group",
        "n",
        "y",
        "y",
        "new-group",
        "y",
        "y",
    ]);

    let outcome = MigrationSession::new(settings, &cluster, &applier, &mut prompter)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, ResetOutcome::Committed);
    assert_eq!(applier.validations.lock().unwrap()[0].artifact, "");
    assert_eq!(applier.apply_count(), 1);
    assert!(!path.exists());
}

#[tokio::test]
async fn declining_empty_group_gate_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (settings, path) = settings(&dir);
    let cluster = FakeCluster::with_offsets(&[("t1", 0, 100)]);
    let applier = RecordingApplier::default();
    let mut prompter = ScriptedPrompter::answering(&["kafka1:9092", "orders-v1", "n", "n"]);

    let outcome = MigrationSession::new(settings, &cluster, &applier, &mut prompter)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, ResetOutcome::Aborted);
    assert_eq!(outcome.exit_code(), 1);
    assert!(!path.exists());
    assert_eq!(applier.validate_count(), 0);
    assert_eq!(cluster.connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn declining_proceed_removes_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let (settings, path) = settings(&dir);
    let cluster = FakeCluster::with_offsets(&[("t1", 0, 100)]);
    let applier = RecordingApplier::default();
    let mut prompter =
        ScriptedPrompter::answering(&["kafka1:9092", "orders-v1", "n", "y", "nope"]);

    let outcome = MigrationSession::new(settings, &cluster, &applier, &mut prompter)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, ResetOutcome::Aborted);
    assert!(!path.exists());
    assert_eq!(applier.validate_count(), 0);
    assert!(prompter.transcript().contains("has been generated at"));
}

#[tokio::test]
async fn missing_source_group_continues_with_no_offsets() {
    let dir = tempfile::tempdir().unwrap();
    let (settings, path) = settings(&dir);
    let cluster = FakeCluster::missing_group();
    let applier = RecordingApplier::default();
    let mut prompter = ScriptedPrompter::answering(&[
        "kafka1:9092",
        "ghost",
        "n",
        "y",
        "y",
        "new-group",
        "n",
    ]);

    let outcome = MigrationSession::new(settings, &cluster, &applier, &mut prompter)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, ResetOutcome::Aborted);
    assert!(prompter.transcript().contains("Consumer group ghost was not found"));
    assert_eq!(applier.validations.lock().unwrap()[0].artifact, "");
    assert!(!path.exists());
}

#[tokio::test]
async fn preset_values_are_not_prompted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offsets.csv");
    let settings = SessionSettings {
        bootstrap_servers: Some(vec!["kafka1:9092".to_string()]),
        source_group: Some("orders-v1".to_string()),
        target_group: Some("orders-v2".to_string()),
        exclusions: Some(ExclusionList::parse("audit")),
        artifact_path: path.clone(),
    };
    let cluster = FakeCluster::with_offsets(&[("audit", 0, 5), ("orders", 0, 10)]);
    let applier = RecordingApplier::default();
    let mut prompter = ScriptedPrompter::answering(&["y", "y", "y", "y"]);

    let outcome = MigrationSession::new(settings, &cluster, &applier, &mut prompter)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, ResetOutcome::Committed);
    assert!(prompter.questions.iter().all(|q| q.ends_with("(y/n): ")));
    assert_eq!(prompter.questions.len(), 4);
    assert_eq!(applier.applications.lock().unwrap()[0].artifact, "orders,0,10\n");
    assert!(!path.exists());
}

#[tokio::test]
async fn empty_broker_list_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let (settings, _path) = settings(&dir);
    let cluster = FakeCluster::with_offsets(&[]);
    let applier = RecordingApplier::default();
    let mut prompter = ScriptedPrompter::answering(&[" , "]);

    let err = MigrationSession::new(settings, &cluster, &applier, &mut prompter)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(cluster.connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn same_source_and_target_group_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (settings, path) = settings(&dir);
    let cluster = FakeCluster::with_offsets(&[("t1", 0, 100)]);
    let applier = RecordingApplier::default();
    let mut prompter = ScriptedPrompter::answering(&[
        "kafka1:9092",
        "orders-v1",
        "n",
        "y",
        "y",
        "orders-v1",
    ]);

    let err = MigrationSession::new(settings, &cluster, &applier, &mut prompter)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(applier.validate_count(), 0);
    assert!(!path.exists());
}
