//! Reset orchestrator tests.

use std::path::PathBuf;

use kafka_offset_migrate_core::migrate::{
    IntermediateArtifact, ResetOrchestrator, ResetOutcome, ResetRequest, ResetState,
};
use kafka_offset_migrate_core::Error;

use super::helpers::{snapshot, RecordingApplier, ScriptedPrompter};

fn request() -> ResetRequest {
    ResetRequest {
        bootstrap_servers: vec!["kafka1:9092".to_string(), "kafka2:9092".to_string()],
        group_id: "orders-v2".to_string(),
    }
}

fn artifact(dir: &tempfile::TempDir) -> (IntermediateArtifact, PathBuf) {
    let path = dir.path().join("offsets.csv");
    let artifact =
        IntermediateArtifact::create(&snapshot(&[("orders", 0, 100), ("orders", 1, 80)]), &path)
            .unwrap();
    (artifact, path)
}

#[tokio::test]
async fn decline_first_aborts_without_applying() {
    let dir = tempfile::tempdir().unwrap();
    let (artifact, path) = artifact(&dir);
    let applier = RecordingApplier::default();
    let mut prompter = ScriptedPrompter::answering(&["n"]);

    let outcome = ResetOrchestrator::new(&applier, &mut prompter)
        .run(&request(), artifact)
        .await
        .unwrap();

    assert_eq!(outcome, ResetOutcome::Aborted);
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(applier.validate_count(), 1);
    assert_eq!(applier.apply_count(), 0);
    assert!(!path.exists());
}

#[tokio::test]
async fn decline_second_aborts_without_applying() {
    let dir = tempfile::tempdir().unwrap();
    let (artifact, path) = artifact(&dir);
    let applier = RecordingApplier::default();
    let mut prompter = ScriptedPrompter::answering(&["y", "no"]);

    let outcome = ResetOrchestrator::new(&applier, &mut prompter)
        .run(&request(), artifact)
        .await
        .unwrap();

    assert_eq!(outcome, ResetOutcome::Aborted);
    assert_eq!(applier.apply_count(), 0);
    assert!(!path.exists());
    assert!(prompter.transcript().contains("Proceeding..."));
}

#[tokio::test]
async fn accept_both_applies_once_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let (artifact, path) = artifact(&dir);
    let applier = RecordingApplier::default();
    let mut prompter = ScriptedPrompter::answering(&["Yes", " y "]);

    let outcome = ResetOrchestrator::new(&applier, &mut prompter)
        .run(&request(), artifact)
        .await
        .unwrap();

    assert_eq!(outcome, ResetOutcome::Committed);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(applier.apply_count(), 1);
    assert!(!path.exists());

    let applied = applier.applications.lock().unwrap()[0].clone();
    assert_eq!(applied.group_id, "orders-v2");
    assert_eq!(applied.bootstrap_servers, request().bootstrap_servers);
    assert_eq!(applied.artifact_path, path);
    assert_eq!(applied.artifact, "orders,0,100\norders,1,80\n");

    let transcript = prompter.transcript();
    assert!(transcript.contains("dry run for orders-v2"));
    assert!(transcript.contains("executed for orders-v2"));
    assert!(transcript.ends_with("DONE!"));
}

#[tokio::test]
async fn confirmations_are_asked_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let (artifact, _path) = artifact(&dir);
    let applier = RecordingApplier::default();
    let mut prompter = ScriptedPrompter::answering(&["y", "y"]);

    ResetOrchestrator::new(&applier, &mut prompter)
        .run(&request(), artifact)
        .await
        .unwrap();

    assert_eq!(
        prompter.questions,
        vec![
            "Do the proposed changes look good to you? (y/n): ",
            "Are you sure you want to execute these offset changes? (y/n): ",
        ]
    );
}

#[tokio::test]
async fn applier_failure_aborts_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let (artifact, path) = artifact(&dir);
    let applier = RecordingApplier::failing();
    let mut prompter = ScriptedPrompter::answering(&["y", "y"]);

    let mut orchestrator = ResetOrchestrator::new(&applier, &mut prompter);
    let err = orchestrator.run(&request(), artifact).await.unwrap_err();

    assert!(matches!(err, Error::ExternalTool(_)));
    assert_eq!(
        orchestrator.states(),
        &[
            ResetState::Idle,
            ResetState::DryRunPending,
            ResetState::AwaitingFirstConfirmation,
            ResetState::AwaitingSecondConfirmation,
            ResetState::Executing,
            ResetState::Cleanup,
            ResetState::Aborted,
        ]
    );
    assert!(!path.exists());
}

#[tokio::test]
async fn closed_input_aborts_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let (artifact, path) = artifact(&dir);
    let applier = RecordingApplier::default();
    let mut prompter = ScriptedPrompter::answering(&[]);

    let err = ResetOrchestrator::new(&applier, &mut prompter)
        .run(&request(), artifact)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert_eq!(applier.apply_count(), 0);
    assert!(!path.exists());
}
