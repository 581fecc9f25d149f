//! Test: which triggers start a run

use crate::helpers::*;
use contribs_pipeline::persistence::{InMemoryPersistence, PersistenceBackend};
use contribs_pipeline::trigger::TriggerEvent;
use contribs_pipeline::{run_pipeline, ExecutionEngine, ExecutionStatus, RunOptions, RunOutcome};
use std::sync::Arc;

fn options(lock_dir: &std::path::Path) -> RunOptions {
    RunOptions {
        lock_dir: Some(lock_dir.to_path_buf()),
        secrets: Some(secrets()),
        ..Default::default()
    }
}

fn push(branch: &str, message: &str) -> TriggerEvent {
    TriggerEvent::Push {
        branch: branch.to_string(),
        message: Some(message.to_string()),
    }
}

#[tokio::test]
async fn test_push_to_other_branch_is_ignored() {
    let dir = workspace();
    let lock_dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(MockRunner::with_python());
    let engine = ExecutionEngine::new(runner.clone());
    let history = InMemoryPersistence::new();

    let outcome = run_pipeline(
        &config_for(dir.path()),
        push("refs/heads/feature/sound", "Add Sound library"),
        options(lock_dir.path()),
        &engine,
        &history,
    )
    .await
    .unwrap();

    assert!(matches!(outcome, RunOutcome::Ignored { .. }));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_own_commit_does_not_retrigger() {
    let dir = workspace();
    let lock_dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(MockRunner::with_python());
    let engine = ExecutionEngine::new(runner.clone());
    let history = InMemoryPersistence::new();

    let outcome = run_pipeline(
        &config_for(dir.path()),
        push("main", "chore(ci): update contributions [skip ci]"),
        options(lock_dir.path()),
        &engine,
        &history,
    )
    .await
    .unwrap();

    match outcome {
        RunOutcome::Ignored { reason } => assert!(reason.contains("[skip ci]")),
        other => panic!("expected the push to be ignored, got {:?}", other),
    }
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_push_to_main_runs_and_is_recorded() {
    let dir = workspace();
    write_file(dir.path(), "pde/contribs.txt", "library\n");
    let lock_dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(MockRunner::with_python().with_changes(" M pde/contribs.txt\n"));
    let engine = ExecutionEngine::new(runner.clone());
    let history = InMemoryPersistence::new();
    let config = config_for(dir.path());

    let outcome = run_pipeline(
        &config,
        push("refs/heads/main", "Add Video library"),
        options(lock_dir.path()),
        &engine,
        &history,
    )
    .await
    .unwrap();

    assert!(!outcome.is_failure());
    assert!(runner.called("sftp", &[]));

    let saved = history.list_executions(&config.name, 10).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].status, ExecutionStatus::Completed);
    assert_eq!(saved[0].trigger, "push");
    assert_eq!(saved[0].changed, Some(true));
}

#[tokio::test]
async fn test_scheduled_dry_run_touches_nothing_remote() {
    let dir = workspace();
    write_file(dir.path(), "pde/contribs.txt", "library\n");
    let lock_dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(MockRunner::with_python().with_changes(" M pde/contribs.txt\n"));
    let engine = ExecutionEngine::new(runner.clone());
    let history = InMemoryPersistence::new();

    let outcome = run_pipeline(
        &config_for(dir.path()),
        TriggerEvent::Schedule,
        RunOptions {
            dry_run: true,
            ..options(lock_dir.path())
        },
        &engine,
        &history,
    )
    .await
    .unwrap();

    let RunOutcome::Finished { pipeline, summary, .. } = outcome else {
        panic!("scheduled run should not be ignored");
    };
    assert_eq!(summary.trigger, "schedule");
    assert_eq!(pipeline.state.status, ExecutionStatus::Completed);
    assert!(runner.called("python3", &["build_contribs.py"]));
    assert!(!runner.called("git", &["commit"]));
    assert!(!runner.called("git", &["push"]));
    assert!(!runner.called("sftp", &[]));
}
