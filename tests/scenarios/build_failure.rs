//! Test: a failing build stops the run before anything is published

use crate::helpers::*;
use contribs_pipeline::process::CommandOutput;
use std::sync::Arc;

#[tokio::test]
async fn test_first_build_failure_skips_everything_after() {
    let dir = workspace();
    let runner = Arc::new(
        MockRunner::with_python()
            .with_changes(" M pde/contribs.txt\n")
            .on(
                "python3",
                &["build_contribs.py"],
                CommandOutput::failure(1, "urllib.error.URLError: <urlopen error timed out>"),
            ),
    );

    let result = run_pipeline_with_runner(&config_for(dir.path()), runner.clone()).await;

    assert_pipeline_failed(&result);
    assert_step_failed(&result, "build_contribs", "URLError");
    for step in ["build_json", "detect_changes", "commit_and_push", "deploy"] {
        assert_step_skipped(&result, step, "previous step failed");
    }

    assert!(!runner.called("python3", &["build_json.py"]));
    assert!(!runner.called("git", &["status"]));
    assert!(!runner.called("git", &["push"]));
    assert!(!runner.called("sftp", &[]));

    let err = result.result.as_ref().unwrap_err();
    assert!(err.to_string().contains("build_contribs"));
}

#[tokio::test]
async fn test_second_build_failure_still_publishes_nothing() {
    let dir = workspace();
    let runner = Arc::new(
        MockRunner::with_python()
            .with_changes(" M pde/contribs.txt\n")
            .on("python3", &["build_json.py"], CommandOutput::failure(2, "KeyError: 'categories'")),
    );

    let result = run_pipeline_with_runner(&config_for(dir.path()), runner.clone()).await;

    assert_pipeline_failed(&result);
    assert_step_executed(&result, "build_contribs", "");
    assert_step_failed(&result, "build_json", "exited with code 2");
    assert!(!runner.called("git", &["commit"]));
}

#[tokio::test]
async fn test_missing_interpreter_is_fatal() {
    let dir = workspace();
    let runner = Arc::new(
        MockRunner::new()
            .on("python3", &["--version"], CommandOutput::success("Python 2.7.18\n"))
            .on("python", &["--version"], CommandOutput::failure(127, "not found")),
    );

    let result = run_pipeline_with_runner(&config_for(dir.path()), runner.clone()).await;

    assert_pipeline_failed(&result);
    assert_step_failed(&result, "setup_python", "no Python interpreter matching '3.x'");
    assert_execution_order(&result, &["checkout", "setup_python"]);
}

#[tokio::test]
async fn test_secrets_are_redacted_from_errors() {
    let dir = workspace();
    write_file(dir.path(), "pde/contribs.txt", "library\n");
    let runner = Arc::new(
        MockRunner::with_python()
            .with_changes(" M pde/contribs.txt\n")
            .on(
                "git",
                &["push"],
                CommandOutput::failure(128, "fatal: token ghs_0123456789abcdef is invalid"),
            ),
    );

    let result = run_pipeline_with_runner(&config_for(dir.path()), runner).await;

    assert_step_failed(&result, "commit_and_push", "***");
    let summary = result.summary();
    assert!(!summary.contains("ghs_0123456789abcdef"));
}
