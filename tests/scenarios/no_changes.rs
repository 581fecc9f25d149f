//! Test: a run that regenerates identical files publishes nothing

use crate::helpers::*;
use std::sync::Arc;

#[tokio::test]
async fn test_clean_tree_skips_push_and_upload() {
    let dir = workspace();
    write_file(dir.path(), "pde/contribs.txt", "library\nname=Sound\n");
    let runner = Arc::new(MockRunner::with_python());

    let result = run_pipeline_with_runner(&config_for(dir.path()), runner.clone()).await;

    assert_pipeline_completed(&result);
    assert_step_executed(&result, "detect_changes", "changed=0");
    assert_step_skipped(&result, "commit_and_push", "no changes");
    assert_step_skipped(&result, "deploy", "no changes");

    assert!(!runner.called("git", &["commit"]));
    assert!(!runner.called("git", &["push"]));
    assert!(!runner.called("ssh-keyscan", &[]));
    assert!(!runner.called("sftp", &[]));
}

#[tokio::test]
async fn test_both_builds_run_from_scripts_dir() {
    let dir = workspace();
    let runner = Arc::new(MockRunner::with_python());

    let result = run_pipeline_with_runner(&config_for(dir.path()), runner.clone()).await;

    assert_execution_order(
        &result,
        &[
            "checkout",
            "setup_python",
            "install_dependencies",
            "python_version",
            "build_contribs",
            "build_json",
            "detect_changes",
        ],
    );

    for script in ["build_contribs.py", "build_json.py"] {
        let calls = runner.calls_to("python3", &[script]);
        assert_eq!(calls.len(), 1, "{} should run exactly once", script);
        assert_eq!(calls[0].args.len(), 1, "{} takes no arguments", script);
        assert_eq!(calls[0].cwd.as_deref(), Some(dir.path().join("scripts").as_path()));
    }
    assert_step_executed(&result, "python_version", "Python 3.11.4");
}

#[tokio::test]
async fn test_working_copy_is_reset_before_building() {
    let dir = workspace();
    let runner = Arc::new(MockRunner::with_python());

    run_pipeline_with_runner(&config_for(dir.path()), runner.clone()).await;

    let calls = runner.calls();
    let position = |program: &str, prefix: &[&str]| {
        calls
            .iter()
            .position(|c| c.program == program && c.args_start_with(prefix))
            .unwrap_or_else(|| panic!("{} {:?} was not run", program, prefix))
    };
    let fetch = position("git", &["fetch", "origin", "main"]);
    let reset = position("git", &["checkout", "--force", "-B", "main", "origin/main"]);
    let clean = position("git", &["clean", "-fd"]);
    let build = position("python3", &["build_contribs.py"]);
    assert!(fetch < reset && reset < clean && clean < build);
}
