//! Test: regenerated files are committed, pushed and uploaded

use crate::helpers::*;
use contribs_pipeline::core::config::SKIP_CI_MARKER;
use contribs_pipeline::process::CommandOutput;
use std::sync::Arc;

#[tokio::test]
async fn test_push_with_changes_runs_every_step() {
    let dir = workspace();
    write_file(dir.path(), "pde/contribs.txt", "library\nname=Sound\n");
    write_file(dir.path(), "pde/libraries.json", "[]");
    let runner = Arc::new(
        MockRunner::with_python()
            .with_changes(" M pde/contribs.txt\n?? pde/libraries.json\n"),
    );

    let result = run_pipeline_with_runner(&config_for(dir.path()), runner.clone()).await;

    assert_pipeline_completed(&result);
    assert_eq!(result.pipeline.state.completed_steps, 9);
    assert_step_executed(&result, "detect_changes", "changed=1");
    assert_step_executed(&result, "commit_and_push", "3f2a9c1");
    assert_step_executed(&result, "deploy", "uploaded 2 file(s) to /var/www/download/contribs");

    let calls = runner.calls();
    let push = calls.iter().position(|c| c.args_start_with(&["push"])).unwrap();
    let sftp = calls.iter().position(|c| c.program == "sftp").unwrap();
    assert!(push < sftp, "upload must happen after the push");
}

#[tokio::test]
async fn test_exactly_one_commit_with_fixed_message() {
    let dir = workspace();
    write_file(dir.path(), "pde/contribs.txt", "library\n");
    let runner = Arc::new(MockRunner::with_python().with_changes("?? pde/contribs.txt\n"));

    run_pipeline_with_runner(&config_for(dir.path()), runner.clone()).await;

    let commits = runner.calls_to("git", &["commit"]);
    assert_eq!(commits.len(), 1);
    assert_eq!(
        commits[0].args,
        vec!["commit", "-m", "chore(ci): update contributions [skip ci]"]
    );
    assert!(commits[0].args[2].contains(SKIP_CI_MARKER));

    let identity: Vec<_> = runner
        .calls_to("git", &["config"])
        .into_iter()
        .map(|c| c.args)
        .collect();
    assert!(identity.contains(&vec![
        "config".to_string(),
        "user.name".to_string(),
        "github-actions[bot]".to_string()
    ]));
}

#[tokio::test]
async fn test_token_never_on_the_command_line() {
    let dir = workspace();
    write_file(dir.path(), "pde/contribs.txt", "library\n");
    let runner = Arc::new(MockRunner::with_python().with_changes("?? pde/contribs.txt\n"));

    run_pipeline_with_runner(&config_for(dir.path()), runner.clone()).await;

    for call in runner.calls() {
        assert!(
            !call.args.iter().any(|a| a.contains("ghs_0123456789abcdef")),
            "token leaked into {}",
            call
        );
    }
    let push = &runner.calls_to("git", &["push"])[0];
    assert_eq!(push.args, vec!["push", "origin", "HEAD:refs/heads/main"]);
}

#[tokio::test]
async fn test_every_top_level_output_file_is_uploaded() {
    let dir = workspace();
    write_file(dir.path(), "pde/contribs.txt", "library\n");
    write_file(dir.path(), "pde/Sound.json", "{}");
    write_file(dir.path(), "pde/Video.json", "{}");
    write_file(dir.path(), "pde/nested/ignored.txt", "not uploaded");
    let runner = Arc::new(MockRunner::with_python().with_changes(" M pde/contribs.txt\n"));

    run_pipeline_with_runner(&config_for(dir.path()), runner.clone()).await;

    let batches = runner.batches();
    assert_eq!(batches.len(), 1);
    let puts: Vec<&str> = batches[0].lines().collect();
    assert_eq!(puts.len(), 3);
    for name in ["Sound.json", "Video.json", "contribs.txt"] {
        assert!(
            puts.iter()
                .any(|p| p.ends_with(&format!("\"/var/www/download/contribs/{}\"", name))),
            "{} missing from batch:\n{}",
            name,
            batches[0]
        );
    }
    assert!(!batches[0].contains("ignored.txt"));

    let sftp = &runner.calls_to("sftp", &[])[0];
    assert!(sftp.args.contains(&"StrictHostKeyChecking=yes".to_string()));
    assert_eq!(sftp.args.last().unwrap(), "deploy@download.example.org");
}

#[tokio::test]
async fn test_rejected_push_blocks_upload() {
    let dir = workspace();
    write_file(dir.path(), "pde/contribs.txt", "library\n");
    let runner = Arc::new(
        MockRunner::with_python()
            .with_changes(" M pde/contribs.txt\n")
            .on(
                "git",
                &["push"],
                CommandOutput::failure(1, "! [rejected] HEAD -> main (fetch first)"),
            ),
    );

    let result = run_pipeline_with_runner(&config_for(dir.path()), runner.clone()).await;

    assert_pipeline_failed(&result);
    assert_step_failed(&result, "commit_and_push", "rejected");
    assert_step_skipped(&result, "deploy", "previous step failed");
    assert!(!runner.called("sftp", &[]));
}

#[tokio::test]
async fn test_upload_failure_fails_the_run() {
    let dir = workspace();
    write_file(dir.path(), "pde/contribs.txt", "library\n");
    let runner = Arc::new(
        MockRunner::with_python()
            .with_changes(" M pde/contribs.txt\n")
            .on("sftp", &[], CommandOutput::failure(1, "Permission denied (publickey)")),
    );

    let result = run_pipeline_with_runner(&config_for(dir.path()), runner.clone()).await;

    assert_pipeline_failed(&result);
    assert_step_executed(&result, "commit_and_push", "3f2a9c1");
    assert_step_failed(&result, "deploy", "Permission denied");
}

#[tokio::test]
async fn test_deploy_errors_keep_host_readable() {
    let dir = workspace();
    write_file(dir.path(), "pde/contribs.txt", "library\n");
    let runner = Arc::new(
        MockRunner::with_python()
            .with_changes(" M pde/contribs.txt\n")
            .on(
                "sftp",
                &[],
                CommandOutput::failure(255, "ssh: connect to host download.example.org port 22: Connection refused"),
            ),
    );

    let result = run_pipeline_with_runner(&config_for(dir.path()), runner).await;

    assert_step_failed(&result, "deploy", "connect to host download.example.org port 22");
}
