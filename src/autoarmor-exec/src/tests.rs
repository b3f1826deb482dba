//! Tests for the launch primitive.
//!
//! These run real processes and therefore assume a Unix-ish host with
//! `sh`, `true`, `false`, and `sleep` on the PATH.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::*;

fn runner() -> ProbeRunner {
    ProbeRunner::new(Arc::new(HostLauncher::new()), CancellationToken::new())
}

#[tokio::test]
async fn test_probe_runner_zero_exit() {
    let code = runner()
        .run(CommandRequest::new("true").discard_output(true))
        .await
        .unwrap();
    assert!(code.success());
}

#[tokio::test]
async fn test_probe_runner_nonzero_exit_is_not_an_error() {
    let code = runner()
        .run(CommandRequest::new("false").discard_output(true))
        .await
        .unwrap();
    assert!(!code.success());
}

#[tokio::test]
async fn test_probe_runner_reports_raw_exit_code() {
    let request = CommandRequest::new("sh")
        .args(["-c", "exit 3"])
        .discard_output(true);
    let code = runner().run(request).await.unwrap();
    assert_eq!(code.code(), 3);
}

#[tokio::test]
async fn test_launch_failure_is_distinct_from_nonzero_exit() {
    let request = CommandRequest::new("/nonexistent/autoarmor-test-binary");
    let err = runner().run(request).await.unwrap_err();
    assert!(matches!(err, ExecError::LaunchFailure { .. }));
    assert!(!err.is_interrupted());
}

#[tokio::test]
async fn test_cancellation_surfaces_as_interrupted() {
    let cancel = CancellationToken::new();
    let probe = ProbeRunner::new(Arc::new(HostLauncher::new()), cancel.clone());

    let handle = tokio::spawn(async move {
        probe
            .run(CommandRequest::new("sleep").arg("30").discard_output(true))
            .await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    let err = handle.await.unwrap().unwrap_err();
    assert!(err.is_interrupted());
}

#[tokio::test]
async fn test_launch_runs_in_requested_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let request = CommandRequest::new("sh")
        .args(["-c", "touch marker"])
        .cwd(dir.path())
        .discard_output(true);

    let code = runner().run(request).await.unwrap();
    assert!(code.success());
    assert!(marker.exists());
}

#[tokio::test]
async fn test_empty_command_rejected() {
    let err = runner()
        .run(CommandRequest::from_argv(Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecError::EmptyCommand));
}

#[tokio::test]
async fn test_agent_channel_round_trip() {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    let launcher = HostLauncher::new();
    let mut channel = launcher
        .launch_channel(CommandRequest::new("cat"))
        .await
        .unwrap();

    let mut writer = channel.take_writer().unwrap();
    let reader = channel.take_reader().unwrap();

    writer.write_all(b"ping\n").await.unwrap();
    writer.shutdown().await.unwrap();
    drop(writer);

    let mut line = String::new();
    BufReader::new(reader).read_line(&mut line).await.unwrap();
    assert_eq!(line, "ping\n");

    assert!(channel.join().await.unwrap().success());
}

#[tokio::test]
async fn test_kill_with_empty_markers_is_a_no_op() {
    let launcher = HostLauncher::new();
    launcher.kill(&HashMap::new()).await.unwrap();
}
