//! Sessions against real children on a PTY.

#![cfg(unix)]

use std::time::Duration;

use pty_driver::logging::{LogFormat, init_logging};
use pty_driver::pty_spawn::SpawnConfig;
use pty_driver::{DriverError, ExpectOptions, ReadOptions, Session, SessionConfig};

const NO_ARGS: [&str; 0] = [];

fn quick() -> SessionConfig {
    // PTY_DRIVER_LOG=pty_driver::wire=debug shows the traffic of a failing test.
    init_logging(LogFormat::Text);
    SessionConfig::new()
        .read_timeout(Duration::from_millis(200))
        .expect_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn shell_round_trip_with_prompt() {
    let spawn = SpawnConfig::builder()
        .env("PS1", "$ ")
        .env_remove("ENV")
        .build();
    let (mut session, mut child) = Session::spawn("/bin/sh", ["-i"], &spawn, quick())
        .await
        .expect("spawn /bin/sh");

    session.set_expected_prompt(r"\$ ").unwrap();
    let banner = session.expect(r"\$ ", session.expect_options()).await.unwrap();
    assert!(banner.is_some(), "no initial prompt");

    let reply = session
        .send_and_expect("echo echo-me-reply", session.send_options())
        .await
        .unwrap()
        .expect("prompt after echo");
    assert!(reply.contains("echo-me-reply"), "got {reply:?}");
    assert!(!reply.ends_with("$ "));

    session.write_line("exit").await.unwrap();
    let status = tokio::time::timeout(Duration::from_secs(5), child.wait())
        .await
        .expect("shell did not exit")
        .unwrap();
    assert!(status.success());
}

#[tokio::test]
async fn cat_echoes_typed_characters() {
    let (mut session, mut child) = Session::spawn("cat", NO_ARGS, &SpawnConfig::default(), quick())
        .await
        .unwrap();

    let typed = session
        .type_in("hi", ReadOptions::default().timeout(Duration::from_millis(100)))
        .await
        .unwrap();
    assert_eq!(typed.as_deref(), Some("hi"));

    child.kill().unwrap();
    let _ = child.wait().await;
}

#[tokio::test]
async fn terminal_modes_apply_to_pty() {
    let (mut session, mut child) = Session::spawn("cat", NO_ARGS, &SpawnConfig::default(), quick())
        .await
        .unwrap();
    assert!(session.has_terminal());

    session.set_raw().unwrap();
    session.set_cooked().unwrap();
    assert!(!session.set_echo(false).unwrap());

    // With echo off, only cat's copy comes back.
    session.write_line("once").await.unwrap();
    let seen = session
        .expect("once", ExpectOptions::default().timeout(Duration::from_secs(5)))
        .await
        .unwrap();
    assert_eq!(seen.as_deref(), Some("once"));
    let rest = session.read(session.read_options()).await.unwrap();
    assert!(!rest.contains("once"), "echoed twice: {rest:?}");

    child.kill().unwrap();
    let _ = child.wait().await;
}

#[tokio::test]
async fn exited_child_is_eof() {
    let (mut session, mut child) = Session::spawn("echo", ["done"], &SpawnConfig::default(), quick())
        .await
        .unwrap();

    let err = session
        .expect("never printed", ExpectOptions::default().timeout(Duration::from_secs(5)))
        .await
        .unwrap_err();
    assert!(err.is_eof());
    assert!(err.buffer().unwrap_or_default().contains("done"));

    assert!(child.wait().await.unwrap().success());
}

#[tokio::test]
async fn missing_program_is_spawn_error() {
    let err = Session::spawn(
        "/nonexistent/definitely-not-here",
        NO_ARGS,
        &SpawnConfig::default(),
        quick(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DriverError::Spawn(_)));
}
