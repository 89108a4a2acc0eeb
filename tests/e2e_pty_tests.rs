// End-to-End PTY-based TUI Tests
// These tests spawn the actual binary in a PTY and drive it like a user would.
// Nothing listens on the configured server, so sessions end in a transport error.

use rexpect::session::spawn_command;
use std::process::Command;
use std::time::Duration;

fn spawn_app(args: &[&str]) -> Result<rexpect::session::PtySession, rexpect::error::Error> {
    let binary_path = if std::path::Path::new("target/debug/kube-term").exists() {
        "target/debug/kube-term"
    } else {
        "cargo"
    };

    let mut cmd = if binary_path == "cargo" {
        let mut c = Command::new("cargo");
        c.args(["run", "--quiet", "--"]);
        c
    } else {
        Command::new(binary_path)
    };
    cmd.args(["--server", "http://127.0.0.1:9"]);
    cmd.args(args);

    cmd.env("RUST_LOG", "error");
    cmd.env("NO_COLOR", "1");

    spawn_command(cmd, Some(15000))
}

#[test]
#[ignore] // Run with: cargo test --test e2e_pty_tests -- --ignored
fn test_e2e_pod_session_reports_refused_connection() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = spawn_app(&["pod", "-n", "default", "--pod", "web-1:app"])?;

    // Alternate screen buffer
    session.exp_string("\x1b[?1049h")?;
    session.exp_string("Connection error")?;

    // Ctrl+Q quits
    session.send_control('q')?;
    std::thread::sleep(Duration::from_millis(300));

    Ok(())
}

#[test]
#[ignore]
fn test_e2e_help_overlay() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = spawn_app(&["node", "worker-a"])?;

    session.exp_string("\x1b[?1049h")?;
    std::thread::sleep(Duration::from_millis(500));

    // F1
    session.send("\x1bOP")?;
    session.exp_string("Help")?;

    session.send("\x1b")?;
    std::thread::sleep(Duration::from_millis(200));
    session.send_control('q')?;

    Ok(())
}
