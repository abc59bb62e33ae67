//! Signal handling tests.

#![cfg(unix)]

use std::process::Stdio;

use super::common::{TestEnv, wait_for};

/// configure stand-in that blocks until killed.
const SLOW_CONFIGURE: &str = "#!/bin/sh\ntouch configure.started\nexec sleep 30\n";

fn interrupt_during_configure(signal: &str, expected_code: i32) {
  let env = TestEnv::new();
  env.seed_source("2.42", SLOW_CONFIGURE);
  env.seed_toolchain();

  let child = env
    .binforge_process()
    .arg("2.42")
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .unwrap();

  assert!(
    wait_for(&env.path("binutils-2.42_build/configure.started"), 20_000),
    "configure never started"
  );

  let status = std::process::Command::new("kill")
    .args(["-s", signal, &child.id().to_string()])
    .status()
    .unwrap();
  assert!(status.success());

  let output = child.wait_with_output().unwrap();
  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(expected_code), "stderr: {}", stderr);
  assert!(stderr.contains("Interrupted"), "stderr: {}", stderr);
  assert!(!stdout.contains("Elapsed"), "stdout: {}", stdout);
  assert!(!stdout.contains("Build complete"));
}

#[test]
fn sigterm_exits_with_143() {
  interrupt_during_configure("TERM", 143);
}

#[test]
fn sigint_exits_with_130() {
  interrupt_during_configure("INT", 130);
}

#[test]
fn sighup_exits_with_129() {
  interrupt_during_configure("HUP", 129);
}

#[test]
fn sigquit_exits_with_131() {
  interrupt_during_configure("QUIT", 131);
}
