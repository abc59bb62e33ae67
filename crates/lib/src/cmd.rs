//! External command execution.
//!
//! Every child runs with a cleared environment plus exactly the variables in
//! the supplied [`BuildEnv`], so nothing from the invoking shell leaks into
//! the build. Program lookup uses the PATH from that environment.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::info;

use crate::env::BuildEnv;
use crate::error::{PipelineError, Result};

/// Run a command to completion with its output going to our stdout/stderr.
///
/// A non-zero exit is returned as [`PipelineError::ToolFailed`] carrying the
/// tool's own exit status.
pub async fn run<S: AsRef<OsStr>>(program: &str, args: &[S], cwd: &Path, env: &BuildEnv) -> Result<()> {
  info!(program = %program, cwd = ?cwd, "running");

  let status = command(program, args, cwd, env)
    .stdin(Stdio::null())
    .stdout(Stdio::inherit())
    .stderr(Stdio::inherit())
    .status()
    .await?;

  check_status(program, status)
}

fn command<S: AsRef<OsStr>>(program: &str, args: &[S], cwd: &Path, env: &BuildEnv) -> Command {
  let mut command = Command::new(program);
  command
    .args(args)
    .current_dir(cwd)
    .env_clear()
    .envs(env.iter())
    // Interrupting the pipeline drops the future; take the child down with it.
    .kill_on_drop(true);
  command
}

fn check_status(program: &str, status: ExitStatus) -> Result<()> {
  if status.success() {
    return Ok(());
  }
  Err(PipelineError::ToolFailed {
    tool: tool_name(program),
    code: status.code(),
    signal: signal_of(&status),
  })
}

/// Short tool name for messages ("configure" rather than its full path).
fn tool_name(program: &str) -> String {
  Path::new(program)
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| program.to_string())
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> Option<i32> {
  use std::os::unix::process::ExitStatusExt;
  status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> Option<i32> {
  None
}
