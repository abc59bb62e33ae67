//! Best-effort queries against the host.
//!
//! Probes run with the inherited environment, before sanitization, and never
//! fail the pipeline: a probe that cannot answer returns `None`.

use std::sync::LazyLock;

use regex::Regex;
use tokio::process::Command;
use tracing::debug;

static DOTTED_VERSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)+$").unwrap());

/// Number of CPUs used for build parallelism.
pub fn cpu_count() -> usize {
  num_cpus::get()
}

pub fn hostname() -> String {
  whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string())
}

/// Version of the host C library, when it reports a dotted-numeric one.
pub async fn glibc_version() -> Option<String> {
  let output = probe("getconf", &["GNU_LIBC_VERSION"]).await?;
  parse_glibc_version(&output)
}

/// Extract the version from `getconf GNU_LIBC_VERSION` style output
/// ("glibc 2.39"). Anything that is not dotted-numeric yields `None`.
pub fn parse_glibc_version(output: &str) -> Option<String> {
  let candidate = output.split_whitespace().last()?;
  is_dotted_version(candidate).then(|| candidate.to_string())
}

/// Whether `version` is dotted-numeric with at least two parts ("2.39").
pub fn is_dotted_version(version: &str) -> bool {
  DOTTED_VERSION.is_match(version)
}

/// Source-control identity as "Name <email>", if both are configured.
pub async fn git_identity() -> Option<String> {
  let name = probe("git", &["config", "--get", "user.name"]).await?;
  let email = probe("git", &["config", "--get", "user.email"]).await?;
  Some(format!("{} <{}>", name, email))
}

/// Run a command and return its trimmed stdout if it succeeded with output.
async fn probe(program: &str, args: &[&str]) -> Option<String> {
  let output = match Command::new(program).args(args).output().await {
    Ok(output) => output,
    Err(e) => {
      debug!(program = %program, error = %e, "probe unavailable");
      return None;
    }
  };

  if !output.status.success() {
    debug!(program = %program, code = ?output.status.code(), "probe failed");
    return None;
  }

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  (!stdout.is_empty()).then_some(stdout)
}
