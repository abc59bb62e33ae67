//! Build environment sanitization.
//!
//! The environment handed to configure/make is built from scratch: every
//! inherited variable is dropped, then USER, HOME and a fixed PATH are
//! restored. The process environment itself is never modified; the result is
//! an explicit [`BuildEnv`] that the command runner applies to each child.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::consts::SANITIZED_PATH;

/// Names the sweep is able to unset.
static SAFE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_]*$").unwrap());

/// Variables carried over from the invoking environment.
const PRESERVED: &[&str] = &["USER", "HOME"];

/// An explicit set of environment variables for child processes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnv {
  vars: BTreeMap<String, String>,
}

impl BuildEnv {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.vars.get(key).map(String::as_str)
  }

  pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
    self.vars.insert(key.into(), value.into());
  }

  /// Put `dir` in front of the current PATH.
  pub fn prepend_path(&mut self, dir: &Path) {
    let dir = dir.to_string_lossy();
    let path = match self.get("PATH") {
      Some(existing) if !existing.is_empty() => format!("{}:{}", dir, existing),
      _ => dir.into_owned(),
    };
    self.set("PATH", path);
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.vars.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.vars.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vars.is_empty()
  }

  /// Log every variable, for auditing what a build actually saw.
  pub fn audit(&self) {
    for (key, value) in self.iter() {
      info!(key = %key, value = %value, "build environment");
    }
  }
}

impl fmt::Display for BuildEnv {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (key, value) in self.iter() {
      writeln!(f, "{}={}", key, value)?;
    }
    Ok(())
  }
}

/// Sanitize the current process environment.
pub fn sanitize_process_env() -> BuildEnv {
  sanitize(std::env::vars_os())
}

/// Reduce `inherited` to USER, HOME and the fixed PATH.
///
/// Every name matching `^[0-9A-Za-z_]*$` is unset. A name outside that set
/// cannot be unset and is skipped silently; it is still absent from the
/// result, because child processes only ever see the returned map.
pub fn sanitize<I, K, V>(inherited: I) -> BuildEnv
where
  I: IntoIterator<Item = (K, V)>,
  K: Into<OsString>,
  V: Into<OsString>,
{
  let mut preserved = BTreeMap::new();
  let mut unset = 0usize;

  for (key, value) in inherited {
    let key = key.into().to_string_lossy().into_owned();
    let value = value.into().to_string_lossy().into_owned();

    if PRESERVED.contains(&key.as_str()) {
      preserved.insert(key.clone(), value);
    }

    if SAFE_NAME.is_match(&key) {
      unset += 1;
    } else {
      debug!(key = %key, "cannot unset variable, skipping");
    }
  }

  debug!(unset, "cleared inherited environment");

  let mut env = BuildEnv::new();
  for name in PRESERVED {
    match preserved.remove(*name) {
      Some(value) => env.set(*name, value),
      None => warn!(key = %name, "not set in the invoking environment"),
    }
  }
  env.set("PATH", SANITIZED_PATH);
  env
}
