//! Build configuration.
//!
//! Everything the pipeline needs to know about the build is captured once, up
//! front, into an immutable [`BuildConfiguration`]. Host probes and environment
//! overrides are read here and nowhere else.

use chrono::Local;
use tracing::debug;

use crate::consts::{
  COMPONENT, DEFAULT_SOURCE_URL, DEFAULT_TOOLCHAIN_URL, DEFAULT_VERSION, ENV_JOBS, ENV_SOURCE_URL,
  ENV_TOOLCHAIN_ARCHIVE, ENV_TOOLCHAIN_URL,
};
use crate::error::{PipelineError, Result};
use crate::platform::Platform;
use crate::platform::probe;

/// Overrides taken from the invoking environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  pub source_url: String,
  pub toolchain_url: String,
  pub toolchain_archive: Option<String>,
  pub jobs: Option<usize>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      source_url: DEFAULT_SOURCE_URL.to_string(),
      toolchain_url: DEFAULT_TOOLCHAIN_URL.to_string(),
      toolchain_archive: None,
      jobs: None,
    }
  }
}

impl Settings {
  /// Read overrides from the process environment. Non-UTF-8 variables are skipped.
  pub fn from_env() -> Self {
    Self::from_vars(
      std::env::vars_os().filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?))),
    )
  }

  /// Read overrides from an explicit set of variables.
  ///
  /// Empty values are treated as unset. An unparsable or zero `BINFORGE_JOBS`
  /// is ignored in favor of the detected CPU count.
  pub fn from_vars<I, K, V>(vars: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
  {
    let mut settings = Self::default();
    for (key, value) in vars {
      let value: String = value.into();
      if value.is_empty() {
        continue;
      }
      match key.as_ref() {
        ENV_SOURCE_URL => settings.source_url = value.trim_end_matches('/').to_string(),
        ENV_TOOLCHAIN_URL => settings.toolchain_url = value.trim_end_matches('/').to_string(),
        ENV_TOOLCHAIN_ARCHIVE => settings.toolchain_archive = Some(value),
        ENV_JOBS => match value.parse::<usize>() {
          Ok(jobs) if jobs > 0 => settings.jobs = Some(jobs),
          _ => debug!(value = %value, "ignoring invalid {}", ENV_JOBS),
        },
        _ => {}
      }
    }
    settings
  }
}

/// Immutable description of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
  pub component: String,
  pub version: String,
  pub platform: Platform,
  pub arch_flags: String,
  pub target_triple: String,
  pub jobs: usize,
  /// Embedded into the built tools' `--version` output.
  pub pkgversion: String,
  pub source_url: String,
  pub toolchain_url: String,
  pub toolchain_archive: String,
}

impl BuildConfiguration {
  /// Assemble a configuration from already-known inputs.
  pub fn new(version: &str, platform: Platform, settings: Settings, jobs: usize, pkgversion: String) -> Result<Self> {
    validate_version(version)?;

    let toolchain_archive = settings
      .toolchain_archive
      .unwrap_or_else(|| default_toolchain_archive(&platform));

    Ok(Self {
      component: COMPONENT.to_string(),
      version: version.to_string(),
      arch_flags: platform.arch.cflags().to_string(),
      target_triple: platform.target_triple(),
      platform,
      jobs: settings.jobs.unwrap_or(jobs),
      pkgversion,
      source_url: settings.source_url,
      toolchain_url: settings.toolchain_url,
      toolchain_archive,
    })
  }

  /// Detect the host and build a configuration for `version` (or the default).
  pub async fn detect(version: Option<&str>, settings: Settings) -> Result<Self> {
    let version = version.unwrap_or(DEFAULT_VERSION);
    let platform = Platform::current()?;

    let pkgversion = match probe::git_identity().await {
      Some(identity) => identity,
      None => format!("{} {}", probe::hostname(), Local::now().format("%Y-%m-%d %H:%M:%S")),
    };

    Self::new(version, platform, settings, probe::cpu_count(), pkgversion)
  }

  /// "<component>-<version>", the stem shared by directories and archives.
  pub fn package_name(&self) -> String {
    format!("{}-{}", self.component, self.version)
  }

  pub fn source_archive(&self) -> String {
    format!("{}.tar.xz", self.package_name())
  }
}

fn default_toolchain_archive(platform: &Platform) -> String {
  format!("xpack-gcc-13.2.0-2-{}-{}.tar.gz", platform.os, platform.arch.toolchain_name())
}

fn validate_version(version: &str) -> Result<()> {
  if version.is_empty() || version.contains('/') || version.contains('\\') || version.contains("..") {
    return Err(PipelineError::InvalidVersion(version.to_string()));
  }
  Ok(())
}
