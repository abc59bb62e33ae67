//! Host platform detection and probes.

pub mod arch;
pub mod os;
pub mod probe;

use std::fmt;

use arch::Arch;
use os::Os;

use crate::error::{PipelineError, Result};

/// Host platform combining architecture and OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Detect the current platform at runtime.
  pub fn current() -> Result<Self> {
    match (Arch::current(), Os::current()) {
      (Some(arch), Some(os)) => Ok(Self { arch, os }),
      _ => Err(PipelineError::UnsupportedPlatform {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
      }),
    }
  }

  /// GNU target triple for a native build (e.g. "x86_64-pc-linux-gnu").
  pub fn target_triple(&self) -> String {
    format!("{}-{}-{}", self.arch, self.arch.vendor(), self.os.triple_suffix())
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.os, self.arch)
  }
}
