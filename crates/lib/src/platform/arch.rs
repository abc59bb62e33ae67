use std::fmt;

/// CPU architectures binforge has pinned compiler flags for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  X86_64,
  Aarch64,
}

impl Arch {
  /// Detect the current CPU architecture at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::ARCH {
      "x86_64" => Some(Self::X86_64),
      "aarch64" => Some(Self::Aarch64),
      _ => None,
    }
  }

  /// Machine name, as `uname -m` reports it on Linux.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86_64 => "x86_64",
      Self::Aarch64 => "aarch64",
    }
  }

  /// Code generation flags appended to CFLAGS/CXXFLAGS.
  pub fn cflags(&self) -> &'static str {
    match self {
      Self::X86_64 => "-march=x86-64 -mtune=generic",
      Self::Aarch64 => "-march=armv8-a",
    }
  }

  /// Vendor field used in the GNU target triple.
  pub fn vendor(&self) -> &'static str {
    match self {
      Self::X86_64 => "pc",
      Self::Aarch64 => "unknown",
    }
  }

  /// Architecture name used by the prebuilt toolchain release.
  pub fn toolchain_name(&self) -> &'static str {
    match self {
      Self::X86_64 => "x64",
      Self::Aarch64 => "arm64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
