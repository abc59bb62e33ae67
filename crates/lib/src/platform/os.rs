use std::fmt;

/// Operating systems binforge can name an artifact for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  FreeBsd,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    Self::from_name(std::env::consts::OS)
  }

  fn from_name(name: &str) -> Option<Self> {
    match name {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "freebsd" => Some(Self::FreeBsd),
      _ => None,
    }
  }

  /// Lowercased kernel name, as `uname -s` reports it.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::FreeBsd => "freebsd",
    }
  }

  /// Vendor/OS/ABI tail of a GNU target triple.
  pub fn triple_suffix(&self) -> &'static str {
    match self {
      Self::Linux => "linux-gnu",
      Self::MacOs => "apple-darwin",
      Self::FreeBsd => "unknown-freebsd",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
