//! Error taxonomy for the build pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that terminate the pipeline.
///
/// Every variant is fatal; the only local recoveries (downloader fallback and
/// cache/sentinel skips) never surface as errors.
#[derive(Debug, Error)]
pub enum PipelineError {
  /// A build or source directory survived from a previous run.
  #[error("workspace conflict: {0} already exists (remove it to start a fresh build)")]
  WorkspaceConflict(PathBuf),

  #[error("failed to create directory {path}: {source}")]
  DirectoryCreation {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// An archive is still absent from its cache after the fetch stage.
  #[error("missing archive: {0}")]
  MissingArchive(PathBuf),

  #[error("unsupported archive format: {0}")]
  UnsupportedArchiveFormat(PathBuf),

  #[error("extraction target does not exist: {0}")]
  ExtractionTargetMissing(PathBuf),

  /// A download attempt failed. Only logged by the fetcher, which falls back
  /// to the next downloader and reports `MissingArchive` if none succeeds.
  #[error("download failed for {url}: {message}")]
  DownloadFailed { url: String, message: String },

  /// An external tool (configure, make, ...) exited unsuccessfully.
  ///
  /// `code` is the tool's exit status; `signal` is set instead when the tool
  /// was killed by a signal.
  #[error("{tool} failed{}", describe_status(.code, .signal))]
  ToolFailed {
    tool: String,
    code: Option<i32>,
    signal: Option<i32>,
  },

  #[error("unsupported host platform: {os}/{arch}")]
  UnsupportedPlatform { os: String, arch: String },

  #[error("invalid version {0:?}: must be non-empty and must not contain path separators or '..'")]
  InvalidVersion(String),

  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

fn describe_status(code: &Option<i32>, signal: &Option<i32>) -> String {
  match (code, signal) {
    (Some(code), _) => format!(" with exit code {}", code),
    (None, Some(signal)) => format!(" (killed by signal {})", signal),
    (None, None) => String::new(),
  }
}

impl PipelineError {
  /// The process exit code this error terminates with.
  ///
  /// Tool failures propagate the tool's own status unchanged; a tool killed by
  /// a signal maps to `128 + signal`. Everything else exits with 1.
  pub fn exit_code(&self) -> u8 {
    match self {
      PipelineError::ToolFailed { code: Some(code), .. } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
      PipelineError::ToolFailed {
        code: None,
        signal: Some(signal),
        ..
      } => u8::try_from(128 + *signal).unwrap_or(1),
      _ => 1,
    }
  }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
