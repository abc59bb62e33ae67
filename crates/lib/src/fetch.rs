//! Archive fetching.
//!
//! Archives are cached by filename: a file already present in its destination
//! directory is never downloaded again. No checksum is verified, so a corrupt
//! cached file only shows up when it is unpacked.
//!
//! Downloads are written to a hidden `.part` file beside the cache entry and
//! renamed into place on success. The `.part` file is deleted when the attempt
//! fails or its future is dropped, so an unfinished download never looks cached.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};

/// A downloadable archive and where it is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveAsset {
  pub url_root: String,
  pub filename: String,
  pub dest_dir: PathBuf,
}

impl ArchiveAsset {
  pub fn new(url_root: impl Into<String>, filename: impl Into<String>, dest_dir: impl Into<PathBuf>) -> Self {
    Self {
      url_root: url_root.into(),
      filename: filename.into(),
      dest_dir: dest_dir.into(),
    }
  }

  pub fn url(&self) -> String {
    format!("{}/{}", self.url_root.trim_end_matches('/'), self.filename)
  }

  /// Location of the archive in its cache directory.
  pub fn path(&self) -> PathBuf {
    self.dest_dir.join(&self.filename)
  }
}

/// A way of retrieving a URL into a local file.
#[async_trait]
pub trait Downloader: Send + Sync {
  fn name(&self) -> &str;

  /// Whether this downloader can run on the current host.
  fn is_available(&self) -> bool;

  async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// In-process HTTP client.
pub struct HttpDownloader {
  client: reqwest::Client,
}

impl HttpDownloader {
  pub fn new() -> Self {
    Self {
      client: reqwest::Client::new(),
    }
  }
}

impl Default for HttpDownloader {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl Downloader for HttpDownloader {
  fn name(&self) -> &str {
    "http"
  }

  fn is_available(&self) -> bool {
    true
  }

  async fn download(&self, url: &str, dest: &Path) -> Result<()> {
    let failed = |message: String| PipelineError::DownloadFailed {
      url: url.to_string(),
      message,
    };

    let mut response = self.client.get(url).send().await.map_err(|e| failed(e.to_string()))?;

    if !response.status().is_success() {
      return Err(failed(format!("HTTP {}", response.status())));
    }

    let mut file = fs::File::create(dest).await?;
    let mut size = 0usize;
    while let Some(chunk) = response.chunk().await.map_err(|e| failed(e.to_string()))? {
      file.write_all(&chunk).await?;
      size += chunk.len();
    }
    file.flush().await?;

    debug!(path = ?dest, size, "wrote response body");
    Ok(())
  }
}

/// The host's `curl` binary.
pub struct CurlDownloader {
  program: Option<PathBuf>,
}

impl CurlDownloader {
  /// Locate `curl` on the inherited PATH.
  pub fn detect() -> Self {
    Self {
      program: which::which("curl").ok(),
    }
  }
}

#[async_trait]
impl Downloader for CurlDownloader {
  fn name(&self) -> &str {
    "curl"
  }

  fn is_available(&self) -> bool {
    self.program.is_some()
  }

  async fn download(&self, url: &str, dest: &Path) -> Result<()> {
    let Some(program) = &self.program else {
      return Err(PipelineError::DownloadFailed {
        url: url.to_string(),
        message: "curl not found".to_string(),
      });
    };

    let output = Command::new(program)
      .args(["--fail", "--location", "--silent", "--show-error", "--output"])
      .arg(dest)
      .arg(url)
      .kill_on_drop(true)
      .output()
      .await?;

    if !output.status.success() {
      return Err(PipelineError::DownloadFailed {
        url: url.to_string(),
        message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }
    Ok(())
  }
}

/// Whether an asset had to be downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
  Cached,
  Downloaded,
  /// No available downloader produced the file.
  Failed,
}

/// Fetches assets with an ordered list of downloaders.
pub struct Fetcher {
  downloaders: Vec<Box<dyn Downloader>>,
}

impl Fetcher {
  /// Downloaders are tried in the given order.
  pub fn new(downloaders: Vec<Box<dyn Downloader>>) -> Self {
    Self { downloaders }
  }

  /// In-process HTTP first, then `curl`.
  pub fn with_defaults() -> Self {
    Self::new(vec![Box::new(HttpDownloader::new()), Box::new(CurlDownloader::detect())])
  }

  /// Fetch one asset unless it is already cached.
  ///
  /// A failed or interrupted download never leaves a partial file behind, so
  /// the next run sees the archive as missing and retries from scratch.
  pub async fn fetch(&self, asset: &ArchiveAsset) -> Result<FetchOutcome> {
    let dest = asset.path();
    if dest.exists() {
      info!(path = ?dest, "already downloaded");
      return Ok(FetchOutcome::Cached);
    }

    let url = asset.url();
    for downloader in self.downloaders.iter().filter(|d| d.is_available()) {
      info!(url = %url, downloader = downloader.name(), "downloading");
      let partial = tempfile::Builder::new()
        .prefix(&format!(".{}.", asset.filename))
        .suffix(".part")
        .tempfile_in(&asset.dest_dir)?
        .into_temp_path();

      match downloader.download(&url, &partial).await {
        Ok(()) => {
          partial.persist(&dest).map_err(|e| e.error)?;
          info!(path = ?dest, "download complete");
          return Ok(FetchOutcome::Downloaded);
        }
        Err(e) => {
          warn!(url = %url, downloader = downloader.name(), error = %e, "download failed");
          debug!(path = %partial.display(), "discarding partial download");
        }
      }
    }

    Ok(FetchOutcome::Failed)
  }

  /// Fetch every asset, then require each one to be present.
  pub async fn fetch_all(&self, assets: &[ArchiveAsset]) -> Result<()> {
    for asset in assets {
      self.fetch(asset).await?;
    }

    for asset in assets {
      let path = asset.path();
      if !path.is_file() {
        return Err(PipelineError::MissingArchive(path));
      }
    }
    Ok(())
  }
}
