//! Archive extraction.
//!
//! The decompressor is chosen from the filename suffix alone; the archive
//! contents are never sniffed.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

use tar::{Archive, EntryType};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cancel::Cancellable;
use crate::error::{PipelineError, Result};
use crate::workspace::WorkspaceLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
  Xz,
  Bzip2,
  Gzip,
}

impl Compression {
  /// Pick the decompressor for an archive from its last suffix.
  pub fn from_path(path: &Path) -> Result<Self> {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some("xz") => Ok(Self::Xz),
      Some("bz2") => Ok(Self::Bzip2),
      Some("gz") => Ok(Self::Gzip),
      _ => Err(PipelineError::UnsupportedArchiveFormat(path.to_path_buf())),
    }
  }

  fn decoder<'a>(&self, reader: impl Read + 'a) -> Box<dyn Read + 'a> {
    match self {
      Self::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
      Self::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
      Self::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
    }
  }
}

/// Extract `archive` into the existing directory `target`.
pub fn unpack(archive: &Path, target: &Path) -> Result<()> {
  extract(archive, target, 0, &CancellationToken::new())
}

/// Extract `archive` into `target`, dropping the first `strip` path
/// components of every entry (like `tar --strip-components`).
///
/// Extraction fails at its next read once `cancel` fires.
pub fn extract(archive: &Path, target: &Path, strip: usize, cancel: &CancellationToken) -> Result<()> {
  let compression = Compression::from_path(archive)?;
  if !target.is_dir() {
    return Err(PipelineError::ExtractionTargetMissing(target.to_path_buf()));
  }

  info!(archive = ?archive, target = ?target, ?compression, "extracting");

  let file = File::open(archive)?;
  let mut tar = Archive::new(Cancellable::new(compression.decoder(BufReader::new(file)), cancel));

  if strip == 0 {
    tar.unpack(target)?;
    return Ok(());
  }

  for entry in tar.entries()? {
    let mut entry = entry?;
    let path = entry.path()?.into_owned();
    let Some(relative) = strip_components(&path, strip) else {
      debug!(path = ?path, "skipping entry above strip depth");
      continue;
    };
    let dest = target.join(&relative);

    if let Some(parent) = dest.parent() {
      fs::create_dir_all(parent)?;
    }

    // Hard link targets name archive paths, which need the same stripping.
    if entry.header().entry_type() == EntryType::Link {
      let link = entry.link_name()?.map(|l| l.into_owned());
      if let Some(source) = link.as_deref().and_then(|l| strip_components(l, strip)) {
        fs::hard_link(target.join(source), &dest)?;
        continue;
      }
    }

    entry.unpack(&dest)?;
  }

  Ok(())
}

/// Extract the toolchain archive unless its sentinel executable already exists.
///
/// The archive's top-level directory is stripped so that `bin/` lands
/// directly in the toolchain directory. Extraction happens in a hidden
/// staging directory that replaces the toolchain directory only once
/// complete, so an interrupted run never leaves a sentinel behind.
/// Returns whether extraction ran.
pub fn unpack_toolchain(archive: &Path, layout: &WorkspaceLayout, cancel: &CancellationToken) -> Result<bool> {
  let sentinel = layout.toolchain_sentinel();
  if sentinel.exists() {
    info!(path = ?sentinel, "toolchain already extracted");
    return Ok(false);
  }

  let staging = tempfile::Builder::new().prefix(".gcc-").tempdir_in(&layout.root)?;
  extract(archive, staging.path(), 1, cancel)?;

  // No sentinel, so whatever is here is incomplete.
  if layout.toolchain_dir.exists() {
    fs::remove_dir_all(&layout.toolchain_dir)?;
  }
  fs::rename(staging.path(), &layout.toolchain_dir)?;
  debug!(path = ?layout.toolchain_dir, "toolchain moved into place");
  Ok(true)
}

/// Drop the first `count` normal components. Paths that would escape the
/// target, or that have nothing left after stripping, yield `None`.
fn strip_components(path: &Path, count: usize) -> Option<PathBuf> {
  let mut normal = Vec::new();
  for component in path.components() {
    match component {
      Component::Normal(part) => normal.push(part),
      Component::CurDir => {}
      _ => return None,
    }
  }
  if normal.len() <= count {
    return None;
  }
  Some(normal[count..].iter().collect())
}
