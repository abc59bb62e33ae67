//! Workspace layout and validation.
//!
//! All paths are derived from the package name and the directory binforge was
//! started in. Build and source directories are per-run scratch space; the
//! install prefix, both archive caches, and the toolchain survive across runs.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::BuildConfiguration;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
  /// Directory the layout is anchored in.
  pub root: PathBuf,
  /// `stage/<package>`: install prefix.
  pub install_dir: PathBuf,
  /// `<package>_build`: out-of-tree build directory.
  pub build_dir: PathBuf,
  /// `<package>_source`: extracted source archive.
  pub source_dir: PathBuf,
  /// `<package>_taballs`: source archive cache.
  pub tarball_cache_dir: PathBuf,
  /// `gcc_taballs`: toolchain archive cache, shared across versions.
  pub toolchain_tarball_cache_dir: PathBuf,
  /// `gcc`: extracted toolchain, shared across versions.
  pub toolchain_dir: PathBuf,
  package_name: String,
}

impl WorkspaceLayout {
  pub fn new(config: &BuildConfiguration, root: &Path) -> Self {
    let package = config.package_name();
    Self {
      root: root.to_path_buf(),
      install_dir: root.join("stage").join(&package),
      build_dir: root.join(format!("{}_build", package)),
      source_dir: root.join(format!("{}_source", package)),
      tarball_cache_dir: root.join(format!("{}_taballs", package)),
      toolchain_tarball_cache_dir: root.join("gcc_taballs"),
      toolchain_dir: root.join("gcc"),
      package_name: package,
    }
  }

  /// Top of the extracted source tree, where `configure` lives.
  pub fn source_tree(&self) -> PathBuf {
    self.source_dir.join(&self.package_name)
  }

  /// Parent of the install prefix; the final tarball is written here.
  pub fn stage_dir(&self) -> PathBuf {
    self
      .install_dir
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| self.root.clone())
  }

  pub fn toolchain_bin(&self) -> PathBuf {
    self.toolchain_dir.join("bin")
  }

  /// Presence of this file means the toolchain is already extracted.
  pub fn toolchain_sentinel(&self) -> PathBuf {
    self.toolchain_bin().join("gcc")
  }

  /// Fail if scratch directories from an earlier run are still present.
  pub fn validate(&self) -> Result<()> {
    for dir in [&self.build_dir, &self.source_dir] {
      if dir.exists() {
        return Err(PipelineError::WorkspaceConflict(dir.clone()));
      }
    }
    Ok(())
  }

  /// Create every directory the pipeline writes to.
  pub fn prepare(&self) -> Result<()> {
    for dir in self.directories() {
      if dir.is_dir() {
        debug!(path = ?dir, "directory exists");
        continue;
      }
      fs::create_dir_all(dir).map_err(|source| PipelineError::DirectoryCreation {
        path: dir.to_path_buf(),
        source,
      })?;
      info!(path = ?dir, "created directory");
    }
    Ok(())
  }

  fn directories(&self) -> [&Path; 6] {
    [
      &self.install_dir,
      &self.build_dir,
      &self.source_dir,
      &self.tarball_cache_dir,
      &self.toolchain_tarball_cache_dir,
      &self.toolchain_dir,
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::test_config;
  use tempfile::TempDir;

  #[test]
  fn layout_is_derived_from_version_and_root() {
    let layout = WorkspaceLayout::new(&test_config("2.42"), Path::new("/work"));

    assert_eq!(layout.install_dir, PathBuf::from("/work/stage/binutils-2.42"));
    assert_eq!(layout.build_dir, PathBuf::from("/work/binutils-2.42_build"));
    assert_eq!(layout.source_dir, PathBuf::from("/work/binutils-2.42_source"));
    assert_eq!(layout.tarball_cache_dir, PathBuf::from("/work/binutils-2.42_taballs"));
    assert_eq!(layout.toolchain_tarball_cache_dir, PathBuf::from("/work/gcc_taballs"));
    assert_eq!(layout.toolchain_dir, PathBuf::from("/work/gcc"));
    assert_eq!(layout.source_tree(), PathBuf::from("/work/binutils-2.42_source/binutils-2.42"));
    assert_eq!(layout.stage_dir(), PathBuf::from("/work/stage"));
    assert_eq!(layout.toolchain_sentinel(), PathBuf::from("/work/gcc/bin/gcc"));
  }

  #[test]
  fn layout_is_deterministic() {
    let root = Path::new("/work");
    assert_eq!(
      WorkspaceLayout::new(&test_config("2.42"), root),
      WorkspaceLayout::new(&test_config("2.42"), root)
    );
    assert_ne!(
      WorkspaceLayout::new(&test_config("2.42"), root).build_dir,
      WorkspaceLayout::new(&test_config("2.43"), root).build_dir
    );
  }

  #[test]
  fn validate_rejects_existing_build_dir() {
    let temp = TempDir::new().unwrap();
    let layout = WorkspaceLayout::new(&test_config("2.42"), temp.path());
    fs::create_dir(&layout.build_dir).unwrap();

    let err = layout.validate().unwrap_err();
    assert!(matches!(err, PipelineError::WorkspaceConflict(ref p) if *p == layout.build_dir));
  }

  #[test]
  fn validate_rejects_existing_source_dir() {
    let temp = TempDir::new().unwrap();
    let layout = WorkspaceLayout::new(&test_config("2.42"), temp.path());
    fs::create_dir(&layout.source_dir).unwrap();

    assert!(matches!(layout.validate(), Err(PipelineError::WorkspaceConflict(_))));
  }

  #[test]
  fn prepare_is_idempotent_for_persistent_dirs() {
    let temp = TempDir::new().unwrap();
    let layout = WorkspaceLayout::new(&test_config("2.42"), temp.path());
    fs::create_dir_all(&layout.install_dir).unwrap();
    fs::create_dir_all(&layout.toolchain_dir).unwrap();

    layout.validate().unwrap();
    layout.prepare().unwrap();

    for dir in layout.directories() {
      assert!(dir.is_dir(), "{} should exist", dir.display());
    }
  }

  #[test]
  fn prepare_reports_directory_creation_failure() {
    let temp = TempDir::new().unwrap();
    // A regular file where the stage directory should be.
    fs::write(temp.path().join("stage"), "").unwrap();
    let layout = WorkspaceLayout::new(&test_config("2.42"), temp.path());

    let err = layout.prepare().unwrap_err();
    assert!(matches!(err, PipelineError::DirectoryCreation { .. }));
  }
}
