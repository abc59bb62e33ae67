//! Install, name, archive, and clean up.

use std::fs;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::info;
use xz2::write::XzEncoder;

use crate::cancel::{self, Cancellable};
use crate::cmd;
use crate::config::BuildConfiguration;
use crate::env::BuildEnv;
use crate::error::{PipelineError, Result};
use crate::platform::probe::is_dotted_version;
use crate::workspace::WorkspaceLayout;

const XZ_LEVEL: u32 = 6;
#[cfg(unix)]
const ARTIFACT_MODE: u32 = 0o644;

/// Discard any previous install so the package holds exactly this build.
pub fn reset_install_dir(layout: &WorkspaceLayout) -> Result<()> {
  let dir = &layout.install_dir;
  if dir.exists() {
    info!(path = ?dir, "removing previous install");
    fs::remove_dir_all(dir)?;
  }
  fs::create_dir_all(dir).map_err(|source| PipelineError::DirectoryCreation {
    path: dir.clone(),
    source,
  })
}

/// Install stripped binaries into a fresh prefix.
pub async fn install(layout: &WorkspaceLayout, env: &BuildEnv) -> Result<()> {
  reset_install_dir(layout)?;
  cmd::run("make", &["install-strip"], &layout.build_dir, env).await
}

/// `<component>-<version>-<os>-<arch>[-glibc-<ver>+].tar.xz`
///
/// The glibc suffix is only added for a dotted-numeric version; anything else
/// is dropped rather than treated as an error.
pub fn artifact_name(config: &BuildConfiguration, glibc_version: Option<&str>) -> String {
  let mut name = format!("{}-{}-{}", config.package_name(), config.platform.os, config.platform.arch);
  if let Some(version) = glibc_version.filter(|v| is_dotted_version(v)) {
    name.push_str(&format!("-glibc-{}+", version));
  }
  name.push_str(".tar.xz");
  name
}

/// Write the contents of `source_dir` to an xz-compressed tarball at `dest`.
///
/// The tarball is assembled under a hidden temporary name next to `dest` and
/// renamed only once complete. A failure or cancellation removes it, so
/// `dest` either holds a whole archive or does not exist.
pub fn archive_dir(source_dir: &Path, dest: &Path, cancel: &CancellationToken) -> Result<()> {
  let dir = dest
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or_else(|| Path::new("."));
  let staged = tempfile::Builder::new()
    .prefix(".binforge-")
    .suffix(".partial")
    .tempfile_in(dir)?;

  let mut builder = tar::Builder::new(Cancellable::new(XzEncoder::new(staged.as_file(), XZ_LEVEL), cancel));
  builder.follow_symlinks(false);
  builder.append_dir_all(".", source_dir)?;
  builder.into_inner()?.into_inner().finish()?;

  // Temp files are created owner-only; the artifact is meant to be shared.
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    staged.as_file().set_permissions(fs::Permissions::from_mode(ARTIFACT_MODE))?;
  }

  staged.persist(dest).map_err(|e| e.error)?;
  Ok(())
}

/// Archive the install prefix next to it and return the tarball path.
pub async fn package(
  config: &BuildConfiguration,
  layout: &WorkspaceLayout,
  glibc_version: Option<&str>,
) -> Result<PathBuf> {
  let dest = layout.stage_dir().join(artifact_name(config, glibc_version));
  let source = layout.install_dir.clone();

  info!(source = ?source, dest = ?dest, "packaging");
  let task_dest = dest.clone();
  cancel::run_blocking(move |token| archive_dir(&source, &task_dest, &token)).await?;

  Ok(dest)
}

/// Remove the per-run scratch directories. The install prefix, caches, and
/// toolchain are left in place.
pub fn cleanup(layout: &WorkspaceLayout) -> Result<()> {
  for dir in [&layout.build_dir, &layout.source_dir] {
    if dir.exists() {
      info!(path = ?dir, "removing");
      fs::remove_dir_all(dir)?;
    }
  }
  Ok(())
}
