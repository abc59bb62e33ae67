//! The build pipeline.
//!
//! Stages run strictly in order and any failure ends the run. The only state
//! carried between runs is the filesystem: archive caches, the extracted
//! toolchain, and the install prefix.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::build;
use crate::cancel;
use crate::config::BuildConfiguration;
use crate::env;
use crate::error::Result;
use crate::fetch::{ArchiveAsset, Fetcher};
use crate::package;
use crate::unpack;
use crate::workspace::WorkspaceLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Workspace,
  Fetch,
  Unpack,
  Sanitize,
  Configure,
  Build,
  Install,
  Package,
  Cleanup,
}

impl Stage {
  pub const ALL: [Stage; 9] = [
    Stage::Workspace,
    Stage::Fetch,
    Stage::Unpack,
    Stage::Sanitize,
    Stage::Configure,
    Stage::Build,
    Stage::Install,
    Stage::Package,
    Stage::Cleanup,
  ];

  pub fn description(&self) -> &'static str {
    match self {
      Stage::Workspace => "Preparing workspace",
      Stage::Fetch => "Fetching archives",
      Stage::Unpack => "Unpacking archives",
      Stage::Sanitize => "Sanitizing environment",
      Stage::Configure => "Configuring",
      Stage::Build => "Building",
      Stage::Install => "Installing",
      Stage::Package => "Packaging",
      Stage::Cleanup => "Cleaning up",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.description())
  }
}

/// What a successful run leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
  pub install_dir: PathBuf,
  pub tarball: PathBuf,
}

pub struct Pipeline {
  config: BuildConfiguration,
  layout: WorkspaceLayout,
  fetcher: Fetcher,
  inherited_env: Vec<(OsString, OsString)>,
  glibc_version: Option<String>,
}

impl Pipeline {
  /// A pipeline anchored at `root`, inheriting the current process environment.
  pub fn new(config: BuildConfiguration, root: &Path) -> Self {
    let layout = WorkspaceLayout::new(&config, root);
    Self {
      config,
      layout,
      fetcher: Fetcher::with_defaults(),
      inherited_env: std::env::vars_os().collect(),
      glibc_version: None,
    }
  }

  pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
    self.fetcher = fetcher;
    self
  }

  /// Replace the environment the sanitizer starts from.
  pub fn with_inherited_env<I, K, V>(mut self, vars: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
  {
    self.inherited_env = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
    self
  }

  pub fn with_glibc_version(mut self, version: Option<String>) -> Self {
    self.glibc_version = version;
    self
  }

  pub fn config(&self) -> &BuildConfiguration {
    &self.config
  }

  pub fn layout(&self) -> &WorkspaceLayout {
    &self.layout
  }

  pub fn source_asset(&self) -> ArchiveAsset {
    ArchiveAsset::new(
      &self.config.source_url,
      self.config.source_archive(),
      &self.layout.tarball_cache_dir,
    )
  }

  pub fn toolchain_asset(&self) -> ArchiveAsset {
    ArchiveAsset::new(
      &self.config.toolchain_url,
      &self.config.toolchain_archive,
      &self.layout.toolchain_tarball_cache_dir,
    )
  }

  /// Run every stage, calling `on_stage` as each one begins.
  pub async fn run(&self, mut on_stage: impl FnMut(Stage)) -> Result<BuildResult> {
    let config = &self.config;
    let layout = &self.layout;

    on_stage(Stage::Workspace);
    layout.validate()?;
    layout.prepare()?;

    on_stage(Stage::Fetch);
    let source = self.source_asset();
    let toolchain = self.toolchain_asset();
    self.fetcher.fetch_all(&[source.clone(), toolchain.clone()]).await?;

    on_stage(Stage::Unpack);
    let unpack_layout = layout.clone();
    cancel::run_blocking(move |token| {
      unpack::extract(&source.path(), &unpack_layout.source_dir, 0, &token)?;
      unpack::unpack_toolchain(&toolchain.path(), &unpack_layout, &token)?;
      Ok(())
    })
    .await?;

    on_stage(Stage::Sanitize);
    let sanitized = env::sanitize(self.inherited_env.iter().cloned());
    sanitized.audit();

    on_stage(Stage::Configure);
    let build_env = build::compiler_env(&sanitized, config, layout);
    build::configure(config, layout, &build_env).await?;

    on_stage(Stage::Build);
    build::compile(config, layout, &build_env).await?;

    on_stage(Stage::Install);
    package::install(layout, &build_env).await?;

    on_stage(Stage::Package);
    let tarball = package::package(config, layout, self.glibc_version.as_deref()).await?;

    on_stage(Stage::Cleanup);
    package::cleanup(layout)?;

    info!(tarball = ?tarball, "build complete");
    Ok(BuildResult {
      install_dir: layout.install_dir.clone(),
      tarball,
    })
  }
}
