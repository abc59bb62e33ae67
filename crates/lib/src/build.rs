//! Configure and compile with the pinned toolchain.

use tracing::info;

use crate::cmd;
use crate::config::BuildConfiguration;
use crate::env::BuildEnv;
use crate::error::Result;
use crate::workspace::WorkspaceLayout;

/// Link the compiler runtime statically so the tools run without the toolchain.
pub const LDFLAGS: &str = "-static-libgcc -static-libstdc++";

/// Sub-tool excluded from the build.
const DISABLED_TOOL: &str = "--disable-gprofng";

pub fn cflags(arch_flags: &str) -> String {
  format!("-O2 -Wall {} {}", arch_flags, LDFLAGS)
}

/// Same as [`cflags`] minus `-Wall`: C++ is compiled less strictly.
pub fn cxxflags(arch_flags: &str) -> String {
  cflags(arch_flags)
    .split_whitespace()
    .filter(|flag| *flag != "-Wall")
    .collect::<Vec<_>>()
    .join(" ")
}

/// Extend a sanitized environment with the toolchain and compiler flags.
pub fn compiler_env(sanitized: &BuildEnv, config: &BuildConfiguration, layout: &WorkspaceLayout) -> BuildEnv {
  let bin = layout.toolchain_bin();
  let mut env = sanitized.clone();
  env.prepend_path(&bin);
  env.set("CC", bin.join("gcc").to_string_lossy());
  env.set("CXX", bin.join("g++").to_string_lossy());
  env.set("CFLAGS", cflags(&config.arch_flags));
  env.set("CXXFLAGS", cxxflags(&config.arch_flags));
  env.set("LDFLAGS", LDFLAGS);
  env
}

/// Arguments for a native (build == host == target) configure run.
pub fn configure_args(config: &BuildConfiguration, layout: &WorkspaceLayout) -> Vec<String> {
  let triple = &config.target_triple;
  vec![
    format!("--prefix={}", layout.install_dir.display()),
    "--disable-nls".to_string(),
    DISABLED_TOOL.to_string(),
    format!("--build={}", triple),
    format!("--host={}", triple),
    format!("--target={}", triple),
    format!("--with-pkgversion={}", config.pkgversion),
  ]
}

/// Run the source tree's configure script from the build directory.
pub async fn configure(config: &BuildConfiguration, layout: &WorkspaceLayout, env: &BuildEnv) -> Result<()> {
  let script = layout.source_tree().join("configure");
  let args = configure_args(config, layout);
  info!(script = ?script, triple = %config.target_triple, "configuring");
  cmd::run(&script.to_string_lossy(), args.as_slice(), &layout.build_dir, env).await
}

/// Compile with one job per CPU.
pub async fn compile(config: &BuildConfiguration, layout: &WorkspaceLayout, env: &BuildEnv) -> Result<()> {
  info!(jobs = config.jobs, "building");
  cmd::run("make", &[format!("-j{}", config.jobs)], &layout.build_dir, env).await
}
