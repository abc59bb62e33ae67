mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use binforge_lib::config::{BuildConfiguration, Settings};
use binforge_lib::consts::DEFAULT_VERSION;
use binforge_lib::lifecycle::Lifecycle;
use binforge_lib::pipeline::Pipeline;
use binforge_lib::platform::probe;

use crate::output::{print_banner, print_error, print_info, print_report, print_stat, print_success};

/// How long interrupted blocking work gets to notice cancellation and clean up.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Build and package GNU binutils with a pinned prebuilt GCC
#[derive(Parser)]
#[command(name = "binforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// binutils version to build
  #[arg(id = "binutils_version", value_name = "VERSION", default_value = DEFAULT_VERSION)]
  version: String,
}

fn main() -> ExitCode {
  let lifecycle = Lifecycle::start();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let cli = Cli::parse();

  match run(cli, lifecycle) {
    Ok(code) => ExitCode::from(code),
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli, lifecycle: Lifecycle) -> Result<u8> {
  let root = std::env::current_dir().context("Failed to read current directory")?;
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

  let outcome = rt.block_on(lifecycle.run(build(cli.version, root)));
  // Dropping the runtime would wait for blocking tasks indefinitely.
  rt.shutdown_timeout(SHUTDOWN_GRACE);
  print_report(&outcome);

  Ok(outcome.exit_code())
}

async fn build(version: String, root: PathBuf) -> binforge_lib::error::Result<()> {
  let config = BuildConfiguration::detect(Some(&version), Settings::from_env()).await?;
  let glibc = probe::glibc_version().await;

  print_info(&format!(
    "Building {} for {} ({} jobs)",
    config.package_name(),
    config.target_triple,
    config.jobs
  ));
  info!(pkgversion = %config.pkgversion, glibc = ?glibc, "configuration");

  let pipeline = Pipeline::new(config, &root).with_glibc_version(glibc);
  let result = pipeline.run(|stage| print_banner(stage.description())).await?;

  println!();
  print_success("Build complete!");
  print_stat("Installed", &result.install_dir.display().to_string());
  print_stat("Package", &result.tarball.display().to_string());

  Ok(())
}
