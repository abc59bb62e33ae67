//! Shared test helpers for CLI integration tests.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Toolchain archive name used by every test, so the pinned default is never fetched.
pub const TOOLCHAIN_ARCHIVE: &str = "gcc.tar.gz";

/// A URL nothing listens on; any download attempt fails fast.
pub const DEAD_URL: &str = "http://127.0.0.1:9";

/// configure stand-in: records the prefix and arguments for the fake make.
pub const CONFIGURE: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --prefix=*) echo "${arg#--prefix=}" > config.prefix ;;
  esac
done
echo "$@" > config.args
"#;

/// make stand-in shipped inside the fake toolchain.
pub const MAKE: &str = r#"#!/bin/sh
prefix=$(cat config.prefix)
case "$1" in
  install-strip)
    mkdir -p "$prefix/bin"
    echo built > "$prefix/bin/ld"
    env > "$prefix/build.env"
    ;;
esac
"#;

/// Isolated working directory for one binforge run.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Canonical path of the working directory.
  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap_or_else(|_| self.temp.path().to_path_buf())
  }

  /// Pre-seed the source archive cache for `version`.
  pub fn seed_source(&self, version: &str, configure: &str) {
    let package = format!("binutils-{}", version);
    let cache = self.root().join(format!("{}_taballs", package));
    std::fs::create_dir_all(&cache).unwrap();
    let file = File::create(cache.join(format!("{}.tar.xz", package))).unwrap();
    let configure_path = format!("{}/configure", package);
    let encoder = xz2::write::XzEncoder::new(file, 6);
    write_tar(encoder, &[(configure_path.as_str(), configure)])
      .finish()
      .unwrap();
  }

  /// Pre-seed the toolchain archive cache with a fake gcc/g++/make.
  pub fn seed_toolchain(&self) {
    let cache = self.root().join("gcc_taballs");
    std::fs::create_dir_all(&cache).unwrap();
    let file = File::create(cache.join(TOOLCHAIN_ARCHIVE)).unwrap();
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    write_tar(
      encoder,
      &[
        ("gcc-13/bin/gcc", "#!/bin/sh\n"),
        ("gcc-13/bin/g++", "#!/bin/sh\n"),
        ("gcc-13/bin/make", MAKE),
      ],
    )
    .finish()
    .unwrap();
  }

  /// Packages written to `stage/`.
  pub fn packages(&self) -> Vec<String> {
    let stage = self.root().join("stage");
    let Ok(entries) = std::fs::read_dir(stage) else {
      return Vec::new();
    };
    let mut names: Vec<String> = entries
      .filter_map(|e| e.ok())
      .map(|e| e.file_name().to_string_lossy().into_owned())
      .filter(|name| name.ends_with(".tar.xz"))
      .collect();
    names.sort();
    names
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.root().join(relative)
  }

  /// A binforge process running in the test directory, with no network reachable.
  pub fn binforge_process(&self) -> std::process::Command {
    let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_binforge"));
    cmd.current_dir(self.root());
    cmd.env("BINFORGE_SOURCE_URL", DEAD_URL);
    cmd.env("BINFORGE_TOOLCHAIN_URL", DEAD_URL);
    cmd.env("BINFORGE_TOOLCHAIN_ARCHIVE", TOOLCHAIN_ARCHIVE);
    cmd.env("BINFORGE_JOBS", "2");
    cmd.env("NO_COLOR", "1");
    cmd
  }

  pub fn binforge_cmd(&self) -> Command {
    Command::from_std(self.binforge_process())
  }
}

fn write_tar<W: Write>(writer: W, entries: &[(&str, &str)]) -> W {
  let mut builder = tar::Builder::new(writer);
  for (path, content) in entries {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(content.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder.append_data(&mut header, path, content.as_bytes()).unwrap();
  }
  builder.into_inner().unwrap()
}

/// Whether `path` exists, polling for up to `timeout_ms`.
pub fn wait_for(path: &Path, timeout_ms: u64) -> bool {
  let deadline = std::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);
  while std::time::Instant::now() < deadline {
    if path.exists() {
      return true;
    }
    std::thread::sleep(std::time::Duration::from_millis(50));
  }
  path.exists()
}
