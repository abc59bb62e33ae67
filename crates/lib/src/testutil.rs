//! Test utilities for binforge-lib.
//!
//! Helpers for building configurations and small archives on the fly, so
//! tests never need the network or real release tarballs.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::config::{BuildConfiguration, Settings};
use crate::platform::Platform;
use crate::platform::arch::Arch;
use crate::platform::os::Os;

/// A fixed x86_64 Linux configuration for `version`.
pub fn test_config(version: &str) -> BuildConfiguration {
  BuildConfiguration::new(
    version,
    Platform::new(Arch::X86_64, Os::Linux),
    Settings::default(),
    2,
    "binforge test".to_string(),
  )
  .unwrap()
}

/// One regular file inside a test archive.
pub struct ArchiveEntry {
  pub path: String,
  pub content: Vec<u8>,
  pub mode: u32,
}

impl ArchiveEntry {
  pub fn file(path: &str, content: &str, mode: u32) -> Self {
    Self {
      path: path.to_string(),
      content: content.as_bytes().to_vec(),
      mode,
    }
  }
}

/// Write a tarball at `path`, compressed according to its suffix.
pub fn write_archive(path: &Path, entries: &[ArchiveEntry]) {
  let file = File::create(path).unwrap();
  let name = path.to_string_lossy();
  if name.ends_with(".xz") {
    let encoder = xz2::write::XzEncoder::new(file, 6);
    append_entries(encoder, entries).finish().unwrap();
  } else if name.ends_with(".bz2") {
    let encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::default());
    append_entries(encoder, entries).finish().unwrap();
  } else if name.ends_with(".gz") {
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    append_entries(encoder, entries).finish().unwrap();
  } else {
    append_entries(file, entries);
  }
}

fn append_entries<W: Write>(writer: W, entries: &[ArchiveEntry]) -> W {
  let mut builder = tar::Builder::new(writer);
  for entry in entries {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(entry.content.len() as u64);
    header.set_mode(entry.mode);
    header.set_cksum();
    builder
      .append_data(&mut header, &entry.path, entry.content.as_slice())
      .unwrap();
  }
  builder.into_inner().unwrap()
}

/// Write an executable shell script.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
  use std::os::unix::fs::PermissionsExt;

  std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}
