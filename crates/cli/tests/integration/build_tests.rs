//! End-to-end build tests against pre-seeded caches.

use predicates::prelude::*;

use super::common::{CONFIGURE, TestEnv};

fn seeded(version: &str) -> TestEnv {
  let env = TestEnv::new();
  env.seed_source(version, CONFIGURE);
  env.seed_toolchain();
  env
}

#[test]
fn build_from_cached_archives() {
  let env = seeded("2.42");

  env
    .binforge_cmd()
    .arg("2.42")
    .assert()
    .success()
    .stdout(predicate::str::contains("Build complete"))
    .stdout(predicate::str::contains("Exit code: 0"))
    .stdout(predicate::str::contains("Configuring"))
    .stderr(predicate::str::contains("already downloaded"));

  let packages = env.packages();
  assert_eq!(packages.len(), 1);
  assert!(packages[0].starts_with("binutils-2.42-"), "{:?}", packages);
  assert!(env.path("stage/binutils-2.42/bin/ld").is_file());
  assert!(!env.path("binutils-2.42_build").exists());
  assert!(!env.path("binutils-2.42_source").exists());
  assert!(env.path("gcc/bin/gcc").is_file());
}

#[test]
fn build_environment_is_sanitized() {
  let env = seeded("2.42");

  env
    .binforge_cmd()
    .arg("2.42")
    .env("LEAKY_SECRET", "hunter2")
    .env("CFLAGS", "-O0 -g")
    .assert()
    .success();

  let build_env = std::fs::read_to_string(env.path("stage/binutils-2.42/build.env")).unwrap();
  assert!(!build_env.contains("LEAKY_SECRET"));
  assert!(!build_env.contains("BINFORGE_"));
  assert!(!build_env.contains("-O0 -g"));
  assert!(build_env.contains("CFLAGS=-O2 -Wall"));
  assert!(build_env.contains("LDFLAGS=-static-libgcc -static-libstdc++"));
}

#[test]
fn rerun_after_success_reuses_caches() {
  let env = seeded("2.42");

  env.binforge_cmd().arg("2.42").assert().success();

  env
    .binforge_cmd()
    .arg("2.42")
    .assert()
    .success()
    .stderr(predicate::str::contains("toolchain already extracted"));

  assert_eq!(env.packages().len(), 1);
}

#[test]
fn versions_produce_distinct_packages() {
  let env = seeded("2.42");
  env.seed_source("2.43", CONFIGURE);

  env.binforge_cmd().arg("2.42").assert().success();
  env.binforge_cmd().arg("2.43").assert().success();

  let packages = env.packages();
  assert_eq!(packages.len(), 2);
  assert!(packages[0].starts_with("binutils-2.42-"));
  assert!(packages[1].starts_with("binutils-2.43-"));
  assert!(env.path("stage/binutils-2.42").is_dir());
  assert!(env.path("stage/binutils-2.43").is_dir());
}

#[test]
fn default_version_is_used_without_argument() {
  let env = seeded("2.43");

  env.binforge_cmd().assert().success();

  let packages = env.packages();
  assert_eq!(packages.len(), 1);
  assert!(packages[0].starts_with("binutils-2.43-"), "{:?}", packages);
}

#[test]
fn missing_archive_fails_without_network() {
  let env = TestEnv::new();

  env
    .binforge_cmd()
    .arg("2.42")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("missing archive"))
    .stdout(predicate::str::contains("Exit code: 1"));
}

#[test]
fn configure_failure_propagates_exit_code() {
  let env = TestEnv::new();
  env.seed_source("2.42", "#!/bin/sh\nexit 7\n");
  env.seed_toolchain();

  env
    .binforge_cmd()
    .arg("2.42")
    .assert()
    .code(7)
    .stderr(predicate::str::contains("configure failed with exit code 7"))
    .stdout(predicate::str::contains("Exit code: 7"));

  // Scratch directories stay behind, so the next run reports a conflict.
  env
    .binforge_cmd()
    .arg("2.42")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("workspace conflict"));
}
