//! binforge-lib: reproducible binutils build orchestration.
//!
//! The pipeline is a strictly forward sequence of stages:
//! - `workspace`: validate and create the directory layout
//! - `fetch`: download source and toolchain archives into persistent caches
//! - `unpack`: extract archives by compression suffix
//! - `env`: build the sanitized environment handed to every child process
//! - `build`: configure and compile with the pinned toolchain
//! - `package`: install, name, and archive the result
//! - `lifecycle`: signal handling and the final exit report

pub mod build;
pub mod cancel;
pub mod cmd;
pub mod config;
pub mod consts;
pub mod env;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod package;
pub mod pipeline;
pub mod platform;
pub mod unpack;
pub mod workspace;

#[cfg(test)]
pub mod testutil;
