//! CLI integration tests.

mod common;

mod build_tests;
mod signal_tests;
