//! CLI output formatting utilities.
//!
//! Stage banners, colored status lines, and the exit report.

use std::time::{Duration, SystemTime};

use owo_colors::{OwoColorize, Stream};

use binforge_lib::lifecycle::{Outcome, Report, Termination};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
}

const BANNER_WIDTH: usize = 60;

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  if secs >= 60 {
    format!("{}s ({}m {}s)", secs, secs / 60, secs % 60)
  } else {
    format!("{}s", secs)
  }
}

/// Banner printed before each pipeline stage.
pub fn print_banner(title: &str) {
  let rule = "=".repeat(BANNER_WIDTH);
  println!();
  println!("{}", rule.if_supports_color(Stream::Stdout, |s| s.cyan()));
  println!("  {}", title.if_supports_color(Stream::Stdout, |s| s.bold()));
  println!("{}", rule.if_supports_color(Stream::Stdout, |s| s.cyan()));
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// Print the exit report for a finished run.
///
/// Interrupted runs get a single message; every other run reports the time,
/// elapsed seconds, and exit code.
pub fn print_report(outcome: &Outcome) {
  if let Termination::Failed(err) = &outcome.termination {
    print_error(&err.to_string());
  }

  match outcome.report() {
    Report::Interrupted { code } => {
      print_warning(&format!("Interrupted, exiting with code {}", code));
    }
    Report::Finished { code, elapsed } => {
      println!();
      print_stat(
        "Finished at",
        &humantime::format_rfc3339_seconds(SystemTime::now()).to_string(),
      );
      print_stat("Elapsed", &format_duration(elapsed));
      print_stat("Exit code", &code.to_string());
    }
  }
}
