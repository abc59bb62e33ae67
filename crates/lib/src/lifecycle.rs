//! Process lifecycle: signal handling and the final report.
//!
//! [`Lifecycle::run`] wraps the whole pipeline. Whatever ends it (success,
//! a failed stage, or one of the trapped signals) produces exactly one
//! [`Outcome`], from which the caller prints the report and exits.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::consts::INTERRUPT_EXIT_THRESHOLD;
use crate::error::{PipelineError, Result};

/// Signals that terminate the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
  Hangup,
  Interrupt,
  Quit,
  Terminate,
}

impl Signal {
  pub fn number(&self) -> u8 {
    match self {
      Self::Hangup => 1,
      Self::Interrupt => 2,
      Self::Quit => 3,
      Self::Terminate => 15,
    }
  }

  /// `128 + signal number`.
  pub fn exit_code(&self) -> u8 {
    128 + self.number()
  }

  pub fn name(&self) -> &'static str {
    match self {
      Self::Hangup => "SIGHUP",
      Self::Interrupt => "SIGINT",
      Self::Quit => "SIGQUIT",
      Self::Terminate => "SIGTERM",
    }
  }
}

/// How the pipeline ended.
#[derive(Debug)]
pub enum Termination {
  Success,
  Failed(PipelineError),
  Signaled(Signal),
}

#[derive(Debug)]
pub struct Outcome {
  pub termination: Termination,
  pub elapsed: Duration,
}

/// What to tell the user on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
  /// Timeout or user interruption; no timing report.
  Interrupted { code: u8 },
  Finished { code: u8, elapsed: Duration },
}

impl Outcome {
  pub fn exit_code(&self) -> u8 {
    match &self.termination {
      Termination::Success => 0,
      Termination::Failed(err) => err.exit_code(),
      Termination::Signaled(signal) => signal.exit_code(),
    }
  }

  /// Codes at or above 124 mean the run was interrupted.
  pub fn is_interrupted(&self) -> bool {
    self.exit_code() >= INTERRUPT_EXIT_THRESHOLD
  }

  pub fn report(&self) -> Report {
    let code = self.exit_code();
    if self.is_interrupted() {
      Report::Interrupted { code }
    } else {
      Report::Finished {
        code,
        elapsed: self.elapsed,
      }
    }
  }
}

/// Scope guard for a whole run, started when the process starts.
#[derive(Debug, Clone, Copy)]
pub struct Lifecycle {
  started: Instant,
}

impl Lifecycle {
  pub fn start() -> Self {
    Self {
      started: Instant::now(),
    }
  }

  pub fn elapsed(&self) -> Duration {
    self.started.elapsed()
  }

  /// Run `pipeline` until it finishes or a trapped signal arrives.
  pub async fn run<F>(self, pipeline: F) -> Outcome
  where
    F: Future<Output = Result<()>>,
  {
    self.run_until(pipeline, wait_for_signal()).await
  }

  /// Run `pipeline` until it finishes or `signal` resolves.
  ///
  /// When the signal wins, the pipeline future is dropped, which kills any
  /// child process it is waiting on.
  pub async fn run_until<F, S>(self, pipeline: F, signal: S) -> Outcome
  where
    F: Future<Output = Result<()>>,
    S: Future<Output = Signal>,
  {
    let termination = tokio::select! {
      result = pipeline => match result {
        Ok(()) => Termination::Success,
        Err(err) => Termination::Failed(err),
      },
      signal = signal => {
        info!(signal = signal.name(), "interrupted");
        Termination::Signaled(signal)
      }
    };

    Outcome {
      termination,
      elapsed: self.elapsed(),
    }
  }
}

/// Resolve with the first of SIGHUP, SIGINT, SIGQUIT, SIGTERM.
///
/// If the handlers cannot be installed the future never resolves and the
/// default signal behavior applies.
pub async fn wait_for_signal() -> Signal {
  match listen().await {
    Ok(signal) => signal,
    Err(e) => {
      warn!(error = %e, "failed to install signal handlers");
      std::future::pending().await
    }
  }
}

#[cfg(unix)]
async fn listen() -> std::io::Result<Signal> {
  use tokio::signal::unix::{SignalKind, signal};

  let mut hangup = signal(SignalKind::hangup())?;
  let mut interrupt = signal(SignalKind::interrupt())?;
  let mut quit = signal(SignalKind::quit())?;
  let mut terminate = signal(SignalKind::terminate())?;

  let signal = tokio::select! {
    _ = hangup.recv() => Signal::Hangup,
    _ = interrupt.recv() => Signal::Interrupt,
    _ = quit.recv() => Signal::Quit,
    _ = terminate.recv() => Signal::Terminate,
  };
  Ok(signal)
}

#[cfg(not(unix))]
async fn listen() -> std::io::Result<Signal> {
  tokio::signal::ctrl_c().await?;
  Ok(Signal::Interrupt)
}
