//! Cooperative cancellation for blocking work.
//!
//! Dropping the future returned by [`run_blocking`] cannot stop the thread it
//! spawned. The work is instead handed a [`CancellationToken`] that is
//! cancelled on drop; readers and writers wrapped in [`Cancellable`] fail their
//! next call once that happens, which unwinds the work through its normal
//! error path.

use std::io::{self, Read, Write};

use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Reader or writer that stops at the first I/O call after cancellation.
pub struct Cancellable<T> {
  inner: T,
  token: CancellationToken,
}

impl<T> Cancellable<T> {
  pub fn new(inner: T, token: &CancellationToken) -> Self {
    Self {
      inner,
      token: token.clone(),
    }
  }

  pub fn into_inner(self) -> T {
    self.inner
  }

  // Not ErrorKind::Interrupted: write_all and read_to_end retry on that.
  fn check(&self) -> io::Result<()> {
    if self.token.is_cancelled() {
      return Err(io::Error::other("cancelled"));
    }
    Ok(())
  }
}

impl<R: Read> Read for Cancellable<R> {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    self.check()?;
    self.inner.read(buf)
  }
}

impl<W: Write> Write for Cancellable<W> {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.check()?;
    self.inner.write(buf)
  }

  fn flush(&mut self) -> io::Result<()> {
    self.check()?;
    self.inner.flush()
  }
}

/// Run `work` on the blocking pool, cancelling its token if this future is
/// dropped before the work completes.
pub async fn run_blocking<F, T>(work: F) -> Result<T>
where
  F: FnOnce(CancellationToken) -> Result<T> + Send + 'static,
  T: Send + 'static,
{
  let token = CancellationToken::new();
  let _guard = token.clone().drop_guard();
  tokio::task::spawn_blocking(move || work(token))
    .await
    .map_err(io::Error::other)?
}
