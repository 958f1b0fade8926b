//! Helpers for bounding futures by time and by cancellation.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use super::CancellationToken;

/// Result of a timed operation.
#[derive(Debug)]
pub enum TimedResult<T, E> {
    /// Operation completed successfully.
    Ok(T),
    /// Operation failed with an error.
    Err(E),
    /// Operation timed out.
    Timeout,
}

impl<T, E> TimedResult<T, E> {
    /// Returns true if the operation succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns true if the operation timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Converts to a standard Result, building the timeout error lazily.
    pub fn into_result_with<F>(self, on_timeout: F) -> Result<T, E>
    where
        F: FnOnce() -> E,
    {
        match self {
            Self::Ok(v) => Ok(v),
            Self::Err(e) => Err(e),
            Self::Timeout => Err(on_timeout()),
        }
    }
}

/// Runs a fallible future with a timeout.
pub async fn run_with_timeout<T, E, F>(duration: Duration, future: F) -> TimedResult<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match timeout(duration, future).await {
        Ok(Ok(value)) => TimedResult::Ok(value),
        Ok(Err(error)) => TimedResult::Err(error),
        Err(_) => TimedResult::Timeout,
    }
}

/// Runs a future until it completes or `token` is cancelled.
///
/// Returns `None` on cancellation; the future is dropped.
pub async fn run_until_cancelled<F>(token: &CancellationToken, future: F) -> Option<F::Output>
where
    F: Future,
{
    if token.is_cancelled() {
        return None;
    }
    tokio::select! {
        biased;
        () = token.cancelled() => None,
        output = future => Some(output),
    }
}
