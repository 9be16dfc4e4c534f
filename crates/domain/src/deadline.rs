//! Caller-supplied deadlines for units of work.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::DomainError;

/// Point in time after which an uncommitted unit of work is abandoned.
///
/// Services run everything up to, but not including, the commit under the
/// deadline. When it fires the in-flight future is dropped, which drops the
/// unit of work and discards its writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// A deadline that never fires.
    pub fn none() -> Self {
        Self(None)
    }

    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    /// Runs `work` to completion or until the deadline, whichever is first.
    pub async fn run<F, T>(self, work: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        match self.0 {
            None => work.await,
            Some(at) => tokio::time::timeout_at(at, work)
                .await
                .map_err(|_| DomainError::DeadlineExceeded)?,
        }
    }
}
