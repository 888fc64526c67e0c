//! Runtime helpers shared by the services.
//!
//! Repository calls are plain futures: dropping the caller's future cancels the storage call.
//! [`Deadline`] adds an optional upper bound on top of that.

use std::future::Future;
use std::time::Duration;

use configs::MemberConfig;

use crate::errors::RepositoryError;

/// Optional per-call time limit for repository calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Deadline(Option<Duration>);

impl Deadline {
    pub const fn none() -> Self { Self(None) }

    pub const fn after(limit: Duration) -> Self { Self(Some(limit)) }

    pub fn limit(&self) -> Option<Duration> { self.0 }

    /// Drive `fut` to completion, abandoning it with [`RepositoryError::Timeout`] once the
    /// limit elapses.
    pub async fn run<F, T>(self, fut: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        match self.0 {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| RepositoryError::Timeout(limit))?,
            None => fut.await,
        }
    }
}

impl From<&MemberConfig> for Deadline {
    fn from(cfg: &MemberConfig) -> Self { Self(cfg.query_timeout()) }
}
