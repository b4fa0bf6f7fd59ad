//! The rate-limited HTTP client pool that asks the external accrual scorer what each order earned.
//!
//! The pool is deliberately dumb: workers pull [`Job`]s off a shared channel, issue one GET per job and
//! push a [`JobOutcome`] onto the result channel. Throttling (HTTP 429 + `Retry-After`), scheduling and
//! committing results are the caller's problem; see [`crate::api::AccrualApi`].

mod job;
mod pool;

#[cfg(test)]
pub(crate) mod test_server;

pub use job::{Job, JobId, JobOutcome, OrderScore};
pub use pool::{ClientPool, PoolConfig, HTTP_RETRY, HTTP_SUCCESS};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccrualError {
    #[error("Could not build the accrual HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
    #[error("The accrual cycle was cancelled")]
    Cancelled,
}
