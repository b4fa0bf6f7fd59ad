use lps_common::Amount;
use serde::Deserialize;

use crate::db_types::{Order, OrderStatusType};

pub type JobId = u64;

/// One order handed to a pool worker for scoring.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub order: Order,
}

/// What the scorer said about an order.
///
/// `accrual` is absent while the scorer is still working and for invalid orders.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderScore {
    pub order: String,
    pub status: OrderStatusType,
    #[serde(default)]
    pub accrual: Option<Amount>,
}

/// The result a worker emits for a job.
///
/// `code` is the HTTP status the scorer answered with (0 when the request never completed), and
/// `retry_after_secs` only carries a value for 429 responses. A transport or decode failure sets `error`;
/// such outcomes are ignored by the fan-in and the order is naturally retried next cycle.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub id: JobId,
    pub order: Order,
    pub code: u16,
    pub retry_after_secs: u64,
    pub error: Option<String>,
}

impl JobOutcome {
    /// A 200 response: the order adopts the scorer's status and accrual.
    pub(crate) fn scored(job: Job, score: OrderScore) -> Self {
        let mut order = job.order;
        order.status = score.status;
        order.accrual = score.accrual.unwrap_or(Amount::ZERO);
        Self { id: job.id, order, code: super::HTTP_SUCCESS, retry_after_secs: 0, error: None }
    }

    /// A 429 response carrying the parsed `Retry-After` value (0 when missing or garbled).
    pub(crate) fn throttled(job: Job, retry_after_secs: u64) -> Self {
        Self { id: job.id, order: job.order, code: super::HTTP_RETRY, retry_after_secs, error: None }
    }

    /// Any other HTTP status: no update for this order this cycle.
    pub(crate) fn unscored(job: Job, code: u16) -> Self {
        Self { id: job.id, order: job.order, code, retry_after_secs: 0, error: None }
    }

    pub(crate) fn transport_error(job: Job, error: String) -> Self {
        Self { id: job.id, order: job.order, code: 0, retry_after_secs: 0, error: Some(error) }
    }
}
