//! The accrual poller: a single long-lived task that keeps asking the external scorer about every
//! unfinished order and commits whatever moved.
//!
//! The cadence adapts to upstream throttling: when any response in a cycle carried `Retry-After`, the
//! largest value is added to the next sleep. Orders that answered nothing useful stay in a pending status
//! and are naturally picked up again next cycle, so the loop never tracks per-order retry state.

use std::time::Duration;

use log::{debug, info};
use loyalty_engine::{api::changed_orders, AccrualApi, PgLoyaltyDatabase};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct AccrualWorker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl AccrualWorker {
    /// Spawns the poller. There is exactly one in-flight task; [`AccrualWorker::stop`] cancels it and
    /// waits for it to wind down.
    pub fn start(api: AccrualApi<PgLoyaltyDatabase>, poll_interval_secs: u64) -> Self {
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let handle = tokio::spawn(poll_loop(api, poll_interval_secs, loop_cancel));
        Self { cancel, handle }
    }

    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

async fn poll_loop(api: AccrualApi<PgLoyaltyDatabase>, poll_interval_secs: u64, cancel: CancellationToken) {
    info!("🕰️ Accrual poller started");
    let mut extra_wait = 0u64;
    loop {
        let delay = Duration::from_secs(poll_interval_secs + extra_wait);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {},
        }
        extra_wait = 0;

        let orders = match api.orders_for_processing().await {
            Ok(orders) => orders,
            Err(e) => {
                debug!("🕰️ Could not fetch pending orders: {e}");
                continue;
            },
        };
        if orders.is_empty() {
            continue;
        }
        debug!("🕰️ {} orders to chase this cycle", orders.len());

        let (scored, wait) = match api.send_orders_to_accrual(&cancel, orders.clone()).await {
            Ok(result) => result,
            Err(e) => {
                debug!("🕰️ Accrual cycle aborted: {e}");
                continue;
            },
        };
        if wait > 0 {
            info!("🕰️ Scorer asked us to back off; next poll in {} s", poll_interval_secs + wait);
            extra_wait = wait;
        }

        let updated = changed_orders(&orders, &scored);
        if updated.is_empty() {
            continue;
        }
        debug!("🕰️ Committing {} freshly scored orders", updated.len());
        if let Err(e) = api.commit_scores(&updated).await {
            debug!("🕰️ Could not commit scored orders: {e}");
        }
    }
    info!("🕰️ Accrual poller stopped");
}
