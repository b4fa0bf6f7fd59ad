use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::trace;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    accrual::{AccrualError, ClientPool, Job, HTTP_RETRY, HTTP_SUCCESS},
    db_types::Order,
    traits::{OrderManagement, StorageError},
};

/// Drives one accrual cycle: fan the pending orders out over the client pool, collect what came back, and
/// commit the batch. This is the only concurrent machinery in the system; everything else is
/// request-scoped.
pub struct AccrualApi<B> {
    db: B,
    pool: ClientPool,
    next_job_id: Arc<AtomicU64>,
}

impl<B> AccrualApi<B> {
    pub fn new(db: B, pool: ClientPool) -> Self {
        Self { db, pool, next_job_id: Arc::new(AtomicU64::new(0)) }
    }

    /// Sends every order to the scorer through the pool and collects the results.
    ///
    /// Returns the freshly scored orders keyed by order number (at most one entry per input order) together
    /// with the largest `Retry-After` the scorer answered with, which the poller adds to its next sleep.
    /// Orders that answered anything but 200 are simply absent from the map and get retried next cycle.
    pub async fn send_orders_to_accrual(
        &self,
        cancel: &CancellationToken,
        orders: Vec<Order>,
    ) -> Result<(HashMap<i64, Order>, u64), AccrualError> {
        let capacity = self.pool.channel_capacity();
        let (jobs_tx, jobs_rx) = mpsc::channel(capacity);
        let (results_tx, mut results_rx) = mpsc::channel(capacity);

        // The producer tags every order with a fresh job id and closes the job channel when it runs out,
        // which is what eventually winds the pool down.
        let counter = Arc::clone(&self.next_job_id);
        let producer_cancel = cancel.clone();
        let producer = tokio::spawn(async move {
            for order in orders {
                let id = counter.fetch_add(1, Ordering::Relaxed) + 1;
                tokio::select! {
                    biased;
                    _ = producer_cancel.cancelled() => return,
                    sent = jobs_tx.send(Job { id, order }) => {
                        if sent.is_err() {
                            return;
                        }
                    },
                }
            }
        });

        let workers = self.pool.start(cancel.clone(), jobs_rx, results_tx);

        // Fan-in. The result channel closes once every worker has exited.
        let mut scored = HashMap::new();
        let mut max_wait = 0u64;
        let mut cancelled = false;
        while let Some(outcome) = results_rx.recv().await {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if let Some(e) = &outcome.error {
                trace!("🛰️ Job {} failed in transit: {e}", outcome.id);
                continue;
            }
            match outcome.code {
                HTTP_SUCCESS => {
                    scored.insert(outcome.order.order_id, outcome.order);
                },
                HTTP_RETRY => max_wait = max_wait.max(outcome.retry_after_secs),
                _ => {},
            }
        }

        let _ = producer.await;
        for worker in workers {
            let _ = worker.await;
        }
        if cancelled {
            return Err(AccrualError::Cancelled);
        }
        Ok((scored, max_wait))
    }
}

impl<B> AccrualApi<B>
where B: OrderManagement
{
    pub async fn orders_for_processing(&self) -> Result<Vec<Order>, StorageError> {
        self.db.fetch_orders_for_processing().await
    }

    pub async fn commit_scores(&self, orders: &[Order]) -> Result<(), StorageError> {
        self.db.update_orders_and_balances(orders).await
    }
}

/// Picks out the orders whose status actually moved this cycle. Orders absent from the result map are left
/// untouched and picked up again next time around.
pub fn changed_orders(polled: &[Order], scored: &HashMap<i64, Order>) -> Vec<Order> {
    polled
        .iter()
        .filter_map(|order| scored.get(&order.order_id).filter(|fresh| fresh.status != order.status).cloned())
        .collect()
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use lps_common::Amount;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        accrual::{test_server::spawn_stub_scorer, PoolConfig},
        db_types::OrderStatusType,
    };

    fn pending_order(order_id: i64, user_id: i64) -> Order {
        Order {
            order_id,
            user_id,
            status: OrderStatusType::New,
            accrual: Amount::ZERO,
            uploaded_at: Utc::now(),
            changed_at: Utc::now(),
        }
    }

    fn with_status(mut order: Order, status: OrderStatusType) -> Order {
        order.status = status;
        order
    }

    #[tokio::test]
    async fn fan_out_fan_in_collects_scores_and_max_wait() {
        let _ = env_logger::try_init();
        let (addr, server) = spawn_stub_scorer().await;
        let pool = ClientPool::new(PoolConfig::new(2, &addr.to_string())).unwrap();
        let api = AccrualApi::new((), pool);
        let cancel = CancellationToken::new();

        // Two orders score, one is throttled (Retry-After: 7), one errors server-side.
        let orders =
            vec![pending_order(2001, 1), pending_order(1002, 2), pending_order(4003, 1), pending_order(5004, 3)];
        let (scored, wait) = api.send_orders_to_accrual(&cancel, orders).await.unwrap();
        server.abort();

        assert_eq!(wait, 7);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[&2001].status, OrderStatusType::Processed);
        assert_eq!(scored[&2001].accrual, Amount::from(dec!(729.98)));
        assert_eq!(scored[&1002].status, OrderStatusType::Invalid);
    }

    #[tokio::test]
    async fn producers_never_block_when_orders_fit_the_buffers() {
        let (addr, server) = spawn_stub_scorer().await;
        let pool = ClientPool::new(PoolConfig::new(4, &addr.to_string())).unwrap();
        let api = AccrualApi::new((), pool);
        let cancel = CancellationToken::new();

        // 2·N orders, the documented no-blocking bound. Every one gets exactly one entry.
        let orders: Vec<_> = (0..8).map(|i| pending_order(2000 + i, i)).collect();
        let (scored, wait) = api.send_orders_to_accrual(&cancel, orders).await.unwrap();
        server.abort();

        assert_eq!(wait, 0);
        assert_eq!(scored.len(), 8);
    }

    #[tokio::test]
    async fn cancelled_cycle_reports_cancellation() {
        let (addr, server) = spawn_stub_scorer().await;
        let pool = ClientPool::new(PoolConfig::new(2, &addr.to_string())).unwrap();
        let api = AccrualApi::new((), pool);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = api.send_orders_to_accrual(&cancel, vec![pending_order(2001, 1)]).await;
        server.abort();
        // Workers exit silently on cancellation, so either nothing came back (empty map) or the drain
        // noticed the cancel first.
        match err {
            Ok((scored, _)) => assert!(scored.is_empty()),
            Err(AccrualError::Cancelled) => {},
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn changed_orders_keeps_only_status_transitions() {
        let polled = vec![pending_order(1, 1), pending_order(2, 1), pending_order(3, 2)];
        let mut scored = HashMap::new();
        scored.insert(1, with_status(pending_order(1, 1), OrderStatusType::Processed));
        // Order 2 answered but did not move.
        scored.insert(2, pending_order(2, 1));
        // Order 3 is absent: no answer this cycle.

        let changed = changed_orders(&polled, &scored);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].order_id, 1);
        assert_eq!(changed[0].status, OrderStatusType::Processed);
    }
}
