use std::{sync::Arc, time::Duration};

use log::{debug, trace};
use reqwest::{header, Client};
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use super::{AccrualError, Job, JobOutcome, OrderScore};

pub const HTTP_SUCCESS: u16 = 200;
pub const HTTP_RETRY: u16 = 429;

/// How long a worker waits for a TCP connection (including the TLS handshake) to come up. There is no
/// total-request timeout; cancellation comes from the pool's token.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Worker count. The scorer rate-limits us, so this doubles as the concurrency cap.
    pub rate_limit: usize,
    /// Base URL of the accrual service, scheme included.
    pub base_url: String,
}

impl PoolConfig {
    /// Builds a config from the raw `-r` flag value, which historically omits the scheme.
    pub fn new(rate_limit: usize, address: &str) -> Self {
        let base_url = normalize_base_url(address);
        Self { rate_limit: rate_limit.max(1), base_url }
    }
}

fn normalize_base_url(address: &str) -> String {
    let address = address.trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

/// A fixed-size set of workers, each owning one HTTP client, all pulling from a single job channel.
pub struct ClientPool {
    cfg: PoolConfig,
    clients: Vec<Client>,
}

impl ClientPool {
    pub fn new(cfg: PoolConfig) -> Result<Self, AccrualError> {
        // Scorer traffic always goes direct, whatever proxy variables the environment carries.
        let clients = (0..cfg.rate_limit)
            .map(|_| Client::builder().connect_timeout(CONNECT_TIMEOUT).no_proxy().build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { cfg, clients })
    }

    pub fn worker_count(&self) -> usize {
        self.clients.len()
    }

    /// Channel capacity both sides of the pool should use. Twice the worker count keeps producers ahead of
    /// the workers without unbounded buffering.
    pub fn channel_capacity(&self) -> usize {
        2 * self.worker_count()
    }

    /// Starts one task per worker against the caller's channels and returns their join handles.
    ///
    /// The pool does not own channel lifetime: the caller closes `jobs` (by dropping the sender) to drain
    /// the pool, and the result channel closes on its own once every worker has exited and dropped its
    /// sender clone. Cancelling the token makes workers return without emitting further outcomes.
    pub fn start(
        &self,
        cancel: CancellationToken,
        jobs: mpsc::Receiver<Job>,
        results: mpsc::Sender<JobOutcome>,
    ) -> Vec<JoinHandle<()>> {
        let jobs = Arc::new(Mutex::new(jobs));
        debug!("🛰️ Starting accrual client pool with {} workers", self.worker_count());
        self.clients
            .iter()
            .map(|client| {
                tokio::spawn(worker(
                    client.clone(),
                    self.cfg.base_url.clone(),
                    cancel.clone(),
                    Arc::clone(&jobs),
                    results.clone(),
                ))
            })
            .collect()
    }
}

async fn worker(
    client: Client,
    base_url: String,
    cancel: CancellationToken,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    results: mpsc::Sender<JobOutcome>,
) {
    loop {
        // The lock is only held while waiting for the next job, so workers take turns on the receiver.
        let job = {
            let mut rx = jobs.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                job = rx.recv() => match job {
                    Some(job) => job,
                    None => return,
                },
            }
        };
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            outcome = score_order(&client, &base_url, job) => outcome,
        };
        if results.send(outcome).await.is_err() {
            return;
        }
    }
}

async fn score_order(client: &Client, base_url: &str, job: Job) -> JobOutcome {
    let url = format!("{base_url}/api/orders/{}", job.order.order_id);
    trace!("🛰️ GET {url}");
    let request =
        client.get(&url).header(header::CONTENT_TYPE, "text/plain").header(header::ACCEPT, "application/json");
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            debug!("🛰️ Request for order {} failed: {e}", job.order.order_id);
            return JobOutcome::transport_error(job, e.to_string());
        },
    };
    let code = response.status().as_u16();
    match code {
        HTTP_RETRY => {
            let wait = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(0);
            debug!("🛰️ Scorer is throttling us, asked to wait {wait} s");
            JobOutcome::throttled(job, wait)
        },
        HTTP_SUCCESS => match response.json::<OrderScore>().await {
            Ok(score) => {
                trace!("🛰️ Order {} scored {:?} ({:?})", score.order, score.status, score.accrual);
                JobOutcome::scored(job, score)
            },
            Err(e) => JobOutcome::transport_error(job, format!("cannot decode accrual response: {e}")),
        },
        other => JobOutcome::unscored(job, other),
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use lps_common::Amount;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::accrual::JobId;
    use crate::{
        accrual::test_server::spawn_stub_scorer,
        db_types::{Order, OrderStatusType},
    };

    fn pending_order(order_id: i64) -> Order {
        Order {
            order_id,
            user_id: 1,
            status: OrderStatusType::New,
            accrual: Amount::ZERO,
            uploaded_at: Utc::now(),
            changed_at: Utc::now(),
        }
    }

    #[test]
    fn base_url_gains_a_scheme_when_missing() {
        assert_eq!(normalize_base_url("localhost:8100"), "http://localhost:8100");
        assert_eq!(normalize_base_url("http://scorer:8100/"), "http://scorer:8100");
        assert_eq!(normalize_base_url("https://scorer"), "https://scorer");
    }

    #[tokio::test]
    async fn workers_drain_the_job_channel_and_report_every_outcome() {
        let _ = env_logger::try_init();
        let (addr, server) = spawn_stub_scorer().await;
        let pool = ClientPool::new(PoolConfig::new(3, &addr.to_string())).unwrap();
        let cap = pool.channel_capacity();
        let (jobs_tx, jobs_rx) = mpsc::channel(cap);
        let (results_tx, mut results_rx) = mpsc::channel(cap);

        let cancel = CancellationToken::new();
        let handles = pool.start(cancel, jobs_rx, results_tx);

        // First digit steers the stub: 2xx → PROCESSED, 1xx → INVALID, 4xx → 429, 5xx → 500.
        for (id, order_id) in [2001i64, 1002, 4003, 5004].iter().enumerate() {
            jobs_tx.send(Job { id: id as JobId + 1, order: pending_order(*order_id) }).await.unwrap();
        }
        drop(jobs_tx);

        let mut outcomes = Vec::new();
        while let Some(outcome) = results_rx.recv().await {
            outcomes.push(outcome);
        }
        for handle in handles {
            handle.await.unwrap();
        }
        server.abort();

        assert_eq!(outcomes.len(), 4);
        let by_order = |id: i64| outcomes.iter().find(|o| o.order.order_id == id).unwrap();

        let processed = by_order(2001);
        assert_eq!(processed.code, HTTP_SUCCESS);
        assert_eq!(processed.order.status, OrderStatusType::Processed);
        assert_eq!(processed.order.accrual, Amount::from(dec!(729.98)));

        let invalid = by_order(1002);
        assert_eq!(invalid.code, HTTP_SUCCESS);
        assert_eq!(invalid.order.status, OrderStatusType::Invalid);
        assert_eq!(invalid.order.accrual, Amount::ZERO);

        let throttled = by_order(4003);
        assert_eq!(throttled.code, HTTP_RETRY);
        assert_eq!(throttled.retry_after_secs, 7);

        let failed = by_order(5004);
        assert_eq!(failed.code, 500);
        assert_eq!(failed.retry_after_secs, 0);
        assert!(failed.error.is_none());
    }

    #[tokio::test]
    async fn cancelled_workers_exit_without_emitting() {
        let (addr, server) = spawn_stub_scorer().await;
        let pool = ClientPool::new(PoolConfig::new(2, &addr.to_string())).unwrap();
        let cap = pool.channel_capacity();
        let (jobs_tx, jobs_rx) = mpsc::channel(cap);
        let (results_tx, mut results_rx) = mpsc::channel(cap);

        let cancel = CancellationToken::new();
        let handles = pool.start(cancel.clone(), jobs_rx, results_tx);
        cancel.cancel();

        for handle in handles {
            handle.await.unwrap();
        }
        // With every worker gone the result channel must be closed and empty.
        assert!(results_rx.recv().await.is_none());
        drop(jobs_tx);
        server.abort();
    }
}
