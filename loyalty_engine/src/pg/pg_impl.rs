//! `PgLoyaltyDatabase` is the concrete Postgres implementation of the storage traits.
use std::{fmt::Debug, time::Duration};

use log::{debug, trace, warn};
use sqlx::{Connection, PgPool};

use super::db::{self, balances, orders, users, withdrawals};
use crate::{
    db_types::{Balance, NewOrder, NewUser, NewWithdrawal, Order, OrderStatusType, User, Withdrawal},
    traits::{BalanceManagement, LoyaltyDatabase, OrderManagement, StorageError, UserManagement},
};

/// How long a startup ping may take overall, and per attempt.
const PING_DEADLINE: Duration = Duration::from_secs(60);
const PING_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct PgLoyaltyDatabase {
    url: String,
    pool: PgPool,
}

impl Debug for PgLoyaltyDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "PgLoyaltyDatabase ({:?})", self.pool)
    }
}

impl PgLoyaltyDatabase {
    /// Opens the pool (retrying connection-class failures) and waits for the database to answer a ping
    /// before handing the backend to callers.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = db::connect_with_retry(url, max_connections).await?;
        let this = Self { url: url.to_string(), pool };
        this.ping_until_ready().await?;
        Ok(this)
    }

    pub fn new_with_pool(url: &str, pool: PgPool) -> Self {
        Self { url: url.to_string(), pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ping_until_ready(&self) -> Result<(), StorageError> {
        let ping_loop = async {
            let mut backoff = db::CONNECT_BACKOFF_MS.iter();
            loop {
                match tokio::time::timeout(PING_ATTEMPT_TIMEOUT, self.ping()).await {
                    Ok(Ok(())) => return Ok(()),
                    Ok(Err(e)) => match backoff.next() {
                        Some(ms) => {
                            warn!("🗄️ Database ping failed ({e}). Retrying in {ms} ms");
                            tokio::time::sleep(Duration::from_millis(*ms)).await;
                        },
                        None => return Err(e),
                    },
                    Err(_elapsed) => match backoff.next() {
                        Some(ms) => {
                            warn!("🗄️ Database ping timed out. Retrying in {ms} ms");
                            tokio::time::sleep(Duration::from_millis(*ms)).await;
                        },
                        None => return Err(StorageError::Database(sqlx::Error::PoolTimedOut)),
                    },
                }
            }
        };
        tokio::time::timeout(PING_DEADLINE, ping_loop)
            .await
            .map_err(|_| StorageError::Database(sqlx::Error::PoolTimedOut))?
    }
}

impl LoyaltyDatabase for PgLoyaltyDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn ping(&self) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

impl UserManagement for PgLoyaltyDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::insert_user(user, &mut conn).await?;
        debug!("🧑️ User {} registered with id {}", user.name, user.id);
        Ok(user)
    }

    async fn fetch_user_by_name(&self, name: &str) -> Result<User, StorageError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_name(name, &mut conn).await?.ok_or(StorageError::NotFound)
    }
}

impl OrderManagement for PgLoyaltyDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn fetch_order_by_id(&self, order_id: i64) -> Result<Order, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_id(order_id, &mut conn).await?.ok_or(StorageError::NotFound)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_user(user_id, &mut conn).await?)
    }

    async fn fetch_orders_for_processing(&self) -> Result<Vec<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_processing(&mut conn).await?)
    }

    /// Applies the whole batch in one transaction. The order row update is guarded so terminal rows stay
    /// untouched, and the balance credit only happens for rows that actually transitioned into `PROCESSED`.
    async fn update_orders_and_balances(&self, scored: &[Order]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        for order in scored {
            let Some(user_id) = orders::apply_order_score(order, &mut tx).await? else {
                trace!("🗄️ Order {} already terminal, skipping", order.order_id);
                continue;
            };
            if order.status == OrderStatusType::Processed && !order.accrual.is_zero() {
                let balance = balances::credit_balance(user_id, order.accrual, &mut tx).await?;
                debug!(
                    "🗄️ Order {} processed, {} credited to user {user_id} (balance now {})",
                    order.order_id, order.accrual, balance.current
                );
            }
        }
        tx.commit().await?;
        Ok(())
    }
}

impl BalanceManagement for PgLoyaltyDatabase {
    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let balance = balances::fetch_balance(user_id, &mut conn).await?;
        Ok(balance.unwrap_or_else(|| Balance::empty(user_id)))
    }

    async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await?)
    }

    async fn insert_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        let current = balances::fetch_balance_for_update(withdrawal.user_id, &mut tx)
            .await?
            .map(|b| b.current)
            .unwrap_or_default();
        if current < withdrawal.sum {
            // Dropping the transaction rolls it back, so the failed attempt leaves no trace.
            return Err(StorageError::BalanceNotEnough);
        }
        let balance = balances::debit_balance(withdrawal.user_id, withdrawal.sum, &mut tx).await?;
        let w = withdrawals::insert_withdrawal(&withdrawal, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗄️ Withdrawal of {} against order {} recorded for user {} (balance now {})",
            w.sum, w.order_id, w.user_id, balance.current
        );
        Ok(())
    }
}
