//! The JSON shapes of the public API.

use chrono::{DateTime, Utc};
use loyalty_engine::db_types::{Balance, Order, OrderStatusType, Withdrawal};
use lps_common::Amount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCredentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderResult {
    pub number: String,
    pub status: OrderStatusType,
    pub accrual: Amount,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderResult {
    fn from(order: Order) -> Self {
        Self {
            number: order.order_id.to_string(),
            status: order.status,
            accrual: order.accrual,
            uploaded_at: order.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResult {
    pub current: Amount,
    pub withdrawn: Amount,
}

impl From<Balance> for BalanceResult {
    fn from(balance: Balance) -> Self {
        Self { current: balance.current, withdrawn: balance.withdrawn }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalResult {
    pub order: String,
    pub sum: Amount,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResult {
    fn from(w: Withdrawal) -> Self {
        Self { order: w.order_id.to_string(), sum: w.sum, processed_at: w.processed_at }
    }
}
