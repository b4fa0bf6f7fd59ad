use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use lps_common::Amount;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

//--------------------------------------        User        ----------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Hex-encoded HMAC-SHA-256 of the plaintext password under the server-wide signature key.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       NewUser      ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub password_hash: String,
}

//--------------------------------------   OrderStatusType  ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been accepted but not handed to the scorer yet.
    New,
    /// The scorer is working on the order.
    Processing,
    /// The scorer has registered the order but not started working on it. Behaves like `Processing`.
    Registered,
    /// Terminal. The order has been scored and may carry an accrual.
    Processed,
    /// Terminal. The scorer rejected the order; no accrual will ever be credited.
    Invalid,
}

impl OrderStatusType {
    /// True for statuses the accrual poller still needs to chase.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::New | Self::Processing | Self::Registered)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Invalid)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::Processing => write!(f, "PROCESSING"),
            Self::Registered => write!(f, "REGISTERED"),
            Self::Processed => write!(f, "PROCESSED"),
            Self::Invalid => write!(f, "INVALID"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for OrderStatusType {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "REGISTERED" => Ok(Self::Registered),
            "PROCESSED" => Ok(Self::Processed),
            "INVALID" => Ok(Self::Invalid),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

impl TryFrom<String> for OrderStatusType {
    type Error = StatusConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//--------------------------------------        Order       ----------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    /// The Luhn-valid order number. Globally unique, owned by exactly one user.
    pub order_id: i64,
    pub user_id: i64,
    #[sqlx(try_from = "String")]
    pub status: OrderStatusType,
    /// Only meaningful once the order reaches `Processed`.
    pub accrual: Amount,
    pub uploaded_at: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder      ----------------------------------------------------------
/// An order as submitted by a user. It enters the store with status `NEW` and a zero accrual.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: i64,
    pub user_id: i64,
}

//--------------------------------------       Balance      ----------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Balance {
    pub user_id: i64,
    pub current: Amount,
    pub withdrawn: Amount,
    pub changed_at: DateTime<Utc>,
}

impl Balance {
    /// The balance of a user that has never been credited: all zeroes. Balance rows are created lazily, so
    /// "no row" and "zero balance" are the same thing to callers.
    pub fn empty(user_id: i64) -> Self {
        Self { user_id, current: Amount::ZERO, withdrawn: Amount::ZERO, changed_at: Utc::now() }
    }
}

//--------------------------------------     Withdrawal     ----------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Withdrawal {
    pub user_id: i64,
    pub order_id: i64,
    pub sum: Amount,
    pub processed_at: DateTime<Utc>,
}

//--------------------------------------    NewWithdrawal   ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub user_id: i64,
    pub order_id: i64,
    pub sum: Amount,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatusType::New,
            OrderStatusType::Processing,
            OrderStatusType::Registered,
            OrderStatusType::Processed,
            OrderStatusType::Invalid,
        ] {
            let s = status.to_string();
            assert_eq!(s.parse::<OrderStatusType>().unwrap(), status);
        }
        assert!("COMPLETED".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn status_pending_and_terminal_are_disjoint() {
        assert!(OrderStatusType::New.is_pending());
        assert!(OrderStatusType::Processing.is_pending());
        assert!(OrderStatusType::Registered.is_pending());
        assert!(OrderStatusType::Processed.is_terminal());
        assert!(OrderStatusType::Invalid.is_terminal());
        assert!(!OrderStatusType::Processed.is_pending());
        assert!(!OrderStatusType::New.is_terminal());
    }

    #[test]
    fn status_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&OrderStatusType::Processed).unwrap(), r#""PROCESSED""#);
        let s: OrderStatusType = serde_json::from_str(r#""REGISTERED""#).unwrap();
        assert_eq!(s, OrderStatusType::Registered);
    }
}
