//! The behaviour a storage backend must provide.
//!
//! The traits are deliberately narrow. Each one covers a single concern, and the service-layer APIs only ask
//! for the traits they actually use, which keeps them easy to mock in tests. [`LoyaltyDatabase`] bundles the
//! lot for code that wires up a real backend.

mod balance_management;
mod order_management;
mod user_management;

pub use balance_management::BalanceManagement;
pub use order_management::OrderManagement;
use thiserror::Error;
pub use user_management::UserManagement;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("The record already exists")]
    AlreadyExists,
    #[error("The requested record was not found")]
    NotFound,
    #[error("The balance does not cover the requested sum")]
    BalanceNotEnough,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The umbrella trait for a full storage backend.
#[allow(async_fn_in_trait)]
pub trait LoyaltyDatabase: Clone + UserManagement + OrderManagement + BalanceManagement {
    /// The connection string this backend was opened with.
    fn url(&self) -> &str;

    async fn ping(&self) -> Result<(), StorageError>;

    async fn close(&self);
}
