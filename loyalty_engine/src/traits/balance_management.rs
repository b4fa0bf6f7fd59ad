use crate::{
    db_types::{Balance, NewWithdrawal, Withdrawal},
    traits::StorageError,
};

#[allow(async_fn_in_trait)]
pub trait BalanceManagement {
    /// The user's balance. Balance rows are created lazily, so a user without one gets a zeroed balance
    /// rather than an error.
    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, StorageError>;

    /// All withdrawals made by the user, oldest first.
    async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, StorageError>;

    /// Executes a withdrawal in a single atomic transaction.
    ///
    /// Fails with [`StorageError::BalanceNotEnough`] when the current balance does not cover the sum, in
    /// which case nothing is changed. Fails with [`StorageError::AlreadyExists`] when a withdrawal against
    /// the same order number was already recorded.
    async fn insert_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<(), StorageError>;
}
