use crate::{
    db_types::{NewOrder, Order},
    traits::StorageError,
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a freshly submitted order with status `NEW` and a zero accrual.
    ///
    /// Order numbers are globally unique; a resubmission fails with [`StorageError::AlreadyExists`] and the
    /// caller decides whether that is the idempotent case or an ownership conflict.
    async fn insert_order(&self, order: NewOrder) -> Result<(), StorageError>;

    /// Fetches a single order by its number. Returns [`StorageError::NotFound`] when absent.
    async fn fetch_order_by_id(&self, order_id: i64) -> Result<Order, StorageError>;

    /// All orders belonging to a user, newest upload first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, StorageError>;

    /// All orders the accrual poller still needs to chase (`NEW`, `PROCESSING` or `REGISTERED`), newest
    /// upload first.
    async fn fetch_orders_for_processing(&self) -> Result<Vec<Order>, StorageError>;

    /// Applies a batch of freshly scored orders in a single atomic transaction.
    ///
    /// For every order in the batch the stored status and accrual are replaced and `changed_at` is bumped.
    /// A user's balance is credited with the accrual only when the row actually transitions into
    /// `PROCESSED`, so replaying a batch never credits twice.
    async fn update_orders_and_balances(&self, orders: &[Order]) -> Result<(), StorageError>;
}
