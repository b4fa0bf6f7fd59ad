use log::debug;
use lps_common::Amount;
use thiserror::Error;

use crate::{
    db_types::{Balance, NewOrder, NewWithdrawal, Order, Withdrawal},
    helpers::valid_luhn,
    traits::{BalanceManagement, OrderManagement, StorageError},
};

#[derive(Debug, Error)]
pub enum OrderApiError {
    /// The order number does not parse as an unsigned integer or fails the Luhn check.
    #[error("Not a valid order number: {0}")]
    InvalidOrderNumber(String),
    /// A withdrawal sum must be strictly positive.
    #[error("Not a valid withdrawal sum: {0}")]
    InvalidWithdrawalSum(Amount),
    /// The same user resubmitted the same order. Harmless.
    #[error("Order was already uploaded by this user")]
    OrderAlreadyLoaded,
    /// Somebody else owns this order number.
    #[error("Order was already uploaded by another user")]
    OrderAlreadyLoadedByOtherUser,
    #[error("The balance does not cover the withdrawal")]
    BalanceNotEnough,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Parses an order number from its text form and runs the Luhn check. Numbers beyond the signed 64-bit
/// range cannot exist in storage, so they fail validation like any other typo.
fn parse_order_number(number: &str) -> Result<i64, OrderApiError> {
    let parsed = number
        .trim()
        .parse::<u64>()
        .map_err(|_| OrderApiError::InvalidOrderNumber(number.to_string()))?;
    if !valid_luhn(parsed) {
        return Err(OrderApiError::InvalidOrderNumber(number.to_string()));
    }
    i64::try_from(parsed).map_err(|_| OrderApiError::InvalidOrderNumber(number.to_string()))
}

/// Order acceptance, listings, balances and withdrawals.
pub struct OrderApi<B> {
    db: B,
}

impl<B> OrderApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderApi<B>
where B: OrderManagement + BalanceManagement
{
    /// Accepts an order number submitted by `user_id`.
    ///
    /// A resubmission by the same user is reported as [`OrderApiError::OrderAlreadyLoaded`] so the API can
    /// answer idempotently; the same number from anybody else is an ownership conflict.
    pub async fn submit_order(&self, user_id: i64, number: &str) -> Result<(), OrderApiError> {
        let order_id = parse_order_number(number)?;
        match self.db.insert_order(NewOrder { order_id, user_id }).await {
            Ok(()) => {
                debug!("📦️ Order {order_id} accepted for user {user_id}");
                Ok(())
            },
            Err(StorageError::AlreadyExists) => {
                let existing = self.db.fetch_order_by_id(order_id).await?;
                if existing.user_id == user_id {
                    Err(OrderApiError::OrderAlreadyLoaded)
                } else {
                    Err(OrderApiError::OrderAlreadyLoadedByOtherUser)
                }
            },
            Err(e) => Err(e.into()),
        }
    }

    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderApiError> {
        Ok(self.db.fetch_orders_for_user(user_id).await?)
    }

    pub async fn balance_for_user(&self, user_id: i64) -> Result<Balance, OrderApiError> {
        Ok(self.db.fetch_balance(user_id).await?)
    }

    pub async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, OrderApiError> {
        Ok(self.db.fetch_withdrawals(user_id).await?)
    }

    /// Withdraws `sum` points against a (new, Luhn-valid) order number.
    pub async fn withdraw(&self, user_id: i64, number: &str, sum: Amount) -> Result<(), OrderApiError> {
        let order_id = parse_order_number(number)?;
        if !sum.is_positive() {
            return Err(OrderApiError::InvalidWithdrawalSum(sum));
        }
        match self.db.insert_withdrawal(NewWithdrawal { user_id, order_id, sum }).await {
            Ok(()) => {
                debug!("💸️ User {user_id} withdrew {sum} against order {order_id}");
                Ok(())
            },
            Err(StorageError::BalanceNotEnough) => Err(OrderApiError::BalanceNotEnough),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use mockall::mock;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::db_types::OrderStatusType;

    mock! {
        pub Store {}
        impl OrderManagement for Store {
            async fn insert_order(&self, order: NewOrder) -> Result<(), StorageError>;
            async fn fetch_order_by_id(&self, order_id: i64) -> Result<Order, StorageError>;
            async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, StorageError>;
            async fn fetch_orders_for_processing(&self) -> Result<Vec<Order>, StorageError>;
            async fn update_orders_and_balances(&self, orders: &[Order]) -> Result<(), StorageError>;
        }
        impl BalanceManagement for Store {
            async fn fetch_balance(&self, user_id: i64) -> Result<Balance, StorageError>;
            async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, StorageError>;
            async fn insert_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<(), StorageError>;
        }
    }

    fn stored_order(order_id: i64, user_id: i64) -> Order {
        Order {
            order_id,
            user_id,
            status: OrderStatusType::New,
            accrual: Amount::ZERO,
            uploaded_at: Utc::now(),
            changed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn fresh_order_is_accepted() {
        let mut store = MockStore::new();
        store.expect_insert_order().withf(|o| o.order_id == 5062821234567892 && o.user_id == 7).returning(|_| Ok(()));
        let api = OrderApi::new(store);
        api.submit_order(7, "5062821234567892").await.unwrap();
    }

    #[tokio::test]
    async fn malformed_numbers_never_reach_storage() {
        let api = OrderApi::new(MockStore::new());
        for number in ["123456", "not-a-number", "", "5062821234567893", "99999999999999999999999"] {
            let err = api.submit_order(1, number).await.unwrap_err();
            assert!(matches!(err, OrderApiError::InvalidOrderNumber(_)), "{number} should be rejected");
        }
    }

    #[tokio::test]
    async fn resubmission_is_idempotent_for_the_owner_and_a_conflict_for_others() {
        let mut store = MockStore::new();
        store.expect_insert_order().returning(|_| Err(StorageError::AlreadyExists));
        store.expect_fetch_order_by_id().returning(|id| Ok(stored_order(id, 7)));
        let api = OrderApi::new(store);

        let err = api.submit_order(7, "5062821234567892").await.unwrap_err();
        assert!(matches!(err, OrderApiError::OrderAlreadyLoaded));

        let err = api.submit_order(8, "5062821234567892").await.unwrap_err();
        assert!(matches!(err, OrderApiError::OrderAlreadyLoadedByOtherUser));
    }

    #[tokio::test]
    async fn withdrawal_maps_storage_errors() {
        let mut store = MockStore::new();
        store.expect_insert_withdrawal().returning(|_| Err(StorageError::BalanceNotEnough));
        let api = OrderApi::new(store);
        let err = api.withdraw(7, "2377225624", Amount::from(dec!(751))).await.unwrap_err();
        assert!(matches!(err, OrderApiError::BalanceNotEnough));
    }

    #[tokio::test]
    async fn withdrawal_sums_must_be_positive() {
        let api = OrderApi::new(MockStore::new());
        let err = api.withdraw(7, "2377225624", Amount::ZERO).await.unwrap_err();
        assert!(matches!(err, OrderApiError::InvalidWithdrawalSum(_)));
        let err = api.withdraw(7, "2377225624", Amount::from(dec!(-5))).await.unwrap_err();
        assert!(matches!(err, OrderApiError::InvalidWithdrawalSum(_)));
    }

    #[tokio::test]
    async fn withdrawal_order_numbers_are_luhn_checked() {
        let api = OrderApi::new(MockStore::new());
        let err = api.withdraw(7, "2377225625", Amount::from(dec!(1))).await.unwrap_err();
        assert!(matches!(err, OrderApiError::InvalidOrderNumber(_)));
    }
}
