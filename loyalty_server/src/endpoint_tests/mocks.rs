use loyalty_engine::{
    db_types::{Balance, NewOrder, NewUser, NewWithdrawal, Order, User, Withdrawal},
    traits::{BalanceManagement, OrderManagement, StorageError, UserManagement},
};
use mockall::mock;

mock! {
    pub LoyaltyStore {}
    impl UserManagement for LoyaltyStore {
        async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;
        async fn fetch_user_by_name(&self, name: &str) -> Result<User, StorageError>;
    }
    impl OrderManagement for LoyaltyStore {
        async fn insert_order(&self, order: NewOrder) -> Result<(), StorageError>;
        async fn fetch_order_by_id(&self, order_id: i64) -> Result<Order, StorageError>;
        async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, StorageError>;
        async fn fetch_orders_for_processing(&self) -> Result<Vec<Order>, StorageError>;
        async fn update_orders_and_balances(&self, orders: &[Order]) -> Result<(), StorageError>;
    }
    impl BalanceManagement for LoyaltyStore {
        async fn fetch_balance(&self, user_id: i64) -> Result<Balance, StorageError>;
        async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, StorageError>;
        async fn insert_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<(), StorageError>;
    }
}
