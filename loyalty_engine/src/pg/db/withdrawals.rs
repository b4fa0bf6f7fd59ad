use sqlx::PgConnection;

use crate::{
    db_types::{NewWithdrawal, Withdrawal},
    pg::db::is_unique_violation,
    traits::StorageError,
};

/// All withdrawals made by `user_id`, oldest first.
pub async fn fetch_withdrawals_for_user(
    user_id: i64,
    conn: &mut PgConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals = sqlx::query_as(
        "SELECT user_id, order_id, sum, processed_at FROM withdrawals \
         WHERE user_id = $1 ORDER BY processed_at",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(withdrawals)
}

/// Appends a withdrawal row. The order number is unique across all withdrawals; a second withdrawal against
/// the same number maps to [`StorageError::AlreadyExists`].
pub(crate) async fn insert_withdrawal(
    withdrawal: &NewWithdrawal,
    conn: &mut PgConnection,
) -> Result<Withdrawal, StorageError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO withdrawals (user_id, order_id, sum)
            VALUES ($1, $2, $3)
            RETURNING user_id, order_id, sum, processed_at
        "#,
    )
    .bind(withdrawal.user_id)
    .bind(withdrawal.order_id)
    .bind(withdrawal.sum)
    .fetch_one(conn)
    .await;
    match result {
        Ok(w) => Ok(w),
        Err(e) if is_unique_violation(&e) => Err(StorageError::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}
