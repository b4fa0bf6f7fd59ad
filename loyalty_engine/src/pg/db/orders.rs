use log::trace;
use sqlx::PgConnection;

use crate::{
    db_types::{NewOrder, Order},
    pg::db::is_unique_violation,
    traits::StorageError,
};

const ORDER_COLUMNS: &str = "order_id, user_id, status, accrual, uploaded_at, changed_at";

/// Inserts a freshly submitted order with status `NEW` and a zero accrual. The order number carries a
/// unique constraint, so a resubmission maps to [`StorageError::AlreadyExists`] and the caller decides
/// whether that is the idempotent case or an ownership conflict.
pub async fn insert_order(order: NewOrder, conn: &mut PgConnection) -> Result<(), StorageError> {
    let result = sqlx::query(
        r#"
            INSERT INTO orders (order_id, user_id, status, accrual)
            VALUES ($1, $2, 'NEW', 0)
        "#,
    )
    .bind(order.order_id)
    .bind(order.user_id)
    .execute(conn)
    .await;
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(StorageError::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_id(order_id: i64, conn: &mut PgConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"))
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// All orders belonging to `user_id`, newest upload first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut PgConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY uploaded_at DESC"
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Every order the accrual poller still needs to chase, newest upload first.
pub async fn fetch_orders_for_processing(conn: &mut PgConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE status IN ('NEW', 'PROCESSING', 'REGISTERED') ORDER BY uploaded_at DESC"
    ))
    .fetch_all(conn)
    .await?;
    trace!("🗄️ {} orders awaiting accrual", orders.len());
    Ok(orders)
}

/// Writes a freshly scored status and accrual onto an order row and bumps `changed_at`.
///
/// Terminal rows are left alone, which makes replaying a batch harmless. Returns the owning user id when
/// the row actually changed, `None` otherwise.
pub(crate) async fn apply_order_score(order: &Order, conn: &mut PgConnection) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
            UPDATE orders SET status = $2, accrual = $3, changed_at = now()
            WHERE order_id = $1 AND status NOT IN ('PROCESSED', 'INVALID')
            RETURNING user_id
        "#,
    )
    .bind(order.order_id)
    .bind(order.status.to_string())
    .bind(order.accrual)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(user_id,)| user_id))
}
