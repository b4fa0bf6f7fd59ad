use lps_common::Amount;
use sqlx::PgConnection;

use crate::db_types::Balance;

const BALANCE_COLUMNS: &str = "user_id, current, withdrawn, changed_at";

pub async fn fetch_balance(user_id: i64, conn: &mut PgConnection) -> Result<Option<Balance>, sqlx::Error> {
    let balance = sqlx::query_as(&format!("SELECT {BALANCE_COLUMNS} FROM balances WHERE user_id = $1"))
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(balance)
}

/// Reads the balance row under a row lock so a concurrent withdrawal cannot slip between the check and the
/// debit. Intended to run inside a transaction.
pub(crate) async fn fetch_balance_for_update(
    user_id: i64,
    conn: &mut PgConnection,
) -> Result<Option<Balance>, sqlx::Error> {
    let balance =
        sqlx::query_as(&format!("SELECT {BALANCE_COLUMNS} FROM balances WHERE user_id = $1 FOR UPDATE"))
            .bind(user_id)
            .fetch_optional(conn)
            .await?;
    Ok(balance)
}

/// Adds an accrual to a user's spendable balance, creating the row on first credit.
pub(crate) async fn credit_balance(
    user_id: i64,
    amount: Amount,
    conn: &mut PgConnection,
) -> Result<Balance, sqlx::Error> {
    let balance = sqlx::query_as(
        r#"
            INSERT INTO balances (user_id, current, withdrawn)
            VALUES ($1, $2, 0)
            ON CONFLICT (user_id)
            DO UPDATE SET current = balances.current + excluded.current, changed_at = now()
            RETURNING user_id, current, withdrawn, changed_at
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_one(conn)
    .await?;
    Ok(balance)
}

/// Moves `amount` from the spendable balance to the withdrawn total, creating the row if it never existed.
/// The caller checks coverage first; this just applies the arithmetic.
pub(crate) async fn debit_balance(
    user_id: i64,
    amount: Amount,
    conn: &mut PgConnection,
) -> Result<Balance, sqlx::Error> {
    let balance = sqlx::query_as(
        r#"
            INSERT INTO balances (user_id, current, withdrawn)
            VALUES ($1, -$2::numeric, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET current = balances.current - $2::numeric,
                          withdrawn = balances.withdrawn + $2::numeric,
                          changed_at = now()
            RETURNING user_id, current, withdrawn, changed_at
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_one(conn)
    .await?;
    Ok(balance)
}
