//! The Postgres storage backend.

mod db;
mod pg_impl;

pub use db::{connect_with_retry, new_pool};
pub use pg_impl::PgLoyaltyDatabase;

/// Applies any pending forward migrations. Never rolls anything back.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("src/pg/migrations").run(pool).await
}
