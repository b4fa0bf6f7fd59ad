//! # Postgres database methods
//!
//! This module contains the "low-level" Postgres interactions.
//!
//! All these interactions are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut PgConnection` argument. Callers can obtain a connection from a pool, or create an atomic
//! transaction as the need arises and pass `&mut *tx` without any other changes.

use std::time::Duration;

use log::warn;
use sqlx::{postgres::PgPoolOptions, Error as SqlxError, PgPool};

pub mod balances;
pub mod orders;
pub mod users;
pub mod withdrawals;

/// Backoff steps applied when opening the pool against a database that is still coming up.
pub(crate) const CONNECT_BACKOFF_MS: [u64; 3] = [1000, 3000, 5000];

pub async fn new_pool(url: &str, max_connections: u32) -> Result<PgPool, SqlxError> {
    PgPoolOptions::new().max_connections(max_connections).connect(url).await
}

/// Opens the pool, retrying connection-class failures with a short backoff. Anything else (a bad DSN, an
/// authentication failure) is returned immediately.
pub async fn connect_with_retry(url: &str, max_connections: u32) -> Result<PgPool, SqlxError> {
    let mut backoff = CONNECT_BACKOFF_MS.iter();
    loop {
        match new_pool(url, max_connections).await {
            Ok(pool) => return Ok(pool),
            Err(e) if is_connection_error(&e) => match backoff.next() {
                Some(ms) => {
                    warn!("🗄️ Could not reach the database ({e}). Retrying in {ms} ms");
                    tokio::time::sleep(Duration::from_millis(*ms)).await;
                },
                None => return Err(e),
            },
            Err(e) => return Err(e),
        }
    }
}

/// True when the error is a Postgres unique-constraint violation (SQLSTATE 23505).
pub(crate) fn is_unique_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(db) if db.code().as_deref() == Some("23505"))
}

/// True for failures worth retrying when opening a connection: I/O and TLS trouble, pool exhaustion, and
/// the Postgres connection-exception class (SQLSTATE 08xxx).
pub(crate) fn is_connection_error(e: &SqlxError) -> bool {
    match e {
        SqlxError::Io(_) | SqlxError::Tls(_) | SqlxError::PoolTimedOut | SqlxError::PoolClosed => true,
        SqlxError::Database(db) => db.code().map(|c| c.starts_with("08")).unwrap_or(false),
        _ => false,
    }
}
