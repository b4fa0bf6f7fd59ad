//! Loyalty Engine
//!
//! The loyalty engine is the core of the loyalty accrual back-end. It owns the domain types, the storage
//! traits and their Postgres implementation, the Luhn and password helpers, the rate-limited client pool that
//! talks to the external accrual scorer, and the service-layer APIs that the HTTP surface calls into.
//!
//! The library is split along the same lines as the runtime:
//! 1. Storage. The behaviour a backend must provide is described by the traits in [`traits`]; the concrete
//!    Postgres backend lives in the `pg` module and is exported as [`PgLoyaltyDatabase`]. You should never
//!    need to touch the database directly. The exception is the data types, which are defined in
//!    [`db_types`] and are public.
//! 2. Accrual. The [`accrual`] module carries the worker pool that fans order lookups out to the external
//!    scorer, and [`api::AccrualApi`] drives a full fan-out/fan-in cycle and commits the results.
//! 3. Request-scoped services. [`api::AuthApi`] and [`api::OrderApi`] implement registration, login, order
//!    acceptance, balances and withdrawals on top of any backend implementing the storage traits.

pub mod accrual;
pub mod api;
pub mod db_types;
pub mod helpers;
mod pg;
pub mod traits;

pub use api::{AccrualApi, AuthApi, OrderApi};
pub use pg::{run_migrations, PgLoyaltyDatabase};
