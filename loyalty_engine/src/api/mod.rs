//! Service-layer APIs.
//!
//! Each API is generic over the storage traits it needs, so handlers and tests can plug in mocks. They own
//! the translation between the string-form identifiers used at the HTTP boundary and the numeric ids used
//! by storage, and every order number crossing that boundary goes through the Luhn check here.

mod accrual_api;
mod auth_api;
mod order_api;

pub use accrual_api::{changed_orders, AccrualApi};
pub use auth_api::{AuthApi, AuthApiError};
pub use order_api::{OrderApi, OrderApiError};
