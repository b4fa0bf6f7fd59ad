//! Small self-contained helpers: order-number checksum validation and the keyed password hash.

mod luhn;
mod passwords;

pub use luhn::valid_luhn;
pub use passwords::{hash_password, verify_password};
