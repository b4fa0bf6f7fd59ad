use log::debug;
use lps_common::Secret;
use thiserror::Error;

use crate::{
    db_types::{NewUser, User},
    helpers::{hash_password, verify_password},
    traits::{StorageError, UserManagement},
};

#[derive(Debug, Error)]
pub enum AuthApiError {
    /// The login or the password was empty.
    #[error("Login and password must both be non-empty")]
    BadCredentials,
    /// Wrong credentials on login, or a taken name on registration. Deliberately vague.
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Registration and login on top of any backend that stores users.
pub struct AuthApi<B> {
    db: B,
    signature_key: Secret<String>,
}

impl<B> AuthApi<B> {
    pub fn new(db: B, signature_key: Secret<String>) -> Self {
        Self { db, signature_key }
    }
}

impl<B> AuthApi<B>
where B: UserManagement
{
    /// Creates a new user and returns it with its assigned id. A taken name surfaces as
    /// [`AuthApiError::AuthenticationFailed`] so callers cannot probe for registered names beyond the 409
    /// the API maps it to.
    pub async fn register_user(&self, name: &str, password: &str) -> Result<User, AuthApiError> {
        if name.is_empty() || password.is_empty() {
            return Err(AuthApiError::BadCredentials);
        }
        let password_hash = hash_password(password, self.signature_key.reveal());
        let user = NewUser { name: name.to_string(), password_hash };
        match self.db.create_user(user).await {
            Ok(user) => {
                debug!("🔐️ New user {} registered", user.name);
                Ok(user)
            },
            Err(StorageError::AlreadyExists) => Err(AuthApiError::AuthenticationFailed),
            Err(e) => Err(e.into()),
        }
    }

    /// Checks the credentials and returns the stored user. Unknown names and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn login_user(&self, name: &str, password: &str) -> Result<User, AuthApiError> {
        if name.is_empty() || password.is_empty() {
            return Err(AuthApiError::BadCredentials);
        }
        let user = match self.db.fetch_user_by_name(name).await {
            Ok(user) => user,
            Err(StorageError::NotFound) => return Err(AuthApiError::AuthenticationFailed),
            Err(e) => return Err(e.into()),
        };
        if !verify_password(password, self.signature_key.reveal(), &user.password_hash) {
            debug!("🔐️ Wrong password for user {name}");
            return Err(AuthApiError::AuthenticationFailed);
        }
        Ok(user)
    }
}
