use crate::{
    db_types::{NewUser, User},
    traits::StorageError,
};

#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Stores a new user and returns it with its assigned id.
    ///
    /// User names are unique; a second registration under the same name fails with
    /// [`StorageError::AlreadyExists`].
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;

    /// Fetches a user by name, including the stored password hash.
    /// Returns [`StorageError::NotFound`] when no such user exists.
    async fn fetch_user_by_name(&self, name: &str) -> Result<User, StorageError>;
}
