use sqlx::PgConnection;

use crate::{
    db_types::{NewUser, User},
    pg::db::is_unique_violation,
    traits::StorageError,
};

/// Inserts a new user, returning it with the id the database assigned. A unique-name collision maps to
/// [`StorageError::AlreadyExists`].
pub async fn insert_user(user: NewUser, conn: &mut PgConnection) -> Result<User, StorageError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO users (name, password_hash)
            VALUES ($1, $2)
            RETURNING id, name, password_hash, created_at
        "#,
    )
    .bind(&user.name)
    .bind(&user.password_hash)
    .fetch_one(conn)
    .await;
    match result {
        Ok(user) => Ok(user),
        Err(e) if is_unique_violation(&e) => Err(StorageError::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user_by_name(name: &str, conn: &mut PgConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT id, name, password_hash, created_at FROM users WHERE name = $1")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}
