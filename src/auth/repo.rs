use sqlx::SqlitePool;

use crate::auth::repo_types::User;
use crate::error::RepoError;

impl User {
    /// Find a user by (already normalized) email.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password
            FROM Users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user. A duplicate email surfaces as `RepoError::EmailTaken`.
    pub async fn create(db: &SqlitePool, email: &str, password_hash: &str) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO Users (email, password)
            VALUES (?, ?)
            RETURNING id, email, password
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => RepoError::EmailTaken,
            other => RepoError::Database(other),
        })
    }
}
