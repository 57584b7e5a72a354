//! Handle database requests.

use sqlx::{Pool, Postgres};

use crate::error::{Result, ServerError};
use crate::user::User;

const COLUMNS: &str =
    "id, username, email, password, google_id, avatar, created_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`User`] into database.
    ///
    /// Email uniqueness is enforced by the store; when two registrations
    /// race, the loser observes [`ServerError::DuplicateEmail`].
    pub async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO users (id, username, email, password, google_id, avatar)
                VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.google_id)
        .bind(&user.avatar)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if err
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                ServerError::DuplicateEmail
            } else {
                ServerError::Sql(err)
            }
        })?;

        Ok(())
    }

    /// Find a user using `id` field.
    pub async fn find_by_id(&self, user_id: &str) -> Result<User> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound)
    }

    /// Find a user using `email` field. Lookup is lowercase.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Find a user using `google_id` field.
    pub async fn find_by_google_id(
        &self,
        google_id: &str,
    ) -> Result<Option<User>> {
        let query =
            format!("SELECT {COLUMNS} FROM users WHERE google_id = $1");

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(google_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Find the oldest user carrying `username`.
    ///
    /// Display names are not unique; used for best-effort notifications
    /// only, never for authentication.
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE username = $1
                ORDER BY created_at LIMIT 1"
        );

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::{Pool, Postgres};

    use super::*;

    #[sqlx::test(fixtures("../../fixtures/users.sql"))]
    async fn test_lookups(pool: Pool<Postgres>) {
        let repo = UserRepository::new(pool);

        let user = repo.find_by_id("9f2d1c3a4b5e6f70").await.unwrap();
        assert_eq!(user.username, "noa");
        assert!(user.password.is_none());

        // Email lookups are case-insensitive.
        let user = repo.find_by_email("NOA@example.com").await.unwrap();
        assert_eq!(user.unwrap().id, "9f2d1c3a4b5e6f70");

        let user = repo
            .find_by_google_id("204857291038475610293")
            .await
            .unwrap();
        assert_eq!(user.unwrap().username, "liv");

        let user = repo.find_by_username("liv").await.unwrap();
        assert_eq!(user.unwrap().id, "0a1b2c3d4e5f6071");

        assert!(matches!(
            repo.find_by_id("unknown").await,
            Err(ServerError::NotFound)
        ));
        assert!(repo.find_by_email("ghost@example.com").await.unwrap().is_none());
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql"))]
    async fn test_insert_duplicate_google_id(pool: Pool<Postgres>) {
        let repo = UserRepository::new(pool);

        let user = crate::user::UserBuilder::new()
            .email("other@example.com")
            .username("other")
            .google_id("108437624941962315543")
            .build();

        assert!(matches!(
            repo.insert(&user).await,
            Err(ServerError::DuplicateEmail)
        ));
    }
}
