//! Handle database requests.

use sqlx::{Pool, Postgres};

use crate::comment::Comment;
use crate::error::{Result, ServerError};
use crate::post::Author;

const COLUMNS: &str =
    "id, post_id, author_name, author_avatar, content, created_at";

#[derive(Clone)]
pub struct CommentRepository {
    pool: Pool<Postgres>,
}

impl CommentRepository {
    /// Create a new [`CommentRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List the comments of a post, oldest first.
    pub async fn find_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let query = format!(
            "SELECT {COLUMNS} FROM comments WHERE post_id = $1
                ORDER BY created_at"
        );

        Ok(sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Find a comment using `id` field.
    pub async fn find_by_id(&self, comment_id: i64) -> Result<Comment> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1");

        sqlx::query_as::<_, Comment>(&query)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound)
    }

    /// Insert a comment with its author snapshot.
    ///
    /// An unknown post surfaces as [`ServerError::NotFound`] through the
    /// foreign key.
    pub async fn insert(
        &self,
        post_id: i64,
        author: &Author,
        content: &str,
    ) -> Result<Comment> {
        let query = format!(
            r#"INSERT INTO comments (post_id, author_name, author_avatar, content)
                VALUES ($1, $2, $3, $4)
                RETURNING {COLUMNS}"#
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .bind(&author.name)
            .bind(&author.avatar)
            .bind(content)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if err
                    .as_database_error()
                    .is_some_and(|db| db.is_foreign_key_violation())
                {
                    ServerError::NotFound
                } else {
                    ServerError::Sql(err)
                }
            })
    }

    /// Delete a comment.
    pub async fn delete(&self, comment_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::NotFound);
        }

        Ok(())
    }
}
