//! Handle database requests.

use sqlx::{Pool, Postgres};

use crate::error::{Result, ServerError};
use crate::post::{Author, Post, PostContent};

const COLUMNS: &str = "id, category, title, cover, read_time_value, \
    read_time_unit, author_name, author_avatar, content, created_at";

#[derive(Clone)]
pub struct PostRepository {
    pool: Pool<Postgres>,
}

impl PostRepository {
    /// Create a new [`PostRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List posts, newest first, optionally filtered by a case-insensitive
    /// title or author substring.
    pub async fn find(
        &self,
        title: Option<&str>,
        author: Option<&str>,
    ) -> Result<Vec<Post>> {
        let query = format!(
            r#"SELECT {COLUMNS} FROM posts
                WHERE ($1::TEXT IS NULL OR title ILIKE '%' || $1 || '%')
                AND ($2::TEXT IS NULL OR author_name ILIKE '%' || $2 || '%')
                ORDER BY created_at DESC"#
        );

        Ok(sqlx::query_as::<_, Post>(&query)
            .bind(title)
            .bind(author)
            .fetch_all(&self.pool)
            .await?)
    }

    /// List all posts recorded under an exact author name.
    pub async fn find_by_author(&self, author: &str) -> Result<Vec<Post>> {
        let query = format!(
            "SELECT {COLUMNS} FROM posts WHERE author_name = $1
                ORDER BY created_at DESC"
        );

        Ok(sqlx::query_as::<_, Post>(&query)
            .bind(author)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Find a post using `id` field.
    pub async fn find_by_id(&self, post_id: i64) -> Result<Post> {
        let query = format!("SELECT {COLUMNS} FROM posts WHERE id = $1");

        sqlx::query_as::<_, Post>(&query)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound)
    }

    /// Insert a post with its author snapshot.
    pub async fn insert(
        &self,
        content: &PostContent,
        author: &Author,
    ) -> Result<Post> {
        let query = format!(
            r#"INSERT INTO posts (category, title, cover, read_time_value,
                read_time_unit, author_name, author_avatar, content)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING {COLUMNS}"#
        );

        Ok(sqlx::query_as::<_, Post>(&query)
            .bind(&content.category)
            .bind(&content.title)
            .bind(&content.cover)
            .bind(content.read_time.value)
            .bind(&content.read_time.unit)
            .bind(&author.name)
            .bind(&author.avatar)
            .bind(&content.content)
            .fetch_one(&self.pool)
            .await?)
    }

    /// Update the editable fields of a post. The author snapshot is frozen.
    pub async fn update(
        &self,
        post_id: i64,
        content: &PostContent,
    ) -> Result<Post> {
        let query = format!(
            r#"UPDATE posts
                SET category = $1, title = $2, cover = $3,
                    read_time_value = $4, read_time_unit = $5, content = $6
                WHERE id = $7
                RETURNING {COLUMNS}"#
        );

        sqlx::query_as::<_, Post>(&query)
            .bind(&content.category)
            .bind(&content.title)
            .bind(&content.cover)
            .bind(content.read_time.value)
            .bind(&content.read_time.unit)
            .bind(&content.content)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound)
    }

    /// Delete a post. Its comments go with it.
    pub async fn delete(&self, post_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::NotFound);
        }

        Ok(())
    }
}
