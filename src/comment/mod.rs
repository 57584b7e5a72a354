mod repository;

pub use repository::*;

use serde::{Deserialize, Serialize};

use crate::post::Author;

/// Comment as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    #[sqlx(flatten)]
    pub author: Author,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
