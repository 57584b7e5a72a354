mod repository;

pub use repository::*;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Estimated reading time of a [`Post`].
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Serialize,
    Deserialize,
    Validate,
    sqlx::FromRow,
)]
pub struct ReadTime {
    #[sqlx(rename = "read_time_value")]
    #[validate(range(min = 1, message = "Read time must be positive."))]
    pub value: i32,
    #[sqlx(rename = "read_time_unit")]
    #[validate(length(min = 1, max = 16))]
    pub unit: String,
}

/// Author snapshot embedded in a resource at creation time.
///
/// This is a copy, not a reference: a later display-name change does not
/// propagate here.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct Author {
    #[sqlx(rename = "author_name")]
    pub name: String,
    #[sqlx(rename = "author_avatar")]
    pub avatar: Option<String>,
}

/// Post as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub category: String,
    pub title: String,
    pub cover: String,
    #[sqlx(flatten)]
    pub read_time: ReadTime,
    #[sqlx(flatten)]
    pub author: Author,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Editable fields of a post, shared by the create and update bodies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostContent {
    #[validate(length(
        min = 1,
        max = 64,
        message = "Category must be 1 to 64 characters long."
    ))]
    pub category: String,
    #[validate(length(
        min = 1,
        max = 256,
        message = "Title must be 1 to 256 characters long."
    ))]
    pub title: String,
    #[validate(url(message = "Cover must be a URL."))]
    pub cover: String,
    #[validate(nested)]
    pub read_time: ReadTime,
    #[validate(length(min = 1, message = "Content cannot be empty."))]
    pub content: String,
}
