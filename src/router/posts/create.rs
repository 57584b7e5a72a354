use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::AppState;
use crate::error::Result;
use crate::post::{Author, Post, PostContent, PostRepository};
use crate::router::Valid;
use crate::user::User;

/// Handler to publish a post.
///
/// The author snapshot is taken from the authenticated requester, never
/// from the body.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Valid(body): Valid<PostContent>,
) -> Result<(StatusCode, Json<Post>)> {
    let author = Author {
        name: user.username,
        avatar: user.avatar,
    };
    let post = PostRepository::new(state.db.postgres.clone())
        .insert(&body, &author)
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}
