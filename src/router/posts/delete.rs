//! Delete a post and its comments.

use axum::Extension;
use axum::extract::{Path, State};

use crate::AppState;
use crate::error::Result;
use crate::post::PostRepository;
use crate::router::authorize_ownership;
use crate::user::User;

/// Handler to delete a post. Author only.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<()> {
    let repo = PostRepository::new(state.db.postgres.clone());

    let post = repo.find_by_id(id).await?;
    authorize_ownership(&user, &post.author.name)?;

    repo.delete(id).await
}
