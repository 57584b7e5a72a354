use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::Result;
use crate::post::{Post, PostContent, PostRepository};
use crate::router::{Valid, authorize_ownership};
use crate::user::User;

/// Handler to edit a post. Author only; the snapshot stays frozen.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Valid(body): Valid<PostContent>,
) -> Result<Json<Post>> {
    let repo = PostRepository::new(state.db.postgres.clone());

    let post = repo.find_by_id(id).await?;
    authorize_ownership(&user, &post.author.name)?;

    let post = repo.update(id, &body).await?;
    Ok(Json(post))
}
