//! Comments-related HTTP API.

use axum::extract::{Path, State};
use axum::routing::delete;
use axum::{Extension, Json, Router, middleware};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::comment::{Comment, CommentRepository};
use crate::error::Result;
use crate::mail::Template;
use crate::post::{Author, PostRepository};
use crate::router::{Valid, authorize_ownership};
use crate::user::{User, UserRepository};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `DELETE /comments/:ID` goes to `remove`. Author only.
        .route("/comments/{id}", delete(remove))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::router::guard,
        ))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Comment must be 1 to 2000 characters long."
    ))]
    pub content: String,
}

/// List the comments of a post.
pub(super) async fn list(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<Comment>>> {
    // 404 on unknown posts rather than an empty list.
    PostRepository::new(state.db.postgres.clone())
        .find_by_id(post_id)
        .await?;

    let comments = CommentRepository::new(state.db.postgres.clone())
        .find_by_post(post_id)
        .await?;

    Ok(Json(comments))
}

/// Comment on a post.
pub(super) async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(post_id): Path<i64>,
    Valid(body): Valid<Body>,
) -> Result<(axum::http::StatusCode, Json<Comment>)> {
    let post = PostRepository::new(state.db.postgres.clone())
        .find_by_id(post_id)
        .await?;

    let author = Author {
        name: user.username,
        avatar: user.avatar,
    };
    let comment = CommentRepository::new(state.db.postgres.clone())
        .insert(post_id, &author, &body.content)
        .await?;

    notify_post_author(&state, &post.author.name, &post.title, &author.name)
        .await;

    Ok((axum::http::StatusCode::CREATED, Json(comment)))
}

/// Tell the post author someone commented. Best effort only.
async fn notify_post_author(
    state: &AppState,
    author_name: &str,
    post_title: &str,
    commenter: &str,
) {
    // The author snapshot carries a display name, not an account id;
    // resolve it back to an account if one still matches.
    let recipient = match UserRepository::new(state.db.postgres.clone())
        .find_by_username(author_name)
        .await
    {
        Ok(Some(user)) if user.username != commenter => user,
        Ok(_) => return,
        Err(err) => {
            tracing::error!(
                error = err.to_string(),
                "comment alert recipient lookup failed"
            );
            return;
        },
    };

    if let Err(err) = state
        .mail
        .send(
            Template::CommentAlert {
                title: post_title.to_owned(),
                author: commenter.to_owned(),
            },
            &recipient.email,
            &recipient.username,
        )
        .await
    {
        tracing::error!(
            error = err.to_string(),
            "comment alert email not sent"
        );
    }
}

/// Delete a comment. Author only.
async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<()> {
    let repo = CommentRepository::new(state.db.postgres.clone());

    let comment = repo.find_by_id(id).await?;
    authorize_ownership(&user, &comment.author.name)?;

    repo.delete(id).await
}

#[cfg(test)]
mod tests {
    use crate::router::testing::{publish, register};
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    async fn comment(
        app: axum::Router,
        token: &str,
        post_id: i64,
    ) -> comment::Comment {
        let response = make_request(
            Some(token),
            app,
            Method::POST,
            &format!("/posts/{post_id}/comments"),
            json!({ "content": "Great write-up!" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[sqlx::test]
    async fn test_comment_lifecycle(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);
        let noa = register(app.clone(), "noa@example.com", "noa").await;
        let liv = register(app.clone(), "liv@example.com", "liv").await;
        let post = publish(app.clone(), &noa).await;

        let created = comment(app.clone(), &liv, post.id).await;
        assert_eq!(created.post_id, post.id);
        assert_eq!(created.author.name, "liv");

        // Everyone can read them.
        let response = make_request(
            None,
            app.clone(),
            Method::GET,
            &format!("/posts/{}/comments", post.id),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let comments: Vec<comment::Comment> =
            serde_json::from_slice(&body).unwrap();
        assert_eq!(comments.len(), 1);

        // Only the commenter can delete it.
        let path = format!("/comments/{}", created.id);
        let response = make_request(
            Some(&noa),
            app.clone(),
            Method::DELETE,
            &path,
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = make_request(
            Some(&liv),
            app,
            Method::DELETE,
            &path,
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[sqlx::test]
    async fn test_comment_on_missing_post(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);
        let noa = register(app.clone(), "noa@example.com", "noa").await;

        let response = make_request(
            Some(&noa),
            app,
            Method::POST,
            "/posts/99999/comments",
            json!({ "content": "hello?" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_list_comments_of_missing_post(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::GET,
            "/posts/99999/comments",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
