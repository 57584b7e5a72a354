//! Public post reads. No authentication here.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::AppState;
use crate::error::Result;
use crate::post::{Post, PostRepository};

#[derive(Debug, Default, Deserialize)]
pub struct Filters {
    title: Option<String>,
    author: Option<String>,
}

/// List posts, optionally filtered by title or author substring.
pub async fn all(
    State(state): State<AppState>,
    Query(filters): Query<Filters>,
) -> Result<Json<Vec<Post>>> {
    let posts = PostRepository::new(state.db.postgres.clone())
        .find(filters.title.as_deref(), filters.author.as_deref())
        .await?;

    Ok(Json(posts))
}

/// Get a single post.
pub async fn one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>> {
    let post =
        PostRepository::new(state.db.postgres.clone()).find_by_id(id).await?;

    Ok(Json(post))
}

/// List every post recorded under an author name.
pub async fn by_author(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Post>>> {
    let posts = PostRepository::new(state.db.postgres.clone())
        .find_by_author(&name)
        .await?;

    Ok(Json(posts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use sqlx::{Pool, Postgres};

    async fn list(app: axum::Router, path: &str) -> Vec<Post> {
        let response =
            make_request(None, app, Method::GET, path, String::default())
                .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[sqlx::test(fixtures("../../../fixtures/posts.sql"))]
    async fn test_list_and_filter(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let posts = list(app.clone(), "/posts").await;
        assert_eq!(posts.len(), 3);

        // Title filter is a case-insensitive substring match.
        let posts = list(app.clone(), "/posts?title=BORROW").await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Understanding the borrow checker");

        let posts = list(app.clone(), "/posts?author=noa").await;
        assert_eq!(posts.len(), 2);

        let posts = list(app, "/posts?title=nothing-matches").await;
        assert!(posts.is_empty());
    }

    #[sqlx::test(fixtures("../../../fixtures/posts.sql"))]
    async fn test_get_one(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let posts = list(app.clone(), "/posts").await;
        let path = format!("/posts/{}", posts[0].id);
        let response = make_request(
            None,
            app.clone(),
            Method::GET,
            &path,
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = make_request(
            None,
            app,
            Method::GET,
            "/posts/99999",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(fixtures("../../../fixtures/posts.sql"))]
    async fn test_by_author_is_exact(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let posts = list(app.clone(), "/authors/noa/posts").await;
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.author.name == "noa"));

        // Exact match only; no substring expansion here.
        let posts = list(app, "/authors/no/posts").await;
        assert!(posts.is_empty());
    }
}
