//! Current account summary.

use axum::{Extension, Json};

use crate::user::User;

/// Return the identity resolved by the authorization guard.
pub async fn handler(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    #[sqlx::test]
    async fn test_me_requires_token(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response =
            make_request(None, app.clone(), Method::GET, "/me", String::default())
                .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = make_request(
            Some("not-a-token"),
            app,
            Method::GET,
            "/me",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_me_returns_account(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/register",
            json!({
                "email": "noa@example.com",
                "password": "secret123",
                "name": "noa",
            })
            .to_string(),
        )
        .await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let created: router::create::Response =
            serde_json::from_slice(&body).unwrap();

        let response = make_request(
            Some(&created.token),
            app,
            Method::GET,
            "/me",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let me: user::User = serde_json::from_slice(&body).unwrap();
        assert_eq!(me.id, created.user.id);
        assert_eq!(me.username, "noa");
    }
}
