//! HTTP surface: routes, body validation and the authorization guard.

pub mod comments;
pub mod create;
pub mod login;
pub mod me;
pub mod oauth;
pub mod posts;
pub mod status;
pub mod upload;

use axum::Json;
use axum::extract::{FromRequest, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::user::{User, UserRepository};
use crate::{AppState, ServerError};

const BEARER: &str = "Bearer ";

/// Custom middleware for authentification.
///
/// Verifies the bearer token, resolves its account and attaches it to the
/// request; guarded handlers never run without a valid identity.
pub async fn guard(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ServerError::Unauthorized)?;
    let token = token.strip_prefix(BEARER).unwrap_or(token);

    let claims = state.token.decode(token)?;
    let user = UserRepository::new(state.db.postgres.clone())
        .find_by_id(&claims.sub)
        .await
        .map_err(|_| ServerError::Unauthorized)?;

    req.extensions_mut().insert::<User>(user);
    Ok(next.run(req).await)
}

/// Ownership rule for authored resources.
///
/// The requester's current display name is compared to the author name
/// recorded on the resource, exact and case-sensitive.
pub fn authorize_ownership(
    user: &User,
    author_name: &str,
) -> Result<(), ServerError> {
    if user.username != author_name {
        return Err(ServerError::Forbidden);
    }

    Ok(())
}

/// JSON body extractor running schema validation before any handler code.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Request helpers shared by handler tests.
#[cfg(test)]
pub(crate) mod testing {
    use axum::Router;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;

    use crate::make_request;
    use crate::post::Post;

    /// Register an account and return its session token.
    pub(crate) async fn register(
        app: Router,
        email: &str,
        name: &str,
    ) -> String {
        let response = make_request(
            None,
            app,
            Method::POST,
            "/register",
            json!({ "email": email, "password": "secret123", "name": name })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: super::create::Response =
            serde_json::from_slice(&body).unwrap();
        body.token
    }

    pub(crate) fn post_body() -> String {
        json!({
            "category": "rust",
            "title": "Understanding the borrow checker",
            "cover": "https://res.example.com/cover.webp",
            "readTime": { "value": 7, "unit": "min" },
            "content": "Ownership is a compile-time contract...",
        })
        .to_string()
    }

    /// Publish a post as the token owner and return it.
    pub(crate) async fn publish(app: Router, token: &str) -> Post {
        let response = make_request(
            Some(token),
            app,
            Method::POST,
            "/posts",
            post_body(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }
}

#[cfg(test)]
pub(crate) fn state(pool: sqlx::PgPool) -> AppState {
    use std::sync::Arc;

    use crate::config::{Argon2, Configuration};
    use crate::crypto::PasswordManager;
    use crate::database::Database;
    use crate::mail::MailManager;
    use crate::token::TokenManager;

    let crypto = PasswordManager::new(Some(Argon2 {
        memory_cost: 8192,
        iterations: 1,
        parallelism: 1,
        hash_length: 32,
    }))
    .expect("cannot build password manager");

    AppState {
        config: Arc::new(Configuration::default()),
        db: Database { postgres: pool },
        crypto: Arc::new(crypto),
        token: TokenManager::new("http://localhost", "test-secret", None),
        mail: MailManager::default(),
        oauth: None,
        media: None,
    }
}
