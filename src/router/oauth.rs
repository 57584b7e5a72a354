//! Delegated login entry points.
//!
//! `redirect` starts the handshake, `callback` resolves it to an existing
//! account or stages the profile for registration, `complete` finishes the
//! registration branch.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use crate::error::{Result, ServerError};
use crate::mail::Template::Welcome;
use crate::oauth::{Profile, Provider};
use crate::router::Valid;
use crate::router::create::{Response, TOKEN_TYPE};
use crate::user::{ExternalLookup, UserService};
use crate::AppState;

/// Subject claim reserved for the handshake state assertion.
const STATE_SUBJECT: &str = "oauth:state";

const SUCCESS_PATH: &str = "oauth-success";
const REGISTER_PATH: &str = "register";

fn provider(state: &AppState) -> Result<&Provider> {
    state.oauth.as_ref().ok_or(ServerError::NotFound)
}

/// Redirect the client to the provider's consent page.
pub async fn redirect(State(state): State<AppState>) -> Result<Redirect> {
    let assertion = state.token.create(STATE_SUBJECT)?;
    let url = provider(&state)?.authorize_url(&assertion)?;

    Ok(Redirect::temporary(url.as_str()))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: String,
    state: String,
}

/// Handle the provider's redirect back.
///
/// Errors anywhere in the exchange abort the handshake; no partial account
/// is created.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect> {
    // The state assertion went out with the initial redirect; anything
    // else is a forged or replayed callback.
    let claims = state.token.decode(&query.state)?;
    if claims.sub != STATE_SUBJECT {
        return Err(ServerError::InvalidToken);
    }

    let provider = provider(&state)?;
    let access_token = provider.exchange_code(&query.code).await?;
    let profile = provider.fetch_profile(&access_token).await?;

    let service =
        UserService::new(state.db.postgres.clone(), state.crypto.clone());

    let mut url = Url::parse(&state.config.frontend_url)?;
    match service.find_or_flag_external(profile).await? {
        ExternalLookup::Linked(user) => {
            let token = state.token.create(&user.id)?;
            url = url.join(SUCCESS_PATH)?;
            url.query_pairs_mut()
                .append_pair("token", &token)
                .append_pair("user", &serde_json::to_string(&user)?);
        },
        ExternalLookup::NeedsRegistration(profile) => {
            url = url.join(REGISTER_PATH)?;
            url.query_pairs_mut()
                .append_pair("profile", &serde_json::to_string(&profile)?);
        },
    }

    Ok(Redirect::temporary(url.as_str()))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(min = 1, message = "Missing external identifier."))]
    pub google_id: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 2,
        max = 50,
        message = "Name must be 2 to 50 characters long."
    ))]
    pub name: String,
    #[validate(url(message = "Avatar must be a URL."))]
    pub avatar: Option<String>,
}

/// Create the account staged by a `NeedsRegistration` callback.
pub async fn complete(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Response>)> {
    let service =
        UserService::new(state.db.postgres.clone(), state.crypto.clone());
    let user = service
        .complete_external(Profile {
            sub: body.google_id,
            email: body.email,
            name: body.name,
            picture: body.avatar,
        })
        .await?;

    // Best effort, registration already happened.
    if let Err(err) =
        state.mail.send(Welcome, &user.email, &user.username).await
    {
        tracing::error!(
            user_id = user.id,
            error = err.to_string(),
            "welcome email not sent"
        );
    }

    let token = state.token.create(&user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(Response {
            token_type: TOKEN_TYPE.to_owned(),
            token,
            user,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    #[sqlx::test]
    async fn test_redirect_without_provider(pool: Pool<Postgres>) {
        // No `oauth` section configured: the handshake routes do not exist.
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::GET,
            "/auth/google",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_complete_creates_account(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/auth/google/complete",
            json!({
                "googleId": "108437624941962315543",
                "email": "noa@example.com",
                "name": "noa",
                "avatar": "https://lh3.example.com/photo.jpg",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.user.username, "noa");
        assert_eq!(
            state.token.decode(&body.token).unwrap().sub,
            body.user.id
        );

        // The new account is immediately usable on guarded routes.
        let response = make_request(
            Some(&body.token),
            app,
            Method::GET,
            "/me",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[sqlx::test]
    async fn test_complete_rejects_duplicate_email(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let req_body = json!({
            "googleId": "108437624941962315543",
            "email": "noa@example.com",
            "name": "noa",
        })
        .to_string();

        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/auth/google/complete",
            req_body.clone(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/auth/google/complete",
            req_body,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
