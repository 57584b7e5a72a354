use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::mail::Template::Welcome;
use crate::router::Valid;
use crate::user::{User, UserService};

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub password: String,
    #[validate(length(
        min = 2,
        max = 50,
        message = "Name must be 2 to 50 characters long."
    ))]
    pub name: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub token_type: String,
    pub token: String,
    pub user: User,
}

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Response>)> {
    let service =
        UserService::new(state.db.postgres.clone(), state.crypto.clone());
    let user = service
        .register_local(&body.email, &body.password, &body.name)
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
