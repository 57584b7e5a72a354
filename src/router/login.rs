use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::router::create::{Response, TOKEN_TYPE};
use crate::user::UserService;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty."))]
    pub password: String,
}

/// Handler to login with a password credential.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let service =
        UserService::new(state.db.postgres.clone(), state.crypto.clone());
    let user = service.verify_local(&body.email, &body.password).await?;

    let token = state.token.create(&user.id)?;

    Ok(Json(Response {
        token_type: TOKEN_TYPE.to_owned(),
        token,
        user,
    }))
}
