//! Push media files to the third-party host.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

use crate::error::{Result, ServerError};
use crate::AppState;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Retrievable URL of the uploaded object.
    pub url: String,
}

fn missing_file() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "file",
        ValidationError::new("file")
            .with_message("Missing multipart 'file' field.".into()),
    );
    errors
}

/// Handler to upload a file and get its public URL back.
pub async fn handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Response>)> {
    let Some(media) = &state.media else {
        return Err(ServerError::Internal {
            details: "media host is not configured".into(),
            source: None,
        });
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::ParsingForm(Box::new(err)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let buffer = field
            .bytes()
            .await
            .map_err(|err| ServerError::ParsingForm(Box::new(err)))?;
        let url = media.upload(&buffer).await?;

        return Ok((StatusCode::CREATED, Json(Response { url })));
    }

    Err(missing_file().into())
}
