//! Upload binary objects to the third-party media host.

use std::io::Write;

use cloudinary::upload::{Source::Path, Upload, UploadOptions};
use sha1::{Digest, Sha1};
use tempfile::NamedTempFile;

use crate::config::Media;
use crate::error::{Result, ServerError};

/// Media host manager holding upload credentials.
#[derive(Clone)]
pub struct MediaHost {
    key: String,
    cloud_name: String,
    secret: String,
}

impl MediaHost {
    /// Create a new [`MediaHost`].
    pub fn new(config: &Media) -> Self {
        Self {
            key: config.api_key.clone(),
            cloud_name: config.cloud_name.clone(),
            secret: config.api_secret.clone(),
        }
    }

    /// Upload a buffer and return its retrievable URL.
    ///
    /// The public id is the buffer hash, so re-uploading the same bytes is
    /// idempotent on the host side.
    pub async fn upload(&self, buffer: &[u8]) -> Result<String> {
        let mut hasher = Sha1::new();
        hasher.update(buffer);
        let public_id = hex::encode(hasher.finalize());

        let options = UploadOptions::new().set_public_id(public_id.clone());
        let upload = Upload::new(
            self.key.clone(),
            self.cloud_name.clone(),
            self.secret.clone(),
        );

        // The host SDK consumes a file path, not a buffer.
        let mut temp_file = NamedTempFile::new().map_err(|err| {
            ServerError::internal("cannot create temporary file", err)
        })?;
        temp_file.write_all(buffer).map_err(|err| {
            ServerError::internal("cannot write temporary file", err)
        })?;

        upload
            .image(Path(temp_file.path().to_path_buf()), &options)
            .await
            .map_err(|err| {
                ServerError::internal("media host upload failed", err)
            })?;

        Ok(format!(
            "https://res.cloudinary.com/{}/image/upload/{}",
            self.cloud_name, public_id
        ))
    }
}
