//! Delegated login against the Google identity provider.
//!
//! The handshake is two awaited calls: the authorization code is exchanged
//! at the token endpoint, then the userinfo endpoint yields a verified
//! profile. No partial account is ever created here.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::OAuth;
use crate::error::Result;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPES: &str = "openid email profile";

/// Verified profile returned by the provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Stable subject identifier assigned by the provider.
    pub sub: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// External identity provider client.
#[derive(Clone, Debug)]
pub struct Provider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    client: Client,
}

impl Provider {
    /// Create a new [`Provider`].
    pub fn new(config: &OAuth) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            client: Client::new(),
        }
    }

    /// Consent page URL the client is redirected to.
    pub fn authorize_url(&self, state: &str) -> Result<Url> {
        let mut url = Url::parse(AUTHORIZE_URL)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPES)
            .append_pair("state", state);

        Ok(url)
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let params = [
            ("code", code),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("redirect_uri", &self.redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await?
            .error_for_status()?
            .json::<TokenResponse>()
            .await?;

        Ok(response.access_token)
    }

    /// Fetch the profile asserted by an access token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<Profile> {
        Ok(self
            .client
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json::<Profile>()
            .await?)
    }
}
