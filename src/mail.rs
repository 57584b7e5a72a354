//! Send emails to user for important updates.

use reqwest::Client;
use serde::Serialize;

use crate::config::Mail;
use crate::error::Result;

const DEFAULT_API_URL: &str = "https://api.brevo.com/v3";
const API_KEY_HEADER: &str = "api-key";

/// Transactional email templates list.
#[derive(Debug)]
pub enum Template {
    /// Greet a freshly registered user.
    Welcome,
    /// Alert an author that a post received a comment.
    CommentAlert {
        /// Title of the commented post.
        title: String,
        /// Display name of the commenter.
        author: String,
    },
}

impl Template {
    fn subject(&self) -> String {
        match self {
            Template::Welcome => "Welcome aboard!".to_owned(),
            Template::CommentAlert { title, .. } => {
                format!("New comment on \"{title}\"")
            },
        }
    }

    fn html(&self, username: &str) -> String {
        match self {
            Template::Welcome => format!(
                "<h1>Hi {username},</h1>\
                <p>Your account is ready. Happy writing!</p>"
            ),
            Template::CommentAlert { title, author } => format!(
                "<h1>Hi {username},</h1>\
                <p>{author} commented on your post \"{title}\".</p>"
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmail<'a> {
    sender: Address<'a>,
    to: [Address<'a>; 1],
    subject: String,
    html_content: String,
}

/// Transactional email manager.
///
/// Without configuration every send is a logged no-op; mail never gates a
/// request.
#[derive(Debug, Clone, Default)]
pub struct MailManager {
    api_url: String,
    sender: String,
    api_key: Option<String>,
    client: Client,
}

impl MailManager {
    /// Create a new [`MailManager`].
    pub fn new(config: &Mail) -> Self {
        Self {
            api_url: config
                .api_url
                .clone()
                .unwrap_or(DEFAULT_API_URL.to_string()),
            sender: config.sender.clone(),
            api_key: Some(config.api_key.clone()),
            client: Client::new(),
        }
    }

    /// Send a templated email to a recipient.
    pub async fn send(
        &self,
        template: Template,
        to: &str,
        username: &str,
    ) -> Result<()> {
        let Some(api_key) = &self.api_key else {
            tracing::debug!(?template, "mail disabled, event dropped");
            return Ok(());
        };

        let payload = SendEmail {
            sender: Address {
                email: &self.sender,
            },
            to: [Address { email: to }],
            subject: template.subject(),
            html_content: template.html(username),
        };

        self.client
            .post(format!("{}/smtp/email", self.api_url))
            .header(API_KEY_HEADER, api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        tracing::trace!(?template, "email sent");

        Ok(())
    }
}
