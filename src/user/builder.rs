//! Typed builder for User.

use crate::user::User;

/// [`User`] builder.
///
/// An email is required before [`UserBuilder::build`] exists; the account
/// identifier is generated here and never changes afterwards.
#[derive(Debug, Clone)]
pub struct UserBuilder<Email> {
    email: Email,
    username: String,
    password: Option<String>,
    google_id: Option<String>,
    avatar: Option<String>,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

impl UserBuilder<Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            email: Missing,
            username: String::default(),
            password: None,
            google_id: None,
            avatar: None,
        }
    }

    /// Update `email` field on [`UserBuilder`].
    ///
    /// Emails are compared case-insensitively, so they are stored lowercase.
    pub fn email(
        self,
        email: impl Into<String>,
    ) -> UserBuilder<Present<String>> {
        UserBuilder {
            email: Present(email.into().to_lowercase()),
            username: self.username,
            password: self.password,
            google_id: self.google_id,
            avatar: self.avatar,
        }
    }
}

impl Default for UserBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Email> UserBuilder<Email> {
    /// Update `username` field on [`UserBuilder`].
    pub fn username(mut self, username: impl ToString) -> Self {
        self.username = username.to_string();
        self
    }

    /// Update `password` field on [`UserBuilder`].
    ///
    /// Expects an already-hashed PHC string, never a raw secret.
    pub fn password(mut self, phc_hash: impl ToString) -> Self {
        self.password = Some(phc_hash.to_string());
        self
    }

    /// Update `google_id` field on [`UserBuilder`].
    pub fn google_id(mut self, google_id: impl ToString) -> Self {
        self.google_id = Some(google_id.to_string());
        self
    }

    /// Update `avatar` field on [`UserBuilder`].
    pub fn avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }
}

impl UserBuilder<Present<String>> {
    /// Build a [`User`] with a fresh identifier.
    pub fn build(self) -> User {
        User {
            id: crate::user::generate_id(),
            username: self.username,
            email: self.email.0,
            password: self.password,
            google_id: self.google_id,
            avatar: self.avatar,
            created_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_lowercased() {
        let user = UserBuilder::new()
            .email("Alice@Example.COM")
            .username("alice")
            .password("$argon2id$stub")
            .build();

        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.username, "alice");
        assert!(user.google_id.is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = UserBuilder::new().email("a@example.com").build();
        let b = UserBuilder::new().email("a@example.com").build();
        assert_ne!(a.id, b.id);
    }
}
