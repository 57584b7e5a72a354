use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::oauth::Profile;
use crate::user::{User, UserBuilder, UserRepository};

/// Outcome of an external identity lookup.
///
/// An unseen external id never creates an account silently; the caller
/// receives the staged profile back and drives registration explicitly.
#[derive(Clone, Debug)]
pub enum ExternalLookup {
    /// The external id is already bound to an account.
    Linked(User),
    /// No account yet; registration must be completed with this profile.
    NeedsRegistration(Profile),
}

/// User manager.
#[derive(Clone)]
pub struct UserService {
    pub repo: UserRepository,
    crypto: Arc<PasswordManager>,
}

impl UserService {
    /// Create a new [`UserService`].
    pub fn new(pool: Pool<Postgres>, crypto: Arc<PasswordManager>) -> Self {
        Self {
            repo: UserRepository::new(pool),
            crypto,
        }
    }

    /// Register an account with a password credential.
    ///
    /// The raw secret is hashed before anything is persisted.
    pub async fn register_local(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<User> {
        let phc_hash = self.crypto.hash_password(password).map_err(|err| {
            ServerError::internal("cannot hash password", err)
        })?;

        let user = UserBuilder::new()
            .email(email)
            .username(username)
            .password(phc_hash)
            .build();

        self.repo.insert(&user).await?;
        Ok(user)
    }

    /// Check a password credential.
    ///
    /// An unknown email, an account without password (external identity
    /// only) and a wrong password are indistinguishable from the outside.
    pub async fn verify_local(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User> {
        let user = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or(ServerError::InvalidCredentials)?;

        let phc_hash =
            user.password.as_deref().ok_or(ServerError::InvalidCredentials)?;
        self.crypto.verify_password(password, phc_hash)?;

        Ok(user)
    }

    /// Look up an external identity, or stage its profile for registration.
    pub async fn find_or_flag_external(
        &self,
        profile: Profile,
    ) -> Result<ExternalLookup> {
        match self.repo.find_by_google_id(&profile.sub).await? {
            Some(user) => Ok(ExternalLookup::Linked(user)),
            None => Ok(ExternalLookup::NeedsRegistration(profile)),
        }
    }

    /// Create an account from a previously staged external profile.
    pub async fn complete_external(&self, profile: Profile) -> Result<User> {
        let user = UserBuilder::new()
            .email(profile.email)
            .username(profile.name)
            .google_id(profile.sub)
            .avatar(profile.picture)
            .build();

        self.repo.insert(&user).await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::{Pool, Postgres};

    use super::*;
    use crate::config::Argon2 as ArgonConfig;

    fn service(pool: Pool<Postgres>) -> UserService {
        let crypto = Arc::new(
            PasswordManager::new(Some(ArgonConfig {
                memory_cost: 8192,
                iterations: 1,
                parallelism: 1,
                hash_length: 32,
            }))
            .unwrap(),
        );
        UserService::new(pool, crypto)
    }

    fn profile(sub: &str) -> Profile {
        Profile {
            sub: sub.to_owned(),
            email: format!("{sub}@example.com"),
            name: sub.to_owned(),
            picture: None,
        }
    }

    #[sqlx::test]
    async fn test_register_then_verify(pool: Pool<Postgres>) {
        let service = service(pool);

        let user = service
            .register_local("Alice@example.com", "secret123", "alice")
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert!(user.password.as_deref().unwrap().starts_with("$argon2id$"));

        let found = service
            .verify_local("alice@example.com", "secret123")
            .await
            .unwrap();
        assert_eq!(found.id, user.id);
    }

    #[sqlx::test]
    async fn test_verify_failures_are_uniform(pool: Pool<Postgres>) {
        let service = service(pool);

        service
            .register_local("alice@example.com", "secret123", "alice")
            .await
            .unwrap();

        // Wrong password and unknown email yield the same error, there is
        // no oracle for account existence.
        let wrong_password = service
            .verify_local("alice@example.com", "wrong-password")
            .await
            .unwrap_err();
        let unknown_email = service
            .verify_local("nobody@example.com", "secret123")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ServerError::InvalidCredentials));
        assert!(matches!(unknown_email, ServerError::InvalidCredentials));
    }

    #[sqlx::test]
    async fn test_duplicate_email_rejected(pool: Pool<Postgres>) {
        let service = service(pool);

        service
            .register_local("alice@example.com", "secret123", "alice")
            .await
            .unwrap();
        let err = service
            .register_local("ALICE@example.com", "other-secret", "impostor")
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::DuplicateEmail));
    }

    #[sqlx::test]
    async fn test_external_unseen_flags_registration(pool: Pool<Postgres>) {
        let service = service(pool);

        let lookup = service
            .find_or_flag_external(profile("108437624941962315543"))
            .await
            .unwrap();

        let ExternalLookup::NeedsRegistration(staged) = lookup else {
            panic!("unseen external id must not resolve to an account");
        };
        assert_eq!(staged.sub, "108437624941962315543");

        // The lookup alone must not have created anything.
        assert!(
            service
                .repo
                .find_by_google_id("108437624941962315543")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[sqlx::test]
    async fn test_external_known_links_account(pool: Pool<Postgres>) {
        let service = service(pool);

        let created = service
            .complete_external(profile("108437624941962315543"))
            .await
            .unwrap();
        assert!(created.password.is_none());

        let lookup = service
            .find_or_flag_external(profile("108437624941962315543"))
            .await
            .unwrap();
        let ExternalLookup::Linked(user) = lookup else {
            panic!("known external id must link to its account");
        };
        assert_eq!(user.id, created.id);
    }

    #[sqlx::test]
    async fn test_external_account_has_no_password_login(
        pool: Pool<Postgres>,
    ) {
        let service = service(pool);

        let user = service
            .complete_external(profile("108437624941962315543"))
            .await
            .unwrap();

        let err = service
            .verify_local(&user.email, "any-password")
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidCredentials));
    }
}
