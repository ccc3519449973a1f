//! Password authentication service.
//!
//! Hashes are Argon2id PHC strings. Hashing and verification run on the
//! blocking thread pool so a login never stalls other requests.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use snippetbox_core::{Email, UserId};

use crate::db::{RepositoryError, UserStore};
use crate::models::User;

/// Verified against when the email is unknown, so that a miss costs as much
/// as a wrong password.
const TIMING_DUMMY_PASSWORD: &str = "snippetbox timing dummy";

/// Service for password-based account operations.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: Argon2<'static>,
    dummy_hash: Arc<str>,
}

impl AuthService {
    /// Create a service hashing new passwords with `params`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if the timing dummy cannot be hashed.
    pub fn new(users: Arc<dyn UserStore>, params: Params) -> Result<Self, AuthError> {
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_password(&hasher, TIMING_DUMMY_PASSWORD)?;

        Ok(Self {
            users,
            hasher,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Look up an account by id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(id).await?)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DuplicateEmail` if the email is already registered.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &str,
    ) -> Result<UserId, AuthError> {
        let password_hash = self.hash(password).await?;

        self.users
            .insert(name, email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::DuplicateEmail,
                other => AuthError::Repository(other),
            })
    }

    /// Check an email and password, returning the account id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown, the
    /// account is inactive, or the password is wrong. The three cases are
    /// indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        match self.users.credentials_by_email(email.trim()).await? {
            Some((id, password_hash)) => {
                self.verify(password, password_hash).await?;
                Ok(id)
            }
            None => {
                // Burn the same work a real verification would
                let _ = self.verify(password, self.dummy_hash.to_string()).await;
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Replace an account's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if `current` does not verify
    /// or the account no longer exists.
    #[instrument(skip(self, current, new))]
    pub async fn change_password(
        &self,
        id: UserId,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        let stored = self
            .users
            .password_hash(id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        self.verify(current, stored).await?;

        let replacement = self.hash(new).await?;
        self.users
            .update_password_hash(id, &replacement)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::InvalidCredentials,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hash_password(&hasher, &password))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?
    }

    async fn verify(&self, password: &str, password_hash: String) -> Result<(), AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || verify_password(&hasher, &password, &password_hash))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?
    }
}

/// Hash a password with a fresh random salt.
fn hash_password(hasher: &Argon2<'_>, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a PHC hash string in constant time.
///
/// The cost parameters come from the stored hash, not from `hasher`.
fn verify_password(hasher: &Argon2<'_>, password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;

    hasher
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|e| match e {
            argon2::password_hash::Error::Password => AuthError::InvalidCredentials,
            other => AuthError::PasswordHash(other.to_string()),
        })
}
