//! User accounts and session management.
//!
//! Credentials are stored as a salted SHA-256 digest; verification compares
//! digests in constant time. Sessions are opaque v4 UUID tokens held in the
//! store and referenced by an HTTP-only cookie.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::info;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{NewUser, SessionsRepo, UsersRepo};
use crate::domain::entities::UserRecord;

pub struct AccountService {
    users: Arc<dyn UsersRepo>,
    sessions: Arc<dyn SessionsRepo>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UsersRepo>, sessions: Arc<dyn SessionsRepo>) -> Self {
        Self { users, sessions }
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::validation("username must not be empty"));
        }
        if password.is_empty() {
            return Err(AppError::validation("password must not be empty"));
        }

        let salt = Uuid::new_v4().into_bytes();
        let digest = digest_password(&salt, password);
        let record = self
            .users
            .create_user(NewUser {
                username: username.to_string(),
                password_digest: hex::encode(digest),
                password_salt: hex::encode(salt),
            })
            .await?;

        info!(
            target = "brezza::accounts",
            username = %record.username,
            "user created"
        );
        Ok(record)
    }

    /// Check a username/password pair. A missing user and a wrong password
    /// are indistinguishable to the caller.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, AppError> {
        let Some(stored) = self.users.find_user_credentials(username.trim()).await? else {
            return Ok(None);
        };

        let salt = hex::decode(&stored.password_salt)
            .map_err(|err| AppError::unexpected(format!("corrupt password salt: {err}")))?;
        let expected = hex::decode(&stored.password_digest)
            .map_err(|err| AppError::unexpected(format!("corrupt password digest: {err}")))?;
        let candidate = digest_password(&salt, password);

        if candidate.ct_eq(expected.as_slice()).into() {
            Ok(Some(stored.user))
        } else {
            Ok(None)
        }
    }

    pub async fn open_session(&self, user_id: i64) -> Result<Uuid, AppError> {
        let token = Uuid::new_v4();
        self.sessions.insert_session(token, user_id).await?;
        Ok(token)
    }

    /// Resolve a session cookie value to its user, if the token is valid.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<UserRecord>, AppError> {
        let Ok(token) = Uuid::parse_str(token) else {
            return Ok(None);
        };
        Ok(self.sessions.find_session_user(token).await?)
    }

    pub async fn close_session(&self, token: &str) -> Result<(), AppError> {
        if let Ok(token) = Uuid::parse_str(token) {
            self.sessions.delete_session(token).await?;
        }
        Ok(())
    }
}

fn digest_password(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}
