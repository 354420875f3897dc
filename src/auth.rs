use std::sync::Arc;

use argon2::{
    Argon2,
    PasswordHash,
    PasswordVerifier,
    PasswordHasher,
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use argon2::password_hash::{SaltString, rand_core::OsRng as PHOsRng};

use crate::db::{RepoError, UserStore};
use crate::models::{Role, SessionRow, UserProfile};

/// Verify password using Argon2 hash stored in DB.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(p) => p,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hash a new password using Argon2id with a random salt.
/// Store the returned string in salon_user.password_hash.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut PHOsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| AuthError::Internal(format!("argon2 hash error: {e}")))
}

/// Opaque bearer token handed to the client. Only its hash is stored.
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash token for DB storage (SHA-256 hex).
pub fn hash_access_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username or password is incorrect")]
    InvalidCredentials,
    #[error("account is disabled")]
    Disabled,
    #[error("{0}")]
    Internal(String),
}

impl From<RepoError> for AuthError {
    fn from(e: RepoError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: Uuid,
    pub user: UserProfile,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_master(&self) -> bool {
        self.user.role == Role::Master
    }
}

/// A fresh session plus the only copy of its bearer token.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub access_token: String,
    pub session: Session,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<SignedIn, AuthError>;
    /// `None` for unknown, revoked or expired tokens.
    async fn current_session(&self, access_token: &str) -> Result<Option<Session>, AuthError>;
    async fn revoke(&self, access_token: &str) -> Result<(), AuthError>;
}

/// Argon2 credentials and hashed bearer sessions kept in a `UserStore`.
pub struct CredentialAuthService {
    users: Arc<dyn UserStore>,
    session_ttl: Duration,
}

impl CredentialAuthService {
    pub fn new(users: Arc<dyn UserStore>, session_ttl_hours: i64) -> Self {
        Self {
            users,
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }
}

#[async_trait]
impl AuthService for CredentialAuthService {
    async fn authenticate(&self, credentials: &Credentials) -> Result<SignedIn, AuthError> {
        let username = credentials.username.trim();
        let user = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&credentials.password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::Disabled);
        }

        let access_token = generate_access_token();
        let row = SessionRow {
            session_id: Uuid::new_v4(),
            user_id: user.user_id,
            token_hash: hash_access_token(&access_token),
            expires_at: Utc::now() + self.session_ttl,
            revoked_at: None,
        };
        self.users.insert_session(&row).await?;
        tracing::info!(username = %user.username, session_id = %row.session_id, "admin signed in");

        Ok(SignedIn {
            access_token,
            session: Session {
                session_id: row.session_id,
                user: user.profile(),
                expires_at: row.expires_at,
            },
        })
    }

    async fn current_session(&self, access_token: &str) -> Result<Option<Session>, AuthError> {
        let hash = hash_access_token(access_token);
        let Some((session, user)) = self.users.find_session(&hash).await? else {
            return Ok(None);
        };
        if session.revoked_at.is_some() || session.expires_at <= Utc::now() || !user.is_active {
            return Ok(None);
        }
        Ok(Some(Session {
            session_id: session.session_id,
            user: user.profile(),
            expires_at: session.expires_at,
        }))
    }

    async fn revoke(&self, access_token: &str) -> Result<(), AuthError> {
        self.users
            .revoke_session(&hash_access_token(access_token), Utc::now())
            .await?;
        Ok(())
    }
}
