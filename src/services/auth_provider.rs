// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth provider contract and an in-process implementation.
//!
//! The provider owns accounts and the current client session, issues
//! HS256 access tokens, and publishes every session transition to its
//! subscribers in the order it happened.

use crate::error::AppError;
use crate::models::{Session, User};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use subtle::ConstantTimeEq;
use tokio::sync::mpsc;

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Session transition published by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

impl AuthEvent {
    /// Only an explicit sign-in counts as interactive.
    pub fn is_interactive_sign_in(self) -> bool {
        matches!(self, AuthEvent::SignedIn)
    }
}

/// An event together with the session that is current after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

/// Fields a signed-in user may change.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Password must be at least 6 characters")]
    WeakPassword,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Auth provider unavailable: {0}")]
    Unavailable(String),

    /// Local failure (signing, hashing, randomness), not an outage
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Unauthorized,
            AuthError::InvalidToken => AppError::InvalidToken,
            AuthError::WeakPassword => AppError::Validation(err.to_string()),
            AuthError::UserNotFound(id) => AppError::NotFound(format!("User {}", id)),
            AuthError::EmailTaken => AppError::BadRequest(err.to_string()),
            AuthError::Unavailable(msg) => AppError::AuthProvider(msg),
            AuthError::Internal(e) => AppError::Internal(e),
        }
    }
}

/// Live subscription to the provider's event stream.
///
/// Dropping the subscription also unsubscribes.
pub struct AuthSubscription {
    receiver: Option<mpsc::UnboundedReceiver<AuthChange>>,
}

impl AuthSubscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<AuthChange>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// Next event in arrival order, or `None` once unsubscribed or closed.
    pub async fn next(&mut self) -> Option<AuthChange> {
        self.receiver.as_mut()?.recv().await
    }

    pub fn unsubscribe(&mut self) {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
        }
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current client session, if any.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Subscribe to session transitions.
    fn subscribe(&self) -> AuthSubscription;

    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AuthError>;

    async fn update_user(&self, user_id: &str, update: UserUpdate) -> Result<User, AuthError>;

    /// Check credentials without touching the current session or publishing
    /// an event.
    async fn verify_password(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Resolve an access token to the identity it was issued for.
    fn verify_access_token(&self, token: &str) -> Result<User, AuthError>;
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

struct Account {
    user: User,
    password_digest: Vec<u8>,
}

/// In-process auth provider with a single client session.
pub struct MemoryAuthProvider {
    /// Keyed by lowercased email
    accounts: DashMap<String, Account>,
    current: Mutex<Option<Session>>,
    listeners: Mutex<Vec<mpsc::UnboundedSender<AuthChange>>>,
    jwt_signing_key: Vec<u8>,
    password_pepper: Vec<u8>,
    session_ttl: Duration,
    rng: SystemRandom,
    unavailable: AtomicBool,
}

impl MemoryAuthProvider {
    pub fn new(jwt_signing_key: &[u8], password_pepper: &[u8], session_ttl_secs: i64) -> Self {
        Self {
            accounts: DashMap::new(),
            current: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            jwt_signing_key: jwt_signing_key.to_vec(),
            password_pepper: password_pepper.to_vec(),
            session_ttl: Duration::seconds(session_ttl_secs),
            rng: SystemRandom::new(),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate an outage of the provider's network operations.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Register a new account.
    pub fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.check_available()?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let key = email.trim().to_lowercase();
        if self.accounts.contains_key(&key) {
            return Err(AuthError::EmailTaken);
        }

        let user = User {
            id: hex::encode(self.random_bytes::<16>()?),
            email: key.clone(),
        };
        let password_digest = self.digest(&user.id, password)?;
        self.accounts.insert(
            key,
            Account {
                user: user.clone(),
                password_digest,
            },
        );

        tracing::info!(user_id = %user.id, "Account registered");
        Ok(user)
    }

    /// Reissue tokens for the current session and publish `TokenRefreshed`.
    pub fn refresh_session(&self) -> Result<Session, AuthError> {
        self.check_available()?;
        let user = self
            .current_session()
            .map(|s| s.user)
            .ok_or(AuthError::InvalidToken)?;
        let session = self.issue_session(user)?;
        self.set_current(AuthEvent::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }

    fn check_available(&self) -> Result<(), AuthError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable(
                "provider not reachable (offline mode)".to_string(),
            ));
        }
        Ok(())
    }

    fn current_session(&self) -> Option<Session> {
        self.current.lock().ok().and_then(|s| s.clone())
    }

    /// Replace the current session and notify subscribers.
    fn set_current(&self, event: AuthEvent, session: Option<Session>) {
        if let Ok(mut current) = self.current.lock() {
            *current = session.clone();
        }
        self.emit(AuthChange { event, session });
    }

    fn emit(&self, change: AuthChange) {
        let Ok(mut listeners) = self.listeners.lock() else {
            tracing::error!("Auth listener lock poisoned");
            return;
        };
        listeners.retain(|tx| tx.send(change.clone()).is_ok());
        tracing::debug!(event = ?change.event, listeners = listeners.len(), "Auth event published");
    }

    fn random_bytes<const N: usize>(&self) -> Result<[u8; N], AuthError> {
        let mut bytes = [0u8; N];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| anyhow::anyhow!("random source failed"))?;
        Ok(bytes)
    }

    /// HMAC-SHA256 over the user ID and password, keyed by the pepper.
    fn digest(&self, user_id: &str, password: &str) -> Result<Vec<u8>, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.password_pepper)
            .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
        mac.update(user_id.as_bytes());
        mac.update(b":");
        mac.update(password.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn issue_session(&self, user: User) -> Result<Session, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };
        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.jwt_signing_key),
        )
        .map_err(|e| anyhow::anyhow!("token signing failed: {}", e))?;

        Ok(Session {
            access_token,
            refresh_token: URL_SAFE_NO_PAD.encode(self.random_bytes::<32>()?),
            expires_at,
            user,
        })
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        self.check_available()?;
        Ok(self
            .current_session()
            .filter(|s| !s.is_expired(Utc::now())))
    }

    fn subscribe(&self) -> AuthSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(tx);
        }
        AuthSubscription::new(rx)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.check_available()?;
        self.set_current(AuthEvent::SignedOut, None);
        Ok(())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let user = self.verify_password(email, password).await?;
        let session = self.issue_session(user)?;
        self.set_current(AuthEvent::SignedIn, Some(session.clone()));
        tracing::info!(user_id = %session.user.id, "Signed in with password");
        Ok(session)
    }

    async fn update_user(&self, user_id: &str, update: UserUpdate) -> Result<User, AuthError> {
        self.check_available()?;

        let key = self
            .accounts
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| a.key().clone())
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;

        if let Some(password) = &update.password {
            if password.chars().count() < MIN_PASSWORD_LEN {
                return Err(AuthError::WeakPassword);
            }
        }

        let new_key = update.email.as_deref().map(|e| e.trim().to_lowercase());
        if let Some(new_key) = &new_key {
            if *new_key != key && self.accounts.contains_key(new_key) {
                return Err(AuthError::EmailTaken);
            }
        }

        let (_, mut account) = self
            .accounts
            .remove(&key)
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;
        if let Some(password) = &update.password {
            account.password_digest = self.digest(user_id, password)?;
        }
        if let Some(new_key) = new_key {
            account.user.email = new_key;
        }
        let user = account.user.clone();
        self.accounts.insert(user.email.clone(), account);

        // Reissue the client session if it belongs to this user.
        if let Some(current) = self.current_session() {
            if current.user.id == user_id {
                let session = self.issue_session(user.clone())?;
                self.set_current(AuthEvent::UserUpdated, Some(session));
            }
        }

        tracing::info!(user_id, "User updated");
        Ok(user)
    }

    async fn verify_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.check_available()?;

        let key = email.trim().to_lowercase();
        let account = self
            .accounts
            .get(&key)
            .ok_or(AuthError::InvalidCredentials)?;
        let candidate = self.digest(&account.user.id, password)?;
        if !bool::from(candidate.ct_eq(&account.password_digest)) {
            tracing::warn!(user_id = %account.user.id, "Password check rejected");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(account.user.clone())
    }

    fn verify_access_token(&self, token: &str) -> Result<User, AuthError> {
        let key = DecodingKey::from_secret(&self.jwt_signing_key);
        let validation = Validation::new(Algorithm::HS256);

        let token_data =
            decode::<Claims>(token, &key, &validation).map_err(|_| AuthError::InvalidToken)?;

        Ok(User {
            id: token_data.claims.sub,
            email: token_data.claims.email,
        })
    }
}
