//! Identity gateway: email/password signup, login, logout, session tokens,
//! and the reactive current-user stream.
//!
//! Passwords are stored as salted HMAC-SHA256 digests; verification is
//! constant-time. Sessions are stateless HMAC-signed tokens (see [`token`]).

pub mod channel;
pub mod token;

use chrono::Utc;
use clarity_db::models::User;
use clarity_db::queries::users;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

pub use channel::{AuthChannel, AuthState};
pub use token::{SessionClaims, SessionConfig, SessionTokenError};

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Errors surfaced by the identity gateway.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("email is already in use")]
    EmailAlreadyInUse,

    #[error("invalid email or password")]
    InvalidCredential,

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,

    #[error("authentication backend failure")]
    Other(#[from] anyhow::Error),
}

/// An established session: the authenticated user plus a bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

/// Generate a random per-user salt: 16 random bytes, hex-encoded.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Hash a password with a hex-encoded salt: HMAC-SHA256 keyed by the salt
/// bytes over the password, hex-encoded.
pub fn hash_password(salt_hex: &str, password: &str) -> Result<String, AuthError> {
    let salt = hex::decode(salt_hex)
        .map_err(|e| AuthError::Other(anyhow::anyhow!("stored salt is not valid hex: {e}")))?;
    let mut mac = HmacSha256::new_from_slice(&salt).expect("HMAC can take key of any size");
    mac.update(password.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a password against a stored salt and hash, in constant time.
pub fn verify_password(salt_hex: &str, stored_hash_hex: &str, password: &str) -> bool {
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(stored_hash_hex) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(&salt).expect("HMAC can take key of any size");
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

// ---------------------------------------------------------------------------
// Email normalization
// ---------------------------------------------------------------------------

/// Normalize and validate an email address.
///
/// Trims whitespace, lowercases, and requires a single `@` with non-empty
/// local and domain parts. Anything stricter belongs to the mail provider.
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let normalized = email.trim().to_ascii_lowercase();
    match normalized.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(normalized)
        }
        _ => Err(AuthError::InvalidEmail),
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// The identity gateway: owns credential checks, session issuance, and an
/// auth-state channel scoped to this gateway instance (see [`AuthChannel`]
/// for what that scope means when the gateway is shared).
#[derive(Debug, Clone)]
pub struct IdentityGateway {
    pool: PgPool,
    sessions: SessionConfig,
    channel: AuthChannel,
}

impl IdentityGateway {
    pub fn new(pool: PgPool, sessions: SessionConfig) -> Self {
        Self {
            pool,
            sessions,
            channel: AuthChannel::new(),
        }
    }

    /// Subscribe to the current-user stream. The receiver resolves to the
    /// current state immediately (see [`AuthChannel::subscribe`]).
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<AuthState> {
        self.channel.subscribe()
    }

    /// The current resolved auth state of this gateway's session.
    pub fn current_state(&self) -> AuthState {
        self.channel.current()
    }

    /// Create a new account and establish a session for it.
    pub async fn signup(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let salt = generate_salt();
        let hash = hash_password(&salt, password)?;

        let record = users::insert_user(&self.pool, &email, &hash, &salt)
            .await?
            .ok_or(AuthError::EmailAlreadyInUse)?;

        info!(user_id = %record.id, "user signed up");
        Ok(self.establish(record.into()))
    }

    /// Authenticate an existing account and establish a session.
    ///
    /// Unknown email and wrong password both map to
    /// [`AuthError::InvalidCredential`] so the API does not reveal which
    /// accounts exist.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredential)?;

        let record = users::get_user_by_email(&self.pool, &email)
            .await?
            .ok_or(AuthError::InvalidCredential)?;

        if !verify_password(&record.password_salt, &record.password_hash, password) {
            return Err(AuthError::InvalidCredential);
        }

        info!(user_id = %record.id, "user logged in");
        Ok(self.establish(record.into()))
    }

    /// Clear the session-side identity and notify subscribers.
    ///
    /// Tokens are stateless and expiring, so logout does not revoke
    /// already-issued tokens; it resolves this session to signed-out.
    pub fn logout(&self) {
        self.channel.publish(AuthState::SignedOut);
    }

    /// Resolve a bearer token to its user.
    ///
    /// Any token defect (format, signature, expiry) and any unknown user id
    /// map to [`AuthError::InvalidCredential`].
    pub async fn authenticate(&self, bearer_token: &str) -> Result<User, AuthError> {
        let claims = token::validate_token(&self.sessions, bearer_token, Utc::now())
            .map_err(|_| AuthError::InvalidCredential)?;
        self.user_by_id(claims.user_id).await
    }

    async fn user_by_id(&self, id: Uuid) -> Result<User, AuthError> {
        let record = users::get_user(&self.pool, id)
            .await?
            .ok_or(AuthError::InvalidCredential)?;
        Ok(record.into())
    }

    fn establish(&self, user: User) -> Session {
        let token = token::issue_token(&self.sessions, user.id, Utc::now());
        self.channel.publish(AuthState::SignedIn(user.clone()));
        Session { user, token }
    }
}
