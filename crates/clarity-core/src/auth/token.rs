//! Session token generation and validation.
//!
//! Tokens are HMAC-SHA256 based, scoped to a (user_id, expiry) pair.
//! Format: `clarity_st_<user_id>_<expiry_unix>_<hmac_hex>`

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Token prefix used to identify clarity session tokens.
const TOKEN_PREFIX: &str = "clarity_st_";

/// Default session lifetime: seven days.
pub const DEFAULT_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Errors that can occur during session token operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionTokenError {
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    #[error("invalid user ID in token: {0}")]
    InvalidUserId(String),

    #[error("invalid expiry in token: {0}")]
    InvalidExpiry(String),

    #[error("token HMAC verification failed")]
    HmacMismatch,

    #[error("session token has expired")]
    Expired,

    #[error("missing session secret")]
    MissingSecret,
}

/// Configuration for session token signing and validation.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The HMAC secret key bytes.
    pub secret: Vec<u8>,
    /// Token lifetime in seconds.
    pub ttl_secs: i64,
}

impl SessionConfig {
    /// Create a new SessionConfig with the given secret and default TTL.
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    /// Create a SessionConfig from the `CLARITY_SESSION_SECRET` environment
    /// variable.
    ///
    /// The value must be a hex-encoded string (as written by `clarity init`).
    /// Returns an error if the variable is missing or contains invalid hex.
    pub fn from_env() -> Result<Self, SessionTokenError> {
        let secret_hex =
            std::env::var("CLARITY_SESSION_SECRET").map_err(|_| SessionTokenError::MissingSecret)?;
        let secret = hex::decode(&secret_hex).map_err(|e| {
            SessionTokenError::InvalidFormat(format!(
                "CLARITY_SESSION_SECRET is not valid hex: {e}"
            ))
        })?;
        Ok(Self::new(secret))
    }
}

/// Claims extracted from a validated session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

/// Issue a session token for a user, valid until `now + ttl`.
///
/// The token format is: `clarity_st_<user_id>_<expiry_unix>_<hmac_hex>`
/// where the HMAC-SHA256 is computed over `<user_id>:<expiry_unix>`.
pub fn issue_token(config: &SessionConfig, user_id: Uuid, now: DateTime<Utc>) -> String {
    let expiry = now.timestamp() + config.ttl_secs;
    let message = format!("{user_id}:{expiry}");
    let mac = compute_hmac(&config.secret, message.as_bytes());
    let hmac_hex = hex::encode(mac);
    format!("{TOKEN_PREFIX}{user_id}_{expiry}_{hmac_hex}")
}

/// Validate a session token and extract its claims.
///
/// This function:
/// 1. Parses the token format
/// 2. Recomputes the HMAC
/// 3. Uses constant-time comparison to verify the HMAC
/// 4. Rejects tokens whose expiry is in the past relative to `now`
pub fn validate_token(
    config: &SessionConfig,
    token: &str,
    now: DateTime<Utc>,
) -> Result<SessionClaims, SessionTokenError> {
    // Strip prefix
    let rest = token.strip_prefix(TOKEN_PREFIX).ok_or_else(|| {
        SessionTokenError::InvalidFormat("token must start with 'clarity_st_'".to_string())
    })?;

    // Parse the components: <user_id>_<expiry>_<hmac_hex>
    // A UUID is 36 chars (8-4-4-4-12). We parse the UUID first (36 chars),
    // then expect underscore, then expiry, then underscore, then hmac_hex.
    let (user_id_str, after_user_id) = parse_uuid_prefix(rest)?;

    let user_id = Uuid::parse_str(user_id_str)
        .map_err(|e| SessionTokenError::InvalidUserId(e.to_string()))?;

    // after_user_id should start with '_'
    let after_underscore = after_user_id.strip_prefix('_').ok_or_else(|| {
        SessionTokenError::InvalidFormat("expected underscore after user_id".to_string())
    })?;

    // Split on the next underscore to get expiry and hmac
    let (expiry_str, hmac_hex) = after_underscore.split_once('_').ok_or_else(|| {
        SessionTokenError::InvalidFormat("expected underscore between expiry and hmac".to_string())
    })?;

    let expiry: i64 = expiry_str
        .parse()
        .map_err(|e: std::num::ParseIntError| SessionTokenError::InvalidExpiry(e.to_string()))?;

    // Decode the provided HMAC
    let provided_mac = hex::decode(hmac_hex)
        .map_err(|e| SessionTokenError::InvalidFormat(format!("invalid hex in hmac: {e}")))?;

    // Recompute and verify HMAC using constant-time comparison. The HMAC is
    // checked before the expiry so a forged expiry never passes.
    let message = format!("{user_id}:{expiry}");
    verify_hmac_constant_time(&config.secret, message.as_bytes(), &provided_mac)?;

    let expires_at = Utc
        .timestamp_opt(expiry, 0)
        .single()
        .ok_or_else(|| SessionTokenError::InvalidExpiry(format!("out of range: {expiry}")))?;

    if expires_at <= now {
        return Err(SessionTokenError::Expired);
    }

    Ok(SessionClaims {
        user_id,
        expires_at,
    })
}

/// Parse a UUID from the beginning of a string.
/// Returns (uuid_str, remainder).
fn parse_uuid_prefix(s: &str) -> Result<(&str, &str), SessionTokenError> {
    // A standard UUID is 36 characters: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
    if s.len() < 36 {
        return Err(SessionTokenError::InvalidFormat(
            "token too short to contain a valid UUID".to_string(),
        ));
    }
    Ok(s.split_at(36))
}

/// Compute HMAC-SHA256 over the given message with the given key.
pub(crate) fn compute_hmac(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Verify HMAC using constant-time comparison.
///
/// This uses the `hmac` crate's `verify_slice` method which is
/// designed to be constant-time to prevent timing attacks.
pub(crate) fn verify_hmac_constant_time(
    key: &[u8],
    message: &[u8],
    expected_mac: &[u8],
) -> Result<(), SessionTokenError> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.verify_slice(expected_mac)
        .map_err(|_| SessionTokenError::HmacMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SessionConfig {
        SessionConfig::new(b"test-secret-key-for-clarity".to_vec())
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
    }

    #[test]
    fn issue_token_has_correct_format() {
        let config = test_config();
        let user_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();

        let token = issue_token(&config, user_id, now());

        assert!(
            token.starts_with("clarity_st_"),
            "token must start with clarity_st_ prefix"
        );
        assert!(
            token.contains(&user_id.to_string()),
            "token must contain user_id"
        );

        // Verify the HMAC hex portion is 64 chars (SHA-256 = 32 bytes = 64 hex chars)
        let rest = token.strip_prefix("clarity_st_").unwrap();
        let parts_after_uuid = rest[36..].strip_prefix('_').unwrap();
        let (_expiry_str, hmac_hex) = parts_after_uuid.split_once('_').unwrap();
        assert_eq!(hmac_hex.len(), 64, "HMAC-SHA256 hex should be 64 chars");
    }

    #[test]
    fn issue_and_validate_roundtrip() {
        let config = test_config();
        let user_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();

        let token = issue_token(&config, user_id, now());
        let claims = validate_token(&config, &token, now()).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(
            claims.expires_at.timestamp(),
            now().timestamp() + DEFAULT_TTL_SECS
        );
    }

    #[test]
    fn reject_expired_token() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = issue_token(&config, user_id, now());
        let later = now() + chrono::Duration::seconds(DEFAULT_TTL_SECS + 1);

        let result = validate_token(&config, &token, later);
        assert!(matches!(result.unwrap_err(), SessionTokenError::Expired));
    }

    #[test]
    fn token_valid_just_before_expiry() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = issue_token(&config, user_id, now());
        let almost = now() + chrono::Duration::seconds(DEFAULT_TTL_SECS - 1);

        assert!(validate_token(&config, &token, almost).is_ok());
    }

    #[test]
    fn reject_tampered_hmac() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = issue_token(&config, user_id, now());

        // Tamper with the last character of the HMAC
        let mut tampered = token.clone();
        let last_char = tampered.pop().unwrap();
        let replacement = if last_char == 'a' { 'b' } else { 'a' };
        tampered.push(replacement);

        let result = validate_token(&config, &tampered, now());
        assert!(
            matches!(result.unwrap_err(), SessionTokenError::HmacMismatch),
            "tampered token must be rejected with HmacMismatch"
        );
    }

    #[test]
    fn reject_tampered_user_id() {
        let config = test_config();
        let user_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let token = issue_token(&config, user_id, now());

        let other_id = Uuid::parse_str("660e8400-e29b-41d4-a716-446655440000").unwrap();
        let tampered = token.replace(&user_id.to_string(), &other_id.to_string());

        let result = validate_token(&config, &tampered, now());
        assert!(
            result.is_err(),
            "token with tampered user_id must be rejected"
        );
    }

    #[test]
    fn reject_extended_expiry() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = issue_token(&config, user_id, now());

        // Try to push the expiry a year into the future without re-signing.
        let real_expiry = (now().timestamp() + DEFAULT_TTL_SECS).to_string();
        let forged_expiry = (now().timestamp() + 365 * 24 * 3600).to_string();
        let tampered = token.replacen(&real_expiry, &forged_expiry, 1);

        let result = validate_token(&config, &tampered, now());
        assert!(
            matches!(result.unwrap_err(), SessionTokenError::HmacMismatch),
            "forged expiry must fail HMAC verification"
        );
    }

    #[test]
    fn reject_wrong_secret() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = issue_token(&config, user_id, now());

        let wrong_config = SessionConfig::new(b"wrong-secret-key".to_vec());
        let result = validate_token(&wrong_config, &token, now());
        assert!(matches!(
            result.unwrap_err(),
            SessionTokenError::HmacMismatch
        ));
    }

    #[test]
    fn reject_empty_token() {
        let config = test_config();
        let result = validate_token(&config, "", now());
        assert!(matches!(
            result.unwrap_err(),
            SessionTokenError::InvalidFormat(_)
        ));
    }

    #[test]
    fn reject_wrong_prefix() {
        let config = test_config();
        let result = validate_token(&config, "wrong_prefix_abc", now());
        assert!(matches!(
            result.unwrap_err(),
            SessionTokenError::InvalidFormat(_)
        ));
    }

    #[test]
    fn reject_truncated_token() {
        let config = test_config();
        let result = validate_token(&config, "clarity_st_short", now());
        assert!(matches!(
            result.unwrap_err(),
            SessionTokenError::InvalidFormat(_)
        ));
    }

    #[test]
    fn reject_invalid_expiry_number() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = format!("clarity_st_{user_id}_abc_deadbeef");
        let result = validate_token(&config, &token, now());
        assert!(matches!(
            result.unwrap_err(),
            SessionTokenError::InvalidExpiry(_)
        ));
    }

    #[test]
    fn reject_invalid_hex_in_hmac() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = format!("clarity_st_{user_id}_12345_zzzz-not-valid-hex!");
        let result = validate_token(&config, &token, now());
        assert!(matches!(
            result.unwrap_err(),
            SessionTokenError::InvalidFormat(_)
        ));
    }

    #[test]
    fn different_users_produce_different_tokens() {
        let config = test_config();
        let token1 = issue_token(&config, Uuid::new_v4(), now());
        let token2 = issue_token(&config, Uuid::new_v4(), now());
        assert_ne!(token1, token2);
    }

    #[test]
    fn session_config_from_env_missing() {
        // SAFETY: test-only; env var manipulation is safe in single-threaded tests.
        unsafe { std::env::remove_var("CLARITY_SESSION_SECRET") };
        let result = SessionConfig::from_env();
        assert!(matches!(
            result.unwrap_err(),
            SessionTokenError::MissingSecret
        ));
    }
}
