//! Signed, time-bounded session tokens
//!
//! Sessions are HS256 JWTs carrying the user id as `sub`. They live only in
//! the client's cookie and are re-verified on every request.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::AuthError;
use crate::config::{SessionConfig, MAX_SESSION_TTL_SECS};
use crate::error::{Error, Result};

/// Session token claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: &str, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: user_id.to_string(),
            iat,
            exp: iat.saturating_add(ttl.num_seconds()),
        }
    }

    /// A session is expired once the clock is strictly past `exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }
}

/// Issues and verifies session tokens with a process-wide secret.
#[derive(Clone)]
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an injectable clock in `parse_claims_at`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Build a codec from the `[session]` configuration section
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(Error::Config("session.secret must not be empty".to_string()));
        }
        if config.ttl_secs == 0 || config.ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(Error::Config(format!(
                "session.ttl_secs must be between 1 and {}, got {}",
                MAX_SESSION_TTL_SECS, config.ttl_secs
            )));
        }
        let ttl = i64::try_from(config.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| Error::Config("session.ttl_secs is out of range".to_string()))?;
        Ok(Self::new(config.secret.as_bytes(), ttl))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a session for a user, valid for the configured TTL
    pub fn issue(&self, user_id: &str) -> Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: &str, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims::new(user_id, issued_at, self.ttl);
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verify a session and return the user id it names
    pub fn parse(&self, token: &str) -> std::result::Result<String, AuthError> {
        self.parse_at(token, Utc::now())
    }

    pub fn parse_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<String, AuthError> {
        self.parse_claims_at(token, now).map(|claims| claims.sub)
    }

    pub fn parse_claims_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredSession,
                _ => {
                    tracing::debug!(error = %e, "Rejected session token");
                    AuthError::InvalidSession
                }
            })?;

        if claims.is_expired_at(now) {
            return Err(AuthError::ExpiredSession);
        }

        Ok(claims)
    }
}

impl fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCodec")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}
