//! JWT token generation and validation

use gods_shared::UserId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// JWT claims structure for GODS session tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: UserId,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// JWT manager for token operations
///
/// Built once from the configured signing key; there is no way to swap the
/// key on a live manager.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secret: &str, token_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_expiry_hours,
        }
    }

    /// Generate a session token for `user_id`
    pub fn generate_token(&self, user_id: UserId) -> Result<String, JwtError> {
        let now = OffsetDateTime::now_utc();
        let exp = self
            .token_expiry_hours
            .checked_mul(3600)
            .map(Duration::seconds)
            .and_then(|lifetime| now.checked_add(lifetime))
            .ok_or_else(|| {
                JwtError::Encoding(format!(
                    "token lifetime of {} hours is out of range",
                    self.token_expiry_hours
                ))
            })?;

        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };

        self.encode_claims(&claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        // Explicit algorithm prevents algorithm confusion attacks
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    /// Validate and decode a token
    ///
    /// Only HS256 is accepted; a token whose header names any other
    /// algorithm is rejected before its claims are trusted.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => {
                    tracing::debug!(error = %e, "Rejected session token");
                    JwtError::Invalid
                }
            })
    }

    /// Validate a token and return its subject
    pub fn validate_token(&self, token: &str) -> Result<UserId, JwtError> {
        self.decode_claims(token).map(|claims| claims.sub)
    }

    /// Get token expiry in seconds
    pub fn token_expiry_seconds(&self) -> i64 {
        self.token_expiry_hours.saturating_mul(3600)
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("token_expiry_hours", &self.token_expiry_hours)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}
