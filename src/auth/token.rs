use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Access token lifetime, seconds
pub const ACCESS_TOKEN_TTL: i64 = 60 * 60;
/// Refresh token lifetime, seconds
pub const REFRESH_TOKEN_TTL: i64 = 24 * 60 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn ttl(self) -> Duration {
        match self {
            Self::Access => Duration::seconds(ACCESS_TOKEN_TTL),
            Self::Refresh => Duration::seconds(REFRESH_TOKEN_TTL),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub id: i32,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    pub kind: TokenKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies HS256 tokens with one shared secret.
///
/// Every method takes the current time explicitly; expiry is compared with
/// zero leeway against that value rather than the system clock.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, user_id: i32, kind: TokenKind, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            id: user_id,
            exp: (now + kind.ttl()).timestamp(),
            kind,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::internal(format!("failed to sign {kind:?} token: {e}")))
    }

    pub fn issue_pair(&self, user_id: i32, now: DateTime<Utc>) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(user_id, TokenKind::Access, now)?,
            refresh_token: self.issue(user_id, TokenKind::Refresh, now)?,
        })
    }

    /// Check signature, kind and expiry. Every failure is `Unauthenticated`.
    pub fn verify(&self, token: &str, kind: TokenKind, now: DateTime<Utc>) -> Result<Claims> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected token");
                invalid(kind)
            })?
            .claims;
        if claims.kind != kind || claims.exp <= now.timestamp() {
            return Err(invalid(kind));
        }
        Ok(claims)
    }

    /// Mint a fresh access token from a valid refresh token. The refresh
    /// token itself is not rotated.
    pub fn refresh(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<String> {
        let claims = self.verify(refresh_token, TokenKind::Refresh, now)?;
        self.issue(claims.id, TokenKind::Access, now)
    }
}

fn invalid(kind: TokenKind) -> Error {
    match kind {
        TokenKind::Access => Error::unauthenticated("Invalid or expired token"),
        TokenKind::Refresh => Error::unauthenticated("Invalid refresh token"),
    }
}
