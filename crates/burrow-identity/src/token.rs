use crate::error::{IdentityError, Result};
use burrow_core::UserId;
use jiff::Timestamp;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Lifetime of a freshly minted token.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Claims carried by an identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Mints and verifies HS256 identity tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Signs a token for `user_id` that expires after the configured TTL.
    pub fn mint(&self, user_id: UserId) -> Result<String> {
        let iat = Timestamp::now().as_second();
        let claims = Claims {
            user_id: user_id.get(),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };
        self.sign(&claims)
    }

    /// Returns the user id of a token whose signature and expiry check out.
    pub fn verify(&self, token: &str) -> Result<UserId> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(error = %e, "rejected identity token");
            IdentityError::InvalidToken
        })?;
        Ok(UserId::new(data.claims.user_id))
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| IdentityError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}
