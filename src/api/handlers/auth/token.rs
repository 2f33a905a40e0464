//! HS256 bearer token verification.
//!
//! Tokens are issued elsewhere; this side only checks the signature and expiry
//! and turns the claims into an [`IdentityClaim`].

use crate::account::{IdentityClaim, UserId};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Claims carried by access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// User id
    pub id: UserId,
    #[serde(default)]
    pub role: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("key", &"***")
            .field("algorithms", &self.validation.algorithms)
            .finish()
    }
}

impl TokenVerifier {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Decode a raw token; any failure means "no identity".
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<IdentityClaim> {
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => Some(IdentityClaim {
                user_id: data.claims.id,
                username: Some(data.claims.sub),
                role: data.claims.role,
            }),
            Err(err) => {
                debug!("Rejected bearer token: {err}");
                None
            }
        }
    }
}

/// Sign claims with the shared secret, the way the token issuer does.
#[cfg(test)]
pub(crate) fn issue(secret: &str, claims: &Claims) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};

    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap_or_default()
}

#[cfg(test)]
pub(crate) fn claims_for(id: UserId, lifetime_seconds: i64) -> Claims {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    Claims {
        sub: format!("user{id}"),
        id,
        role: Some("user".to_string()),
        exp: now.saturating_add_signed(lifetime_seconds),
    }
}
