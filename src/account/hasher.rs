//! Salted one-way password hashing.
//!
//! Digests use the bcrypt modular crypt format (`$2b$<cost>$<salt><hash>`), so the
//! salt and work factor travel with the digest and `verify` needs nothing else.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Largest input bcrypt consumes; longer passwords would be silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("unsupported bcrypt cost {0}")]
    Cost(u32),
    #[error("failed to hash password: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Process-wide hashing configuration, built once at startup and shared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CredentialHasher {
    cost: u32,
}

impl CredentialHasher {
    /// # Errors
    /// Returns an error if `cost` is outside the range bcrypt accepts.
    pub fn new(cost: u32) -> Result<Self, HashError> {
        if (4..=31).contains(&cost) {
            Ok(Self { cost })
        } else {
            Err(HashError::Cost(cost))
        }
    }

    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `plaintext` with a fresh random salt.
    ///
    /// # Errors
    /// Returns an error if bcrypt fails to produce a digest.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// Check `plaintext` against a stored digest. Malformed digests never match.
    #[must_use]
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        bcrypt::verify(plaintext, digest).unwrap_or(false)
    }

    /// [`Self::hash`] on the blocking pool.
    ///
    /// # Errors
    /// Returns an error if hashing fails or the blocking task panics.
    pub async fn hash_blocking(&self, plaintext: SecretString) -> Result<String, HashError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(plaintext.expose_secret())).await?
    }

    /// [`Self::verify`] on the blocking pool.
    ///
    /// # Errors
    /// Returns an error only if the blocking task panics.
    pub async fn verify_blocking(
        &self,
        plaintext: SecretString,
        digest: String,
    ) -> Result<bool, HashError> {
        let hasher = *self;
        Ok(
            tokio::task::spawn_blocking(move || hasher.verify(plaintext.expose_secret(), &digest))
                .await?,
        )
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}
