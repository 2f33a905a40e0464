//! Self-service account operations for the authenticated caller.
//!
//! Flow Overview:
//! 1) Reject callers without an identity claim before touching storage.
//! 2) Validate inputs.
//! 3) Open a unit of work, resolve the caller's row or fail with `NotFound`.
//! 4) Mutate and commit; any early return drops the unit of work and rolls back.
//!
//! Password changes read and verify first, then re-read the row in a second unit
//! of work and only write if the digest they verified against is still current.

pub mod hasher;
pub mod store;
pub mod validation;


use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

pub use hasher::{CredentialHasher, HashError};
pub use store::{PgUserStore, StoreError, UnitOfWork, User, UserId, UserStore};

/// Decoded "who is calling", produced by the bearer-token verifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityClaim {
    pub user_id: UserId,
    pub username: Option<String>,
    pub role: Option<String>,
}

impl IdentityClaim {
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            username: None,
            role: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("authentication failed")]
    Unauthenticated,
    #[error("user not found")]
    NotFound,
    #[error("current password is incorrect")]
    InvalidCredential,
    #[error("new password must be between 1 and 72 bytes")]
    InvalidPassword,
    #[error("invalid phone number")]
    InvalidPhoneNumber,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Account operations over a [`UserStore`], sharing one [`CredentialHasher`].
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    hasher: CredentialHasher,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl AccountService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, hasher: CredentialHasher) -> Self {
        Self { store, hasher }
    }

    #[must_use]
    pub const fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    /// Check the backing store is reachable.
    ///
    /// # Errors
    /// Returns the store error when the ping fails.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    /// Return the caller's own record.
    ///
    /// # Errors
    /// `Unauthenticated` without a claim, `NotFound` when the claimed id has no row.
    #[instrument(skip(self))]
    pub async fn profile(&self, claim: Option<&IdentityClaim>) -> Result<User, AccountError> {
        let claim = claim.ok_or(AccountError::Unauthenticated)?;
        let mut unit = self.store.begin().await?;
        let user = find_user(unit.as_mut(), claim).await?;
        Ok(user)
    }

    /// Replace the caller's password after checking the current one.
    ///
    /// # Errors
    /// `Unauthenticated`, `InvalidPassword`, `NotFound`, or `InvalidCredential` when
    /// `current_password` does not match or the digest changed while verifying;
    /// storage is untouched in every case.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        claim: Option<&IdentityClaim>,
        current_password: SecretString,
        new_password: SecretString,
    ) -> Result<(), AccountError> {
        let claim = claim.ok_or(AccountError::Unauthenticated)?;
        if !validation::valid_new_password(new_password.expose_secret()) {
            return Err(AccountError::InvalidPassword);
        }

        // No unit of work stays open across bcrypt.
        let current = {
            let mut unit = self.store.begin().await?;
            let user = find_user(unit.as_mut(), claim).await?;
            user
        };

        let matches = self
            .hasher
            .verify_blocking(current_password, current.hashed_password.clone())
            .await?;
        if !matches {
            warn!(user_id = current.id, "current password mismatch");
            return Err(AccountError::InvalidCredential);
        }
        let digest = self.hasher.hash_blocking(new_password).await?;

        let mut unit = self.store.begin().await?;
        let mut user = find_user(unit.as_mut(), claim).await?;
        if user.hashed_password != current.hashed_password {
            warn!(user_id = user.id, "password changed concurrently");
            return Err(AccountError::InvalidCredential);
        }

        user.hashed_password = digest;
        unit.save(&user).await?;
        unit.commit().await?;

        info!(user_id = user.id, "password changed");
        Ok(())
    }

    /// Set the caller's phone number.
    ///
    /// # Errors
    /// `Unauthenticated`, `InvalidPhoneNumber`, or `NotFound`.
    #[instrument(skip(self, phone_number))]
    pub async fn change_phone_number(
        &self,
        claim: Option<&IdentityClaim>,
        phone_number: &str,
    ) -> Result<(), AccountError> {
        let claim = claim.ok_or(AccountError::Unauthenticated)?;
        let phone_number = validation::normalize_phone_number(phone_number)
            .ok_or(AccountError::InvalidPhoneNumber)?;

        let mut unit = self.store.begin().await?;
        let mut user = find_user(unit.as_mut(), claim).await?;

        user.phone_number = Some(phone_number);
        unit.save(&user).await?;
        unit.commit().await?;

        info!(user_id = user.id, "phone number changed");
        Ok(())
    }
}

async fn find_user(
    unit: &mut dyn UnitOfWork,
    claim: &IdentityClaim,
) -> Result<User, AccountError> {
    unit.find_by_id(claim.user_id)
        .await?
        .ok_or(AccountError::NotFound)
}
