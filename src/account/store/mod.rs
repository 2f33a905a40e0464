//! User persistence behind a unit-of-work seam.
//!
//! A [`UnitOfWork`] is opened per request with [`UserStore::begin`]. Changes only
//! become durable through [`UnitOfWork::commit`]; dropping an uncommitted unit
//! discards them and releases its connection.

pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

pub use postgres::PgUserStore;

pub type UserId = i32;

/// Row of the `users` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Credential hasher output, never exposed over the API.
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub hashed_password: String,
    pub is_active: bool,
    pub role: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Open a request-scoped unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;

    /// Check the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    async fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Persist the mutable columns (`hashed_password`, `phone_number`) of `user`.
    async fn save(&mut self, user: &User) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
