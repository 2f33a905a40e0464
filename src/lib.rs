//! # Accounts (user self-service API)
//!
//! `accounts` lets an authenticated user read their own profile, change their
//! password and set their phone number.
//!
//! ## Authentication
//!
//! Every `/users` route expects an `Authorization: Bearer <jwt>` header. Tokens are
//! issued by a separate service and signed with a shared HS256 secret; their `id`
//! claim names the calling user. A missing or invalid token is rejected with
//! `401` before the database is touched.
//!
//! ## Passwords
//!
//! Passwords are stored as salted bcrypt digests. The work factor is configured
//! once at startup and shared by every request. Changing a password requires the
//! current one.
//!
//! ## Schema
//!
//! Migrations live in `migrations/` and are embedded in the binary
//! (`accounts migrate`). The phone number column is nullable and additive.

pub mod account;
pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
