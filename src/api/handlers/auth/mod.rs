//! Authentication dependency: bearer tokens in, identity claims out.

pub(crate) mod principal;
pub mod token;

pub use token::TokenVerifier;
