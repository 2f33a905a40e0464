//! Bearer credential extraction.
//!
//! Flow Overview: read `Authorization: Bearer <token>`, verify it, and hand the
//! resulting claim (or nothing) to the account service, which owns the 401 decision.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use super::token::TokenVerifier;
use crate::account::IdentityClaim;

/// Resolve the caller's identity; `None` for missing, malformed or invalid tokens.
pub fn identity(headers: &HeaderMap, verifier: &TokenVerifier) -> Option<IdentityClaim> {
    let token = bearer_token(headers)?;
    verifier.verify(token)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::token::{claims_for, issue};
    use axum::http::HeaderValue;
    use secrecy::SecretString;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn identity_from_valid_header() {
        let verifier = TokenVerifier::new(&SecretString::from("s3cret"));
        let token = issue("s3cret", &claims_for(7, 600));
        let claim = identity(&headers(&format!("Bearer {token}")), &verifier);
        assert_eq!(claim.map(|c| c.user_id), Some(7));
        assert!(identity(&HeaderMap::new(), &verifier).is_none());
    }
}
