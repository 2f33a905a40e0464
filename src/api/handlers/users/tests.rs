#![allow(clippy::unwrap_used)]

use crate::account::{
    AccountService, CredentialHasher, User, UserId,
    store::memory::{Fault, MemoryUserStore},
};
use crate::api::{
    app,
    handlers::auth::{
        TokenVerifier,
        token::{claims_for, issue},
    },
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "users-test-secret";

struct Harness {
    store: MemoryUserStore,
    hasher: CredentialHasher,
    app: Router,
}

impl Harness {
    fn with_user(id: UserId, password: &str) -> Self {
        let hasher = CredentialHasher::new(4).unwrap();
        let store = MemoryUserStore::with_users([User {
            id,
            email: Some("ada@example.com".to_string()),
            username: Some("ada".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            hashed_password: hasher.hash(password).unwrap(),
            is_active: true,
            role: Some("admin".to_string()),
            phone_number: None,
        }]);
        let accounts = Arc::new(AccountService::new(Arc::new(store.clone()), hasher));
        let verifier = Arc::new(TokenVerifier::new(&SecretString::from(SECRET)));
        Self {
            store,
            hasher,
            app: app(accounts, verifier),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                request = request.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

fn token_for(id: UserId) -> String {
    issue(SECRET, &claims_for(id, 600))
}

#[tokio::test]
async fn get_user_returns_profile_without_digest() {
    let harness = Harness::with_user(7, "oldpw");
    let token = token_for(7);

    let (status, body) = harness.send(Method::GET, "/users/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 7);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["phone_number"], Value::Null);
    assert!(body.get("hashed_password").is_none());

    let (status, alias) = harness.send(Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alias, body);
}

#[tokio::test]
async fn get_user_unknown_id_is_404() {
    let harness = Harness::with_user(8, "oldpw");
    let (status, body) = harness
        .send(Method::GET, "/users/", Some(&token_for(7)), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "user not found");
}

#[tokio::test]
async fn unauthenticated_calls_are_401_and_touch_nothing() {
    let harness = Harness::with_user(7, "oldpw");
    let before = harness.store.get(7).unwrap();
    let forged = issue("not-the-secret", &claims_for(7, 600));

    for token in [None, Some("garbage"), Some(forged.as_str())] {
        let (status, _) = harness.send(Method::GET, "/users/", token, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = harness
            .send(
                Method::PUT,
                "/users/password",
                token,
                Some(json!({"current_password": "oldpw", "new_password": "newpw"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = harness
            .send(Method::PUT, "/users/phonenumber/5550104477", token, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // a broken body does not hide the missing token
    let (status, _) = harness
        .send(Method::PUT, "/users/password", None, Some(json!({"nope": 1})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(harness.store.begins(), 0);
    assert_eq!(harness.store.get(7).unwrap(), before);
}

#[tokio::test]
async fn change_password_then_verify_new_digest() {
    let harness = Harness::with_user(7, "oldpw");
    let (status, body) = harness
        .send(
            Method::PUT,
            "/users/password",
            Some(&token_for(7)),
            Some(json!({"current_password": "oldpw", "new_password": "newpw"})),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let digest = harness.store.get(7).unwrap().hashed_password;
    assert!(harness.hasher.verify("newpw", &digest));
    assert!(!harness.hasher.verify("oldpw", &digest));
}

#[tokio::test]
async fn change_password_wrong_current_is_400() {
    let harness = Harness::with_user(7, "oldpw");
    let before = harness.store.get(7).unwrap().hashed_password;
    let (status, body) = harness
        .send(
            Method::PUT,
            "/users/password",
            Some(&token_for(7)),
            Some(json!({"current_password": "nope", "new_password": "newpw"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "current password is incorrect");
    assert_eq!(harness.store.get(7).unwrap().hashed_password, before);
}

#[tokio::test]
async fn change_password_malformed_body_is_400() {
    let harness = Harness::with_user(7, "oldpw");
    let (status, body) = harness
        .send(
            Method::PUT,
            "/users/password",
            Some(&token_for(7)),
            Some(json!({"current_password": "oldpw"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn change_password_unknown_user_is_404() {
    let harness = Harness::with_user(8, "oldpw");
    let (status, _) = harness
        .send(
            Method::PUT,
            "/users/password",
            Some(&token_for(7)),
            Some(json!({"current_password": "oldpw", "new_password": "newpw"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn change_phone_number_is_204_and_repeatable() {
    let harness = Harness::with_user(7, "oldpw");
    let token = token_for(7);

    for _ in 0..2 {
        let (status, _) = harness
            .send(Method::PUT, "/users/phonenumber/555-010-4477", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(
            harness.store.get(7).unwrap().phone_number.as_deref(),
            Some("5550104477")
        );
    }

    let (_, body) = harness.send(Method::GET, "/users/", Some(&token), None).await;
    assert_eq!(body["phone_number"], "5550104477");
}

#[tokio::test]
async fn change_phone_number_invalid_is_400() {
    let harness = Harness::with_user(7, "oldpw");
    let (status, body) = harness
        .send(Method::PUT, "/users/phonenumber/call-me", Some(&token_for(7)), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "invalid phone number");
    assert!(harness.store.get(7).unwrap().phone_number.is_none());
}

#[tokio::test]
async fn change_phone_number_unknown_user_is_404() {
    let harness = Harness::with_user(8, "oldpw");
    let (status, _) = harness
        .send(Method::PUT, "/users/phonenumber/5550104477", Some(&token_for(7)), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn undecodable_phone_path_is_401_without_token() {
    let harness = Harness::with_user(7, "oldpw");

    let (status, body) = harness
        .send(Method::PUT, "/users/phonenumber/%FF", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "authentication failed");

    let (status, body) = harness
        .send(Method::PUT, "/users/phonenumber/%FF", Some(&token_for(7)), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "invalid phone number");
    assert_eq!(harness.store.begins(), 0);
}

#[tokio::test]
async fn storage_failures_are_500_with_generic_detail() {
    let harness = Harness::with_user(7, "oldpw");
    let before = harness.store.get(7).unwrap();
    let token = token_for(7);
    harness.store.fail(Fault::Commit);

    let (status, body) = harness
        .send(
            Method::PUT,
            "/users/password",
            Some(&token),
            Some(json!({"current_password": "oldpw", "new_password": "newpw"})),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Internal server error");

    let (status, body) = harness
        .send(Method::PUT, "/users/phonenumber/5550104477", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Internal server error");
    assert_eq!(harness.store.get(7).unwrap(), before);

    harness.store.fail(Fault::Begin);
    let (status, body) = harness.send(Method::GET, "/users/", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Internal server error");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let harness = Harness::with_user(7, "oldpw");
    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/users/")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-123")
    );
}
