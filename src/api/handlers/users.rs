//! Authenticated self-service endpoints under `/users`.
//!
//! Flow Overview:
//! 1) Resolve the bearer token into an optional identity claim.
//! 2) Delegate to the account service, which rejects absent claims first.
//! 3) Map account errors to status codes with a JSON `detail` body.

use axum::{
    Json,
    extract::{
        Extension, Path,
        rejection::{JsonRejection, PathRejection},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

use super::auth::{TokenVerifier, principal::identity};
use crate::account::{AccountError, AccountService, User};

#[cfg(test)]
mod tests;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordChangeRequest {
    #[schema(value_type = String, format = Password)]
    pub current_password: SecretString,
    #[schema(value_type = String, format = Password)]
    pub new_password: SecretString,
}

#[utoipa::path(
    get,
    path = "/users/",
    responses(
        (status = 200, description = "Return the authenticated user.", body = User),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 404, description = "No user matches the token."),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_user(
    headers: HeaderMap,
    accounts: Extension<Arc<AccountService>>,
    verifier: Extension<Arc<TokenVerifier>>,
) -> impl IntoResponse {
    let claim = identity(&headers, &verifier);

    match accounts.profile(claim.as_ref()).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    put,
    path = "/users/password",
    request_body = PasswordChangeRequest,
    responses(
        (status = 204, description = "Password changed."),
        (status = 400, description = "Current password is incorrect or the request is invalid."),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 404, description = "No user matches the token."),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn change_password(
    headers: HeaderMap,
    accounts: Extension<Arc<AccountService>>,
    verifier: Extension<Arc<TokenVerifier>>,
    payload: Result<Json<PasswordChangeRequest>, JsonRejection>,
) -> impl IntoResponse {
    let claim = identity(&headers, &verifier);

    // Authentication outranks body validation.
    let request = match payload {
        Ok(Json(request)) => request,
        Err(_) if claim.is_none() => return error_response(&AccountError::Unauthenticated),
        Err(rejection) => {
            debug!("Invalid password change payload: {rejection}");
            return detail(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    match accounts
        .change_password(
            claim.as_ref(),
            request.current_password,
            request.new_password,
        )
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    put,
    path = "/users/phonenumber/{phone_number}",
    params(("phone_number" = String, Path, description = "New phone number")),
    responses(
        (status = 204, description = "Phone number changed."),
        (status = 400, description = "Phone number is not valid."),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 404, description = "No user matches the token."),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn change_phone_number(
    phone_number: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    accounts: Extension<Arc<AccountService>>,
    verifier: Extension<Arc<TokenVerifier>>,
) -> impl IntoResponse {
    let claim = identity(&headers, &verifier);

    let phone_number = match phone_number {
        Ok(Path(phone_number)) => phone_number,
        Err(_) if claim.is_none() => return error_response(&AccountError::Unauthenticated),
        Err(rejection) => {
            debug!("Invalid phone number path: {rejection}");
            return error_response(&AccountError::InvalidPhoneNumber);
        }
    };

    match accounts
        .change_phone_number(claim.as_ref(), &phone_number)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &AccountError) -> Response {
    let status = match err {
        AccountError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AccountError::NotFound => StatusCode::NOT_FOUND,
        AccountError::InvalidCredential
        | AccountError::InvalidPassword
        | AccountError::InvalidPhoneNumber => StatusCode::BAD_REQUEST,
        AccountError::Store(_) | AccountError::Hash(_) => {
            error!("Account operation failed: {err}");
            return detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    detail(status, &err.to_string())
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}
