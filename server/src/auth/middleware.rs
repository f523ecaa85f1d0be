//! Authentication extractor.
//!
//! The bearer token names the calling user. Token verification belongs to
//! the identity provider in front of this server; here the token is only
//! compared against the `userId` a request acts on.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::AppState;

/// Caller identity extracted from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// The bearer token, or `None` for an anonymous request in development mode
    pub user_id: Option<String>,
}

impl AuthUser {
    /// Check that the caller may act on `user_id`'s budget.
    pub fn authorize(&self, user_id: &str) -> Result<(), AppError> {
        match &self.user_id {
            Some(caller) if caller != user_id => Err(AppError::Forbidden(format!(
                "user {} may not access the budget of user {}",
                caller, user_id
            ))),
            _ => Ok(()),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match auth_header {
            Some(header) if header.starts_with("Bearer ") => {
                let token = header.trim_start_matches("Bearer ").trim();
                if token.is_empty() {
                    return Err(AppError::Unauthorized("Empty bearer token"));
                }
                Ok(AuthUser {
                    user_id: Some(token.to_string()),
                })
            }
            Some(_) => Err(AppError::Unauthorized(
                "Invalid authorization header format",
            )),
            None if state.config.requires_auth() => {
                Err(AppError::Unauthorized("Missing authorization header"))
            }
            // Development mode: no secret configured, allow anonymous access
            None => Ok(AuthUser { user_id: None }),
        }
    }
}
