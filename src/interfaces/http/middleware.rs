//! Authentication middleware for Axum

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::errors::ErrorKind;
use tracing::debug;

use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig, TokenClaims, TokenKind};
use crate::interfaces::http::common::ErrorResponse;

/// Authentication error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

/// Authentication state containing the JWT config
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

/// Caller identity taken from a verified access token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub username: String,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Bearer access-token middleware.
///
/// Refresh tokens are rejected here; they are only accepted by the refresh
/// endpoint.
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(auth_header) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from)
    else {
        return auth_error_response(AuthError::MissingToken);
    };

    let Some(token) = extract_token(&auth_header) else {
        return auth_error_response(AuthError::InvalidToken);
    };

    match verify_token(token, &auth_state.jwt_config, TokenKind::Access) {
        Ok(claims) => {
            let user = AuthenticatedUser::from_claims(claims);
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
            auth_error_response(AuthError::ExpiredToken)
        }
        Err(e) => {
            debug!("Bearer token rejected: {}", e);
            auth_error_response(AuthError::InvalidToken)
        }
    }
}

fn auth_error_response(error: AuthError) -> Response {
    let message = match error {
        AuthError::MissingToken => "Authentication credentials were not provided.",
        AuthError::InvalidToken => "Invalid authentication token",
        AuthError::ExpiredToken => "Token has expired",
    };

    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(message))).into_response()
}
