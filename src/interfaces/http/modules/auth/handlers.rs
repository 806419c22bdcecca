//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, Json};

use super::dto::{AccessTokenResponse, LoginBody, RefreshBody, TokenPairResponse};
use crate::application::identity::{JwtTokenIssuer, LoginResolver, TokenIssuer};
use crate::infrastructure::database::repositories::UserRepository;
use crate::interfaces::http::common::{ApiError, ErrorResponse, ValidatedJson};

pub type SharedLoginResolver = Arc<LoginResolver<UserRepository, JwtTokenIssuer<UserRepository>>>;

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub login: SharedLoginResolver,
}

#[utoipa::path(
    post,
    path = "/api/token/",
    tag = "Authentication",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Access and refresh tokens", body = TokenPairResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 401, description = "No active account found with the given credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    ValidatedJson(body): ValidatedJson<LoginBody>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let pair = state.login.login(body.into()).await?;
    Ok(Json(pair.into()))
}

#[utoipa::path(
    post,
    path = "/api/token/refresh/",
    tag = "Authentication",
    request_body = RefreshBody,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Token is invalid or expired", body = ErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<AuthHandlerState>,
    ValidatedJson(body): ValidatedJson<RefreshBody>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let token = state.login.issuer().refresh(&body.refresh_token).await?;
    Ok(Json(token.into()))
}
