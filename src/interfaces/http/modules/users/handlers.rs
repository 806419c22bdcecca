//! User API handlers
//!
//! Thin wrappers over `UserService` from the application/identity layer.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::debug;

use super::dto::{CreateUserRequest, UserDto};
use crate::application::identity::UserService;
use crate::infrastructure::database::repositories::UserRepository;
use crate::interfaces::http::common::{ApiError, ErrorResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::request_id::RequestId;

/// User handler state: concrete over `UserRepository` for Axum compatibility.
#[derive(Clone)]
pub struct UserHandlerState {
    pub user_service: Arc<UserService<UserRepository>>,
}

fn to_dtos(users: Vec<crate::domain::User>) -> Vec<UserDto> {
    users.into_iter().map(UserDto::from).collect()
}

#[utoipa::path(
    get,
    path = "/api/users/",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = [UserDto]),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<UserHandlerState>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let users = state.user_service.list_users().await?;
    Ok(Json(to_dtos(users)))
}

#[utoipa::path(
    post,
    path = "/api/users/",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 400, description = "Validation error", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let dto = request.into_dto()?;
    let user = state.user_service.create_user(dto).await?;
    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserDto),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state.user_service.get_user(&id).await?;
    Ok(Json(UserDto::from(user)))
}

/// The caller's own record. The identity comes only from the verified token.
#[utoipa::path(
    get,
    path = "/api/users/profile/",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated user's record", body = UserDto),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn get_profile(
    State(state): State<UserHandlerState>,
    Extension(caller): Extension<AuthenticatedUser>,
    request_id: Option<Extension<RequestId>>,
) -> Result<Json<UserDto>, ApiError> {
    debug!(
        request_id = request_id.as_ref().map(|Extension(id)| id.0.as_str()),
        user_id = %caller.user_id,
        username = %caller.username,
        role = %caller.role,
        "Profile requested"
    );
    let user = state.user_service.profile(&caller.user_id).await?;
    Ok(Json(UserDto::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/doctors/",
    tag = "Users",
    responses(
        (status = 200, description = "Verified doctors", body = [UserDto])
    )
)]
pub async fn list_doctors(
    State(state): State<UserHandlerState>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let doctors = state.user_service.list_doctors().await?;
    Ok(Json(to_dtos(doctors)))
}
