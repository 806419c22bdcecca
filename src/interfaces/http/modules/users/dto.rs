//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::application::identity::{role_to_str, str_to_role};
use crate::domain::{CreateUserDto, DomainError, DomainResult, User, UserRole};

/// User API representation. The password hash never leaves the service.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    /// patient, doctor or admin
    pub role: String,
    pub is_verified: bool,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: role_to_str(&u.role).to_string(),
            is_verified: u.is_verified,
            first_name: u.first_name,
            last_name: u.last_name,
            specialization: u.specialization,
            phone: u.phone,
            created_at: u.created_at,
        }
    }
}

/// Create user request
///
/// Required keys default to empty so a missing key is reported per field
/// rather than as a deserialization failure.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(
        custom(function = "required"),
        length(max = 150, message = "Ensure this field has no more than 150 characters.")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "required"), email(message = "Enter a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(
        custom(function = "required"),
        length(
            min = 8,
            max = 128,
            message = "Ensure this field has between 8 and 128 characters."
        )
    )]
    pub password: String,
    /// patient (default) or doctor
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub specialization: Option<String>,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

fn required(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required.".into());
        return Err(err);
    }
    Ok(())
}

impl CreateUserRequest {
    /// Only patient and doctor accounts can be opened here, always unverified.
    pub fn into_dto(self) -> DomainResult<CreateUserDto> {
        let role = match self.role.as_deref() {
            None | Some("") => UserRole::Patient,
            Some(raw) => match str_to_role(raw) {
                Some(role @ (UserRole::Patient | UserRole::Doctor)) => role,
                _ => {
                    return Err(DomainError::validation(
                        "role",
                        format!("\"{}\" is not a valid choice.", raw),
                    ))
                }
            },
        };

        Ok(CreateUserDto {
            username: self.username,
            email: self.email,
            password: self.password,
            role,
            is_verified: false,
            first_name: self.first_name,
            last_name: self.last_name,
            specialization: self.specialization.filter(|s| !s.is_empty()),
            phone: self.phone.filter(|s| !s.is_empty()),
        })
    }
}
