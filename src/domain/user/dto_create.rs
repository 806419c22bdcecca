use super::UserRole;

/// Input for creating an account. `password` is plain text here and is
/// hashed before the record reaches the store.
#[derive(Debug, Clone, Default)]
pub struct CreateUserDto {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub first_name: String,
    pub last_name: String,
    pub specialization: Option<String>,
    pub phone: Option<String>,
}
