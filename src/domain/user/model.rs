use chrono::{DateTime, Utc};

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserRole {
    #[default]
    Patient,
    Doctor,
    Admin,
}

/// User model
#[derive(Clone, Debug)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_active: bool,
    pub first_name: String,
    pub last_name: String,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Listed in the public doctors directory.
    pub fn is_listed_doctor(&self) -> bool {
        self.role == UserRole::Doctor && self.is_verified
    }
}
