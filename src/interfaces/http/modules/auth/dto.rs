//! Authentication DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::identity::{AccessToken, LoginRequest, TokenPair};

/// Login payload. `username` may hold either a username or an email.
///
/// Both fields are optional at the wire level; missing values are reported
/// by the token issuer as field errors.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginBody {
    #[serde(default)]
    #[validate(length(max = 254))]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl From<LoginBody> for LoginRequest {
    fn from(body: LoginBody) -> Self {
        Self {
            username: body.username,
            password: body.password,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: pair.token_type,
            expires_in: pair.expires_in,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshBody {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<AccessToken> for AccessTokenResponse {
    fn from(token: AccessToken) -> Self {
        Self {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
        }
    }
}
