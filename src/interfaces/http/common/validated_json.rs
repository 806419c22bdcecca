//! Validated JSON extractor for Axum
//!
//! `ValidatedJson<T>` works like `axum::Json<T>`, but additionally runs
//! `validator::Validate::validate()` on the deserialized value.
//! Both malformed JSON and failed validation answer 400; validation
//! failures carry every failing field in `fields`. Payloads that want
//! missing keys reported per field give those keys `#[serde(default)]`
//! and check presence in `validate()`.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::ErrorResponse;

/// An extractor that deserializes JSON and validates it.
///
/// # Usage
///
/// ```ignore
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct RefreshBody {
///     #[validate(length(min = 1))]
///     refresh_token: String,
/// }
///
/// async fn handler(ValidatedJson(body): ValidatedJson<RefreshBody>) {
///     // `body` is guaranteed to pass validation
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

/// Error type for `ValidatedJson` extraction failures.
pub enum ValidatedJsonRejection {
    /// JSON parsing failed.
    JsonError(JsonRejection),
    /// Validation failed.
    ValidationError(validator::ValidationErrors),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let body = match self {
            Self::JsonError(rejection) => {
                ErrorResponse::new(format!("Invalid JSON: {}", rejection.body_text()))
            }
            Self::ValidationError(errors) => {
                let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
                for (field, errs) in errors.field_errors() {
                    let messages = errs.iter().map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    });
                    fields.entry(field.to_string()).or_default().extend(messages);
                }
                ErrorResponse::with_fields(fields)
            }
        };

        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(
        req: axum::extract::Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonError)?;

        value
            .validate()
            .map_err(ValidatedJsonRejection::ValidationError)?;

        Ok(ValidatedJson(value))
    }
}

// ── Tests ──────────────────────────────────────────────────────
