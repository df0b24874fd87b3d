//! Validated JSON extraction for request bodies.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::auth::validation::{normalize_email, validate_email};
use crate::web::error::ApiError;

/// A JSON extractor that runs `validator` rules after deserializing.
///
/// Malformed JSON becomes a `BAD_REQUEST`; rule failures become a
/// `VALIDATION_ERROR` with per-field messages.
///
/// ```ignore
/// async fn create_folder(
///     ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
/// ) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
///     // req.name has already passed its rules
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

/// File and folder names: not blank and free of control characters.
pub fn display_name(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("not_empty_trimmed")
            .with_message("Must not be empty".into()));
    }
    if value.chars().any(char::is_control) {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}

/// Emails are checked after trimming and lower-casing, the form they are stored in.
pub fn email_address(value: &str) -> Result<(), validator::ValidationError> {
    validate_email(&normalize_email(value)).map_err(|e| {
        validator::ValidationError::new("email").with_message(e.to_string().into())
    })
}
