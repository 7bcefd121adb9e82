//! Transport to the content backend.
//!
//! `ContentBackend` is the raw per-kind REST surface and reports every
//! failure. The never-throw policy lives one layer up in
//! [`crate::repository`].

mod endpoints;
mod http;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::auth::AuthError;
use crate::models::{ContentEntity, ImageFile};
use crate::util::compact_text;

pub use endpoints::Endpoints;
pub use http::HttpContentBackend;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable token; nothing was sent
    #[error("Not signed in: {0}")]
    Unauthenticated(#[from] AuthError),
    /// The backend answered 401; stored credentials were cleared
    #[error("Session rejected by the server, sign in again")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected response body: {0}")]
    Decode(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Not supported: {0}")]
    Unsupported(&'static str),
    #[error("Invalid backend configuration: {0}")]
    InvalidConfiguration(String),
}

impl ApiError {
    /// Whether the caller should route to the login view
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthenticated(_) | Self::Unauthorized)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// REST operations for one content kind.
///
/// Step calls address the parent by its server id; steps carrying a local
/// id are sent without one.
#[allow(async_fn_in_trait)]
pub trait ContentBackend<E: ContentEntity> {
    async fn list(&self) -> ApiResult<Vec<E>>;
    async fn get(&self, id: &str) -> ApiResult<E>;
    async fn create(&self, draft: &E) -> ApiResult<E>;
    async fn update(&self, id: &str, entity: &E) -> ApiResult<E>;
    async fn delete(&self, id: &str) -> ApiResult<()>;

    /// Upload the main image; returns the stored URL when the backend echoes one
    async fn upload_image(&self, id: &str, file: &ImageFile) -> ApiResult<Option<String>>;

    async fn create_step(&self, parent_id: &str, step: &E::Step) -> ApiResult<E::Step>;
    async fn update_step(&self, parent_id: &str, step_id: &str, step: &E::Step)
        -> ApiResult<E::Step>;
    async fn upload_step_image(
        &self,
        parent_id: &str,
        step_id: &str,
        file: &ImageFile,
    ) -> ApiResult<Option<String>>;
}

/// Human-readable message from an error response body.
///
/// Looks at `detail`, `message` and `error`, then at the first field error
/// of a validation payload such as `{"name": ["This field is required."]}`.
pub fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(payload)) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(message) = payload.get(key).and_then(Value::as_str) {
                return format!("{} ({})", message.trim(), status.as_u16());
            }
        }
        if let Some((field, message)) = payload
            .iter()
            .find_map(|(field, value)| first_message(value).map(|message| (field, message)))
        {
            return format!("{field}: {} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn first_message(value: &Value) -> Option<&str> {
    match value {
        Value::String(message) => Some(message),
        Value::Array(items) => items.iter().find_map(first_message),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_api_error_prefers_detail() {
        let message = parse_api_error(
            StatusCode::FORBIDDEN,
            r#"{"detail": "You do not have permission", "name": ["x"]}"#,
        );
        assert_eq!(message, "You do not have permission (403)");
    }

    #[test]
    fn parse_api_error_uses_first_field_error() {
        let message = parse_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"block_name": ["This field may not be blank."]}"#,
        );
        assert_eq!(message, "block_name: This field may not be blank. (400)");
    }

    #[test]
    fn parse_api_error_falls_back_to_body_or_status() {
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down (502)"
        );
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, "  "),
            "HTTP 500"
        );
    }

    #[test]
    fn auth_errors_route_to_login() {
        assert!(ApiError::Unauthorized.is_auth());
        assert!(ApiError::Unauthenticated(AuthError::Expired).is_auth());
        assert!(!ApiError::Api("boom".to_string()).is_auth());
    }
}
