//! Admin login against the backend users API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{AuthContext, AuthError, AuthResult};
use crate::api::parse_api_error;
use crate::util::normalize_base_url;

pub const LOGIN_PATH: &str = "/api/users/login/";

/// Exchanges admin credentials for a bearer token.
#[derive(Debug, Clone)]
pub struct AdminAuthClient {
    base_url: String,
    client: Client,
}

impl AdminAuthClient {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> AuthResult<Self> {
        let base_url =
            normalize_base_url(base_url.as_ref()).map_err(AuthError::InvalidConfiguration)?;
        Ok(Self {
            base_url,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Sign in and store the issued token in `auth`.
    pub async fn login(
        &self,
        email_or_phone: &str,
        password: &str,
        auth: &AuthContext,
    ) -> AuthResult<()> {
        validate_credentials(email_or_phone, password)?;

        let payload = serde_json::json!({
            "email_or_phone": email_or_phone.trim(),
            "password": password,
        });
        let response = self
            .client
            .post(format!("{}{LOGIN_PATH}", self.base_url))
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(login_error_message(status, &body)));
        }

        let LoginResponse { token } = response.json::<LoginResponse>().await?;
        let token = crate::util::normalize_text_option(token)
            .ok_or_else(|| AuthError::Api("Login response did not include a token".to_string()))?;
        auth.establish(token)?;
        tracing::info!("Admin signed in");
        Ok(())
    }

    /// End the session locally. The backend keeps no server-side session.
    pub fn logout(&self, auth: &AuthContext) {
        auth.invalidate();
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

fn validate_credentials(email_or_phone: &str, password: &str) -> AuthResult<()> {
    if email_or_phone.trim().is_empty() {
        return Err(AuthError::Api("Email or phone is required".to_string()));
    }
    if password.is_empty() {
        return Err(AuthError::Api("Password is required".to_string()));
    }
    Ok(())
}

fn login_error_message(status: StatusCode, body: &str) -> String {
    let field_message = serde_json::from_str::<Value>(body).ok().and_then(|payload| {
        payload
            .get("email_or_phone")
            .and_then(|value| value.get(0))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match field_message {
        Some(message) => format!("{} ({})", message.trim(), status.as_u16()),
        None if status == StatusCode::BAD_REQUEST && body.trim().is_empty() => {
            "Invalid credentials (400)".to_string()
        }
        None => parse_api_error(status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialStore, MemoryCredentialStore};
    use crate::test_support::fresh_token;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn login_error_prefers_email_or_phone_message() {
        let message = login_error_message(
            StatusCode::BAD_REQUEST,
            r#"{"email_or_phone": ["User not found"]}"#,
        );
        assert_eq!(message, "User not found (400)");
    }

    #[test]
    fn login_error_falls_back_to_generic_parse() {
        let message = login_error_message(StatusCode::FORBIDDEN, r#"{"detail": "Admins only"}"#);
        assert_eq!(message, "Admins only (403)");
    }

    #[test]
    fn new_rejects_invalid_base_url() {
        assert!(AdminAuthClient::new("owntrainer.uz", Duration::from_secs(1)).is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn login_stores_issued_token() {
        let server = MockServer::start().await;
        let token = fresh_token();
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(serde_json::json!({
                "email_or_phone": "admin@owntrainer.uz",
                "password": "hunter2",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": token,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::new());
        let auth = AuthContext::new(store.clone());
        let client = AdminAuthClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        client
            .login(" admin@owntrainer.uz ", "hunter2", &auth)
            .await
            .unwrap();

        assert!(auth.is_authenticated());
        assert_eq!(store.load_token().unwrap(), Some(token));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn login_failure_leaves_session_signed_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"email_or_phone": ["Wrong password"]})),
            )
            .mount(&server)
            .await;

        let auth = AuthContext::new(Arc::new(MemoryCredentialStore::new()));
        let client = AdminAuthClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let error = client.login("admin", "bad", &auth).await.unwrap_err();

        assert!(error.to_string().contains("Wrong password"));
        assert!(!auth.is_authenticated());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn blank_credentials_never_reach_the_network() {
        let auth = AuthContext::new(Arc::new(MemoryCredentialStore::new()));
        let client = AdminAuthClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let error = client.login("  ", "pw", &auth).await.unwrap_err();
        assert!(matches!(error, AuthError::Api(_)));
    }
}
