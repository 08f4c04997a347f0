//! HTTP API client for the Passbolt REST API.
//!
//! Handles all low-level HTTP communication with a Passbolt server:
//! - Cookie-jar session with `X-CSRF-Token` header injection
//! - Response envelope unwrapping (`ApiResponse<T>`)
//! - Error mapping from HTTP status codes to `PassboltError`
//!
//! All calls block on their network round trip; the client holds the only
//! mutable session state and is not meant to be shared across threads.

use crate::passbolt::config::PassboltConfig;
use crate::passbolt::types::*;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Passbolt API client.
#[derive(Debug)]
pub struct PassboltApiClient {
    /// HTTP client with cookie store.
    client: Client,
    /// Server base URL.
    base_url: String,
    /// Current session state.
    session: SessionState,
}

impl PassboltApiClient {
    /// Create a new API client.
    pub fn new(base_url: &str, verify_tls: bool, timeout_secs: u64) -> Result<Self, PassboltError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!verify_tls)
            .timeout(Duration::from_secs(timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(|e| PassboltError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: SessionState::default(),
        })
    }

    /// Create from a `PassboltConfig`.
    pub fn from_config(config: &PassboltConfig) -> Result<Self, PassboltError> {
        Self::new(&config.base_url, config.verify_tls, config.timeout_secs)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get a reference to the current session.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Get a mutable reference to the session.
    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// Set the session state.
    pub fn set_session(&mut self, session: SessionState) {
        self.session = session;
    }

    /// Check if authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.session.authenticated
    }

    // ── Request building ────────────────────────────────────────────

    /// Build a URL from a path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a request builder carrying the session's CSRF token.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        let mut builder = self.client.request(method, &url);
        if let Some(ref csrf) = self.session.csrf_token {
            builder = builder.header("X-CSRF-Token", csrf.as_str());
        }
        builder
    }

    // ── Response handling ───────────────────────────────────────────

    /// Execute a request and parse the standard Passbolt envelope.
    pub fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<ApiResponse<T>, PassboltError> {
        let response = builder
            .send()
            .map_err(|e| PassboltError::network(format!("Request failed: {}", e)))?;
        self.handle_response(response)
    }

    /// Execute a request, returning just the body. The envelope code must
    /// report success.
    pub fn execute_body<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, PassboltError> {
        let resp = self.execute::<T>(builder)?;
        if !resp.header.is_success() {
            return Err(PassboltError::http(
                resp.header.code,
                format!("Server rejected request: {}", resp.header.message),
            ));
        }
        Ok(resp.body)
    }

    /// Handle a raw HTTP response.
    fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<ApiResponse<T>, PassboltError> {
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            let text = response
                .text()
                .map_err(|e| PassboltError::parse(format!("Failed to read response body: {}", e)))?;
            serde_json::from_str(&text).map_err(|e| {
                PassboltError::parse(format!("Failed to parse response JSON: {} (url: {})", e, url))
            })
        } else {
            let text = response.text().unwrap_or_default();
            Err(error_from_status(status, &text))
        }
    }

    /// Execute a request returning the raw response (for the auth flow,
    /// which reads headers).
    pub fn execute_raw(&self, builder: RequestBuilder) -> Result<Response, PassboltError> {
        builder
            .send()
            .map_err(|e| PassboltError::network(format!("Request failed: {}", e)))
    }

    // ── Convenience HTTP methods ────────────────────────────────────

    /// GET request with full envelope.
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, PassboltError> {
        self.execute(self.request(Method::GET, path))
    }

    /// GET returning just the body.
    pub fn get_body<T: DeserializeOwned>(&self, path: &str) -> Result<T, PassboltError> {
        self.execute_body(self.request(Method::GET, path))
    }

    /// GET returning the raw response.
    pub fn get_raw(&self, path: &str) -> Result<Response, PassboltError> {
        self.execute_raw(self.request(Method::GET, path))
    }

    /// POST request with JSON body, returning the raw response.
    pub fn post_raw<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, PassboltError> {
        self.execute_raw(self.request(Method::POST, path).json(body))
    }

    /// POST request with JSON body.
    pub fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, PassboltError> {
        self.execute(self.request(Method::POST, path).json(body))
    }

    /// POST returning just the body.
    pub fn post_body<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PassboltError> {
        self.execute_body(self.request(Method::POST, path).json(body))
    }

    /// PUT request with JSON body.
    pub fn put<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, PassboltError> {
        self.execute(self.request(Method::PUT, path).json(body))
    }

    /// PUT returning just the body.
    pub fn put_body<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PassboltError> {
        self.execute_body(self.request(Method::PUT, path).json(body))
    }
}

/// Map an HTTP status to a `PassboltError` carrying status and body text.
pub fn error_from_status(status: StatusCode, body: &str) -> PassboltError {
    match status {
        StatusCode::UNAUTHORIZED => PassboltError::http(401, "Authentication required"),
        StatusCode::FORBIDDEN => PassboltError::http(403, format!("Access denied: {}", body)),
        StatusCode::NOT_FOUND => PassboltError::http(404, format!("Not found: {}", body)),
        s => PassboltError::http(s.as_u16(), body.to_string()),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PassboltApiClient::new("https://example.com", true, 30);
        assert!(client.is_ok());
        let c = client.unwrap();
        assert_eq!(c.base_url(), "https://example.com");
        assert!(!c.is_authenticated());
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let client = PassboltApiClient::new("https://example.com/", true, 30).unwrap();
        assert_eq!(client.base_url(), "https://example.com");
    }

    #[test]
    fn test_client_from_config() {
        let config = PassboltConfig {
            base_url: "https://passbolt.test/".into(),
            ..Default::default()
        };
        let client = PassboltApiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://passbolt.test");
    }

    #[test]
    fn test_session_management() {
        let mut client = PassboltApiClient::new("https://example.com", true, 30).unwrap();
        assert!(!client.is_authenticated());

        client.set_session(SessionState {
            authenticated: true,
            csrf_token: Some("test-token".into()),
            ..Default::default()
        });

        assert!(client.is_authenticated());
        assert_eq!(client.session().csrf_token.as_deref(), Some("test-token"));
    }

    #[test]
    fn test_error_from_status_forbidden() {
        let err = error_from_status(StatusCode::FORBIDDEN, "denied");
        assert_eq!(err.kind, PassboltErrorKind::HttpError);
        assert_eq!(err.status, Some(403));
        assert!(err.message.contains("denied"));
    }

    #[test]
    fn test_error_from_status_server_error() {
        let err = error_from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(err.status, Some(500));
        assert_eq!(err.message, "boom");
    }
}
