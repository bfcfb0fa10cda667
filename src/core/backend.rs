use crate::core::{ConfigProvider, ServicePayload};
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::validate_path_segment;
use reqwest::header::{HeaderMap, AUTHORIZATION, COOKIE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

/// Pass-through client for the external marketplace API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: Client,
    credentials: HeaderMap,
}

impl BackendClient {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(config.backend_url(), client))
    }

    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            credentials: HeaderMap::new(),
        }
    }

    /// Copy of this client that passes the caller's `Authorization` and
    /// `Cookie` headers on to the backend.
    pub fn authorized(&self, headers: &HeaderMap) -> Self {
        let mut credentials = HeaderMap::new();
        for name in [AUTHORIZATION, COOKIE] {
            for value in headers.get_all(&name) {
                credentials.append(name.clone(), value.clone());
            }
        }

        Self {
            credentials,
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Forwards a request and relays the backend's status and JSON body.
    ///
    /// Non-JSON bodies are wrapped as `{"error": text}`; transport failures
    /// become `502` with the same envelope.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut url = self.url(path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }

        tracing::debug!("Forwarding {} {}", method, url);
        let mut request = self
            .client
            .request(method, &url)
            .headers(self.credentials.clone());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Backend unreachable for {}: {}", url, e);
                return (
                    StatusCode::BAD_GATEWAY,
                    serde_json::json!({ "error": format!("Backend unreachable: {}", e) }),
                );
            }
        };

        let status = response.status();
        tracing::debug!("Backend responded {} for {}", status, url);

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return (
                    StatusCode::BAD_GATEWAY,
                    serde_json::json!({ "error": format!("Failed to read backend response: {}", e) }),
                );
            }
        };

        if text.trim().is_empty() {
            return (status, Value::Null);
        }

        let body = serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({ "error": text }));
        (status, body)
    }

    pub async fn create_service(&self, payload: &ServicePayload) -> Result<Value> {
        let body = serde_json::to_value(payload)?;
        let (status, body) = self.forward(Method::POST, "services", None, Some(body)).await;

        if !status.is_success() {
            return Err(MarketError::BackendError {
                status: status.as_u16(),
                message: error_message(&body)
                    .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16())),
            });
        }

        Ok(body)
    }
}

/// Percent-encodes one caller-supplied path segment after refusing
/// separators and dot segments, so it can never leave its parent path.
pub fn path_segment(field_name: &str, value: &str) -> Result<String> {
    validate_path_segment(field_name, value)?;
    // byte_serialize writes spaces as '+'; a literal '+' comes out as %2B.
    Ok(url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20"))
}

/// Picks a human readable message out of a backend error body.
pub fn error_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient::with_client(&server.base_url(), Client::new())
    }

    #[test]
    fn test_url_joining() {
        let backend = BackendClient::with_client("http://api.local/v1/", Client::new());
        assert_eq!(backend.url("/services"), "http://api.local/v1/services");
        assert_eq!(backend.url("suppliers/7"), "http://api.local/v1/suppliers/7");
    }

    #[test]
    fn test_error_message_prefers_message_field() {
        let body = serde_json::json!({ "message": "Insufficient funds", "error": "E42" });
        assert_eq!(error_message(&body).as_deref(), Some("Insufficient funds"));
        let body = serde_json::json!({ "error": "Not found" });
        assert_eq!(error_message(&body).as_deref(), Some("Not found"));
        assert_eq!(error_message(&serde_json::json!({ "message": "" })), None);
    }

    #[test]
    fn test_path_segment_encoding() {
        assert_eq!(path_segment("id", "svc-1").unwrap(), "svc-1");
        assert_eq!(path_segment("id", "a b+c").unwrap(), "a%20b%2Bc");
        assert_eq!(path_segment("id", "50%").unwrap(), "50%25");
        assert!(path_segment("id", "..").is_err());
        assert!(path_segment("id", "../wallet/u2/balance").is_err());
    }

    #[tokio::test]
    async fn test_authorized_client_forwards_credentials() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/users/u1")
                .header("authorization", "Bearer tok")
                .cookie("session", "tok");
            then.status(200).json_body(serde_json::json!({ "id": "u1" }));
        });

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer tok".parse().unwrap());
        headers.insert(COOKIE, "session=tok".parse().unwrap());
        headers.insert("x-debug", "1".parse().unwrap());

        let backend = client_for(&server);
        let (status, _) = backend
            .authorized(&headers)
            .forward(reqwest::Method::GET, "users/u1", None, None)
            .await;

        mock.assert();
        assert_eq!(status, StatusCode::OK);

        let (status, _) = backend
            .forward(reqwest::Method::GET, "users/u1", None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_forward_relays_status_and_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/suppliers").query_param("page", "2");
            then.status(206)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([{ "id": "s1" }]));
        });

        let (status, body) = client_for(&server)
            .forward(reqwest::Method::GET, "/suppliers", Some("page=2"), None)
            .await;

        mock.assert();
        assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(body[0]["id"], "s1");
    }

    #[tokio::test]
    async fn test_forward_wraps_plain_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(DELETE).path("/products/9");
            then.status(500).body("boom");
        });

        let (status, body) = client_for(&server)
            .forward(reqwest::Method::DELETE, "products/9", None, None)
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": "boom" }));
    }

    #[tokio::test]
    async fn test_forward_unreachable_backend() {
        let backend = BackendClient::with_client("http://127.0.0.1:1", Client::new());
        let (status, body) = backend.forward(reqwest::Method::GET, "services", None, None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().starts_with("Backend unreachable"));
    }
}
