use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use stepin_protocol::{ApiRequest, ErrorBody, Method, ProtocolError, decode};
use thiserror::Error;

use crate::config::ClientConfig;

/// Failures surfaced by the HTTP layer, uninterpreted.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with status {status}")]
    Status { status: u16, body: Value },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Message embedded in the server's error body, if any
    pub fn server_message(&self) -> Option<String> {
        match self {
            Self::Status { body, .. } => ErrorBody::from_value(body).message(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Parsed body and status of a successful call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(decode(&self.body)?)
    }
}

/// The seam between orchestration and the network.
///
/// Implementations perform exactly one HTTP exchange per call: no retries,
/// no caching.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// HTTP accessor bound to one base address with fixed JSON headers.
///
/// No cookie store is configured, so no credentials travel with requests.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(config.base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse, ApiError> {
        self.execute(with_query(ApiRequest::new(Method::Get, path), query))
            .await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<ApiResponse, ApiError> {
        let mut request = ApiRequest::new(Method::Post, path);
        request.body = body;
        self.execute(request).await
    }

    pub async fn delete(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse, ApiError> {
        self.execute(with_query(ApiRequest::new(Method::Delete, path), query))
            .await
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, ApiError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        reqwest::Url::parse(&url).map_err(|e| ApiError::InvalidRequest(format!("{url}: {e}")))
    }
}

fn with_query(request: ApiRequest, query: &[(&str, &str)]) -> ApiRequest {
    query
        .iter()
        .fold(request, |request, (key, value)| request.query(key, value))
}

#[async_trait]
impl Transport for ApiClient {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url(&request.path)?;

        let builder = match request.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Delete => self.http.delete(url),
        };
        let builder = if request.query.is_empty() {
            builder
        } else {
            builder.query(&request.query)
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        tracing::debug!(method = request.method.as_str(), path = %request.path, "Sending request");

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let body = if bytes.is_empty() {
            Value::Null
        } else if status.is_success() {
            serde_json::from_slice(&bytes).map_err(ProtocolError::from)?
        } else {
            // Error pages are not always JSON; keep the text so it can still be logged
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one connection, answer it with a canned response and hand back
    /// the raw request that was received.
    async fn serve_once(
        status_line: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/api", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&chunk[..n]);
                if request_complete(&raw) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8(raw).unwrap()
        });

        (base_url, server)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= end + 4 + length
    }

    fn header_lines(raw: &str) -> Vec<String> {
        raw.split("\r\n\r\n")
            .next()
            .unwrap()
            .lines()
            .skip(1)
            .map(str::to_ascii_lowercase)
            .collect()
    }

    #[tokio::test]
    async fn test_get_sends_json_headers_and_query() {
        let (base_url, server) =
            serve_once("200 OK", "application/json", r#"{"meetings":[5]}"#).await;
        let client = ApiClient::new(base_url).unwrap();

        let response = client
            .get("/meetings/active", &[("cache", "123")])
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({ "meetings": [5] }));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /api/meetings/active?cache=123 HTTP/1.1\r\n"));
        let headers = header_lines(&raw);
        assert!(headers.contains(&"accept: application/json".to_string()));
        assert!(headers.contains(&"content-type: application/json".to_string()));
        assert!(!headers.iter().any(|h| h.starts_with("cookie:")));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let (base_url, server) =
            serve_once("200 OK", "application/json", r#"{"success":true}"#).await;
        let client = ApiClient::new(base_url).unwrap();

        let response = client
            .post(
                "/meetings/4/join",
                Some(json!({ "email": "ana@example.com" })),
            )
            .await
            .unwrap();

        assert_eq!(response.body, json!({ "success": true }));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/meetings/4/join HTTP/1.1\r\n"));
        let body = raw.split("\r\n\r\n").nth(1).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(body).unwrap(),
            json!({ "email": "ana@example.com" })
        );
    }

    #[tokio::test]
    async fn test_error_status_keeps_parsed_body() {
        let (base_url, server) = serve_once(
            "404 Not Found",
            "application/json",
            r#"{"detail":"Meeting not found"}"#,
        )
        .await;
        let client = ApiClient::new(base_url).unwrap();

        let err = client
            .delete("/meetings/5", &[("email", "ana@example.com")])
            .await
            .unwrap_err();

        match &err {
            ApiError::Status { status, body } => {
                assert_eq!(*status, 404);
                assert_eq!(body, &json!({ "detail": "Meeting not found" }));
            }
            other => panic!("expected a status error, got {other:?}"),
        }
        assert_eq!(err.server_message().as_deref(), Some("Meeting not found"));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("DELETE /api/meetings/5?email=ana%40example.com HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn test_non_json_error_page_is_kept_as_text() {
        let (base_url, server) =
            serve_once("502 Bad Gateway", "text/html", "<h1>Bad Gateway</h1>").await;
        let client = ApiClient::new(base_url).unwrap();

        let err = client.get("/meetings/upcoming", &[]).await.unwrap_err();

        assert_eq!(err.status(), Some(502));
        assert!(matches!(
            &err,
            ApiError::Status { body: Value::String(text), .. } if text == "<h1>Bad Gateway</h1>"
        ));
        assert_eq!(err.server_message(), None);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/api", listener.local_addr().unwrap());
        drop(listener);
        let client = ApiClient::new(base_url).unwrap();

        let err = client.get("/users/ana@example.com", &[]).await.unwrap_err();

        assert!(matches!(err, ApiError::Network(_)));
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let client = ApiClient::new("http://127.0.0.1:8000/api/").unwrap();

        assert_eq!(client.base_url(), "http://127.0.0.1:8000/api");
        assert_eq!(
            client.url("/meetings/active").unwrap().as_str(),
            "http://127.0.0.1:8000/api/meetings/active"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let client = ApiClient::new("not a url").unwrap();

        assert!(matches!(
            client.url("/users"),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_server_message_only_for_status_errors() {
        let err = ApiError::Status {
            status: 400,
            body: json!({ "detail": "User not found" }),
        };
        assert_eq!(err.server_message().as_deref(), Some("User not found"));
        assert_eq!(err.status(), Some(400));

        let err = ApiError::Network("connection refused".into());
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn test_response_json() {
        let response = ApiResponse {
            status: 200,
            body: json!({ "success": true }),
        };
        let parsed: stepin_protocol::SuccessResponse = response.json().unwrap();

        assert!(parsed.success);
    }
}
