//! Authenticated HTTP access to the portal backend.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::session::SessionStore;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        })
    }
}

/// Request relative to the backend base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves one request over the wire.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Production transport over `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self.client.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!(method = %request.method, path = %request.path, error = %e, "request failed");
            Error::Transport(format!("{} {} failed: {}", request.method, request.path, e))
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Shared wrapper every client goes through: attaches the bearer token,
/// maps non-2xx responses to [`Error::Api`] and decodes bodies.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Send with auth attached; non-2xx becomes an error.
    pub async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        if request.body.is_some() && request.header_value("Content-Type").is_none() {
            request = request.header("Content-Type", "application/json");
        }
        if let Some(token) = self.session.token() {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let method = request.method;
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        debug!(%method, %path, status = response.status, "response received");

        if !response.is_success() {
            let message = error_message(&response.body);
            error!(%method, %path, status = response.status, %message, "backend rejected request");
            return Err(Error::Api {
                status: response.status,
                message,
            });
        }
        Ok(response)
    }

    /// Send and return the JSON body as a loose value for boundary decoding.
    pub async fn send_json(&self, request: HttpRequest) -> Result<Value> {
        let response = self.execute(request).await?;
        if response.body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&response.body)
            .map_err(|e| Error::Decode(format!("Response is not JSON: {}", e)))
    }

    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let mut request = HttpRequest::new(Method::Get, path);
        for (key, value) in query {
            request = request.query(key, value);
        }
        self.send_json(request).await
    }

    pub async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value> {
        let request = HttpRequest::new(Method::Post, path).json(serde_json::to_value(body)?);
        self.send_json(request).await
    }

    pub async fn patch_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value> {
        let request = HttpRequest::new(Method::Patch, path).json(serde_json::to_value(body)?);
        self.send_json(request).await
    }

    /// Raw binary body, used for PDF downloads.
    pub async fn get_bytes(&self, path: &str) -> Result<Bytes> {
        let response = self.execute(HttpRequest::new(Method::Get, path)).await?;
        Ok(response.body)
    }
}

/// Percent-encode one path segment.
pub fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Backend message for a failed response: `message`, then string `detail`.
fn error_message(body: &[u8]) -> String {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .and_then(Value::as_str)
                .or_else(|| v.get("detail").and_then(Value::as_str))
        })
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "API request failed".to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording transport for exercising clients without a server.

    use super::*;
    use parking_lot::Mutex;

    type Responder = dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync;

    pub struct FakeTransport {
        responder: Box<Responder>,
        pub requests: Mutex<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        pub fn new<F>(responder: F) -> Arc<Self>
        where
            F: Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
        {
            Arc::new(Self {
                responder: Box::new(responder),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub fn sent(&self) -> Vec<HttpRequest> {
            self.requests.lock().clone()
        }

        pub fn count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.requests.lock().push(request.clone());
            (self.responder)(&request)
        }
    }

    pub fn json(status: u16, body: Value) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status,
            body: Bytes::from(body.to_string()),
        })
    }

    pub fn ok(body: Value) -> Result<HttpResponse> {
        json(200, body)
    }

    pub fn api(transport: Arc<FakeTransport>) -> ApiClient {
        let session = SessionStore::new(Arc::new(crate::store::MemoryStore::new()));
        ApiClient::new(transport, session)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::models::{Session, UserProfile, UserRole, UserStatus};
    use serde_json::json;

    fn login(api: &ApiClient, token: &str) {
        api.session()
            .save(&Session {
                token: token.to_string(),
                profile: UserProfile {
                    id: "1".into(),
                    username: "user".into(),
                    email: "user@example.com".into(),
                    role: UserRole::User,
                    status: UserStatus::Active,
                },
            })
            .unwrap();
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_logged_in() {
        let transport = FakeTransport::new(|_| ok(json!({"status": "success"})));
        let api = api(transport.clone());

        api.get_json("/api/reports", &[]).await.unwrap();
        login(&api, "tok-123");
        api.post_json("/api/get-data", &json!({"a": 1})).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].header_value("Authorization"), None);
        assert_eq!(sent[1].header_value("authorization"), Some("Bearer tok-123"));
        assert_eq!(sent[1].header_value("Content-Type"), Some("application/json"));
        assert_eq!(sent[1].method, Method::Post);
    }

    #[tokio::test]
    async fn non_success_uses_backend_message_then_detail() {
        let transport = FakeTransport::new(|req| match req.path.as_str() {
            "/message" => json(400, json!({"message": "Bad keywords"})),
            "/detail" => json(404, json!({"detail": "Search not found"})),
            _ => Ok(HttpResponse {
                status: 502,
                body: Bytes::from_static(b"<html>bad gateway</html>"),
            }),
        });
        let api = api(transport);

        let err = api.get_json("/message", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 400, ref message } if message == "Bad keywords"));

        let err = api.get_json("/detail", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 404, ref message } if message == "Search not found"));

        let err = api.get_json("/other", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 502, ref message } if message == "API request failed"));
    }

    #[tokio::test]
    async fn binary_bodies_pass_through() {
        let transport = FakeTransport::new(|_| {
            Ok(HttpResponse {
                status: 200,
                body: Bytes::from_static(b"%PDF-1.7"),
            })
        });
        let api = api(transport);
        let bytes = api.get_bytes("/api/download-report/7").await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.7");
    }

    #[test]
    fn segments_are_encoded() {
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }
}
