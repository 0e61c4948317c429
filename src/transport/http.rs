use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

// ============================================================================
// Outbound delivery of the finished report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportError {
    /// Client could not be constructed (TLS backend, bad settings)
    Client { message: String },

    /// Connection, TLS or I/O failure before a response arrived
    Request { url: String, message: String },

    /// Server answered with a non-success status
    Status { url: String, status: u16, body: String },
}

impl TransportError {
    /// JSON rendering of the failure, shown to the user as-is.
    pub fn detail(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_string())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Client { message } => {
                write!(f, "HTTP client error: {}", message)
            }
            TransportError::Request { url, message } => {
                write!(f, "POST {} failed: {}", url, message)
            }
            TransportError::Status { url, status, body } => {
                write!(f, "POST {} returned {}: {}", url, status, body)
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// POSTs a JSON body and returns the response body as text.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        body: String,
        allow_insecure: bool,
    ) -> Result<String, TransportError>;
}

/// `reqwest`-backed transport. No client-side timeout is set.
#[derive(Debug, Default)]
pub struct HttpTransport;

impl HttpTransport {
    pub fn new() -> Self {
        Self
    }

    fn client(allow_insecure: bool) -> Result<reqwest::Client, TransportError> {
        reqwest::Client::builder()
            .danger_accept_invalid_certs(allow_insecure)
            .build()
            .map_err(|e| TransportError::Client {
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: String,
        allow_insecure: bool,
    ) -> Result<String, TransportError> {
        let client = Self::client(allow_insecure)?;

        let response = client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}
