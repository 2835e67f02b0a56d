//! Remote milestone source over HTTP.
//!
//! Endpoints, relative to the base URL:
//! - `GET  health/overview`
//! - `GET  health/milestones`
//! - `POST health/recompute`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use smokefree_core::{HealthOverview, Milestone, SessionContext};
use tracing::debug;

use super::{MilestoneSource, Result, SourceError};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_ERROR_BODY: usize = 512;

/// HTTP-backed milestone source.
pub struct HttpSource {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpSource {
    /// Create a source for `base_url`, authenticating as the session's user.
    pub fn new(base_url: impl Into<String>, session: &SessionContext, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: session.auth_token.clone(),
        })
    }

    /// Full URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SourceError::Status {
            status: status.as_u16(),
            body: truncate_body(body, MAX_ERROR_BODY),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("GET {}", self.url(path));
        let response = self.send(self.request(Method::GET, path)).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Cut `body` to at most `max` bytes without splitting a character.
fn truncate_body(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut end = max;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

#[async_trait]
impl MilestoneSource for HttpSource {
    async fn fetch_overview(&self) -> Result<HealthOverview> {
        self.get_json("health/overview").await
    }

    async fn fetch_milestones(&self) -> Result<Vec<Milestone>> {
        self.get_json("health/milestones").await
    }

    async fn trigger_recompute(&self) -> Result<()> {
        debug!("POST {}", self.url("health/recompute"));
        match self.send(self.request(Method::POST, "health/recompute")).await {
            Ok(_) => Ok(()),
            Err(SourceError::Status { status, body }) if status < 500 => {
                Err(SourceError::Recompute(format!("status {status}: {body}")))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve every request with a fixed status and body. Returns the base URL.
    async fn serve(status: u16, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let body = body.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let response = format!(
                        "HTTP/1.1 {status} Error\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        format!("http://{addr}")
    }

    fn source(base_url: &str) -> HttpSource {
        HttpSource::new(base_url, &SessionContext::default(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        assert_eq!(truncate_body("short".into(), 512), "short");
        assert_eq!(truncate_body("abcdef".into(), 4), "abcd");
        // '€' is three bytes; a cut inside it backs off to the previous char.
        assert_eq!(truncate_body("ab€".into(), 3), "ab");
        assert_eq!(truncate_body("ab€".into(), 5), "ab€");
    }

    #[tokio::test]
    async fn test_non_ascii_error_body_is_truncated() {
        let body = format!("{}€€€", "a".repeat(511));
        let base = serve(500, body).await;

        let err = source(&base).fetch_milestones().await.unwrap_err();
        match err {
            SourceError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "a".repeat(511));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_recompute_client_error_is_recompute_failure() {
        let base = serve(422, "no quit date".into()).await;

        let err = source(&base).trigger_recompute().await.unwrap_err();
        assert!(matches!(err, SourceError::Recompute(ref msg) if msg.contains("422")));
        assert!(!err.is_connectivity());
    }

    #[tokio::test]
    async fn test_recompute_server_error_passes_through() {
        let base = serve(503, "maintenance".into()).await;

        let err = source(&base).trigger_recompute().await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 503, .. }));
        assert!(err.is_connectivity());
    }

    #[test]
    fn test_url_joining() {
        let source = HttpSource::new("https://api.example.com/v1/", &SessionContext::default(), DEFAULT_TIMEOUT).unwrap();
        assert_eq!(source.url("health/overview"), "https://api.example.com/v1/health/overview");
        assert_eq!(source.url("/health/milestones"), "https://api.example.com/v1/health/milestones");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connectivity_failure() {
        // Nothing listens on port 9 of the loopback interface.
        let source = HttpSource::new(
            "http://127.0.0.1:9",
            &SessionContext::default().with_auth_token("t"),
            Duration::from_millis(500),
        )
        .unwrap();

        let err = source.fetch_milestones().await.unwrap_err();
        assert!(err.is_connectivity(), "unexpected error: {err}");
    }
}
