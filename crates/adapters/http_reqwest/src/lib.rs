//! # taskhook-adapter-http-reqwest
//!
//! Outbound HTTP transport backed by [`reqwest`].
//!
//! Implements [`HttpTransport`] so the webhook dispatcher and the Slack
//! notification action can reach external endpoints. Transport failures are
//! classified into timeouts, connection failures and everything else; a
//! response with any status code is a successful exchange. Only the first
//! [`MAX_BODY_BYTES`] of a response body are read.

use std::time::Duration;

use reqwest::Client;
use taskhook_app::ports::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Upper bound on the response body kept for delivery logs and errors.
pub const MAX_BODY_BYTES: usize = 4096;

/// [`HttpTransport`] over a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, reqwest::Error> {
        Client::builder().build().map(Self::from_client)
    }

    /// Wrap an already configured client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn classify(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connect(describe(err))
    } else {
        TransportError::Request(describe(err))
    }
}

/// The error message followed by its sources, which carry the useful part
/// (DNS failure, refused connection...) for reqwest errors.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            url,
            headers,
            body,
            timeout,
        } = request;

        let mut builder = self.client.post(&url).timeout(timeout).body(body);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|err| {
            let err = classify(&err, timeout);
            tracing::debug!(%url, error = %err, "outbound request failed");
            err
        })?;

        let status = response.status().as_u16();
        let body = read_capped(response, &url, status).await;
        Ok(HttpResponse { status, body })
    }
}

/// Read at most [`MAX_BODY_BYTES`] of the response and drop the rest, so a
/// chatty endpoint cannot make a delivery buffer an arbitrary payload.
async fn read_capped(mut response: reqwest::Response, url: &str, status: u16) -> String {
    let mut buffer = Vec::new();
    while buffer.len() < MAX_BODY_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(MAX_BODY_BYTES - buffer.len());
                buffer.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(%url, status, error = %err, "could not read response body");
                break;
            }
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(url: String) -> HttpRequest {
        HttpRequest::json(url, b"{\"event\":\"task.created\"}".to_vec(), Duration::from_secs(5))
            .header("X-Webhook-Signature", "abc123")
    }

    #[tokio::test]
    async fn should_post_body_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("content-type", "application/json"))
            .and(header("x-webhook-signature", "abc123"))
            .and(body_string("{\"event\":\"task.created\"}"))
            .respond_with(ResponseTemplate::new(200).set_body_string("received"))
            .expect(1)
            .mount(&server)
            .await;
        let transport = ReqwestTransport::new().unwrap();

        let response = transport
            .post(request(format!("{}/hook", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "received");
    }

    #[tokio::test]
    async fn should_return_error_statuses_as_responses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;
        let transport = ReqwestTransport::new().unwrap();

        let response = transport.post(request(server.uri())).await.unwrap();

        assert_eq!(response.status, 503);
        assert!(!response.is_success());
        assert_eq!(response.body, "maintenance");
    }

    #[tokio::test]
    async fn should_keep_only_the_head_of_a_large_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(100_000)))
            .mount(&server)
            .await;
        let transport = ReqwestTransport::new().unwrap();

        let response = transport.post(request(server.uri())).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body.len(), MAX_BODY_BYTES);
        assert!(response.body.bytes().all(|byte| byte == b'x'));
    }

    #[tokio::test]
    async fn should_classify_slow_endpoint_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;
        let transport = ReqwestTransport::new().unwrap();
        let mut slow = request(server.uri());
        slow.timeout = Duration::from_millis(100);

        let result = transport.post(slow).await;

        assert_eq!(
            result,
            Err(TransportError::Timeout(Duration::from_millis(100)))
        );
    }

    #[tokio::test]
    async fn should_classify_refused_connection() {
        let transport = ReqwestTransport::new().unwrap();

        let result = transport
            .post(request("http://127.0.0.1:1/hook".to_string()))
            .await;

        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
