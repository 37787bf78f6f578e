//! HTTP transport: stream open and single-shot JSON requests.
//!
//! The producer serves the envelope stream as a chunked
//! `text/event-stream` response to a POST; this module owns the
//! connection primitive and maps failed statuses to typed errors.
//! Framing and decoding of the chunks happen in the stream driver.

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::error::{EventwireError, Result};

/// Error body shape returned by the producer on failed requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Transport for one producer endpoint.
///
/// Cheap to clone per request path; the underlying `reqwest::Client`
/// pools connections and is shared across streams.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport with a default HTTP client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a transport around a caller-configured HTTP client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// The configured endpoint base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Open an envelope stream.
    ///
    /// Issues the POST and, on success, returns the raw byte-chunk
    /// stream of the response body. A non-success status is mapped to
    /// [`EventwireError::Status`], using the producer's JSON error body
    /// when it has one.
    pub async fn open_stream<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<BoxStream<'static, reqwest::Result<Bytes>>> {
        let url = self.url(path);
        debug!(%url, "opening envelope stream");

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }

        Ok(response.bytes_stream().boxed())
    }

    /// Single-shot JSON request/response call.
    pub async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let response = self.client.post(self.url(path)).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }

        Ok(response.json().await?)
    }

    async fn status_error(status: StatusCode, response: reqwest::Response) -> EventwireError {
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        EventwireError::Status { status, message }
    }
}
