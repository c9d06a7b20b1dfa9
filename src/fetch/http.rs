//! # HttpFetcher — single-attempt HTTP(S) GET.
//!
//! Issues one request per call, checks the status, reads the body and makes
//! sure it looks like an image before handing the bytes to the engine.
//!
//! ## Failure mapping
//! ```text
//! send()/bytes() error   → FetchError::Transport
//! non-2xx status         → FetchError::Status
//! zero-length body       → FetchError::Empty
//! unknown image format   → FetchError::NotAnImage
//! ```

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::FetchError;
use crate::fetch::Fetch;

/// `reqwest`-backed fetcher. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher with an optional per-request timeout.
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        debug!(url, "http fetch");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        validate_image(url, body)
    }

    fn name(&self) -> &str {
        "HttpFetcher"
    }
}

/// Accepts `body` only if it is non-empty and starts like a known image format.
fn validate_image(url: &str, body: Bytes) -> Result<Bytes, FetchError> {
    if body.is_empty() {
        return Err(FetchError::Empty {
            url: url.to_owned(),
        });
    }
    match image::guess_format(&body) {
        Ok(format) => {
            debug!(url, ?format, bytes = body.len(), "image fetched");
            Ok(body)
        }
        Err(_) => Err(FetchError::NotAnImage {
            url: url.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn png_signature_is_accepted() {
        let body = Bytes::from_static(PNG_MAGIC);
        assert_eq!(validate_image("u", body.clone()).unwrap(), body);
    }

    #[test]
    fn empty_body_is_rejected() {
        let err = validate_image("u", Bytes::new()).unwrap_err();
        assert_eq!(err.as_label(), "fetch_empty");
    }

    #[test]
    fn html_is_not_an_image() {
        let err = validate_image("u", Bytes::from_static(b"<!doctype html><html>")).unwrap_err();
        assert_eq!(err.as_label(), "fetch_not_an_image");
    }
}
