//! Network collaborator.
//!
//! Everything that talks to the site goes through the [`Fetcher`] trait, so the
//! extraction and font pipeline can run against scripted responses in tests.
//! [`HttpFetcher`] is the production implementation on top of a blocking
//! `reqwest` client.

use std::time::Duration;

use crate::error::{Error, Result};

mod headers;

pub use headers::RequestProfile;

/// One outgoing GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Absolute URL
    pub url: String,
    /// Extra request headers, sent in order
    pub headers: Vec<(String, String)>,
    /// Raw `Cookie` header value
    pub cookie: Option<String>,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl FetchRequest {
    /// A bare request with no headers.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            cookie: None,
            timeout,
        }
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// A 200 response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Blocking page and asset retrieval.
pub trait Fetcher: Send + Sync {
    /// Perform `request` and return whatever the server answered.
    ///
    /// Implementations return `Err` only for transport failures; non-2xx
    /// responses come back as `Ok` with their status.
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// Fetch and turn a non-2xx status into [`Error::Status`].
pub fn fetch_success(fetcher: &dyn Fetcher, request: &FetchRequest) -> Result<FetchResponse> {
    let response = fetcher.fetch(request)?;
    if !response.is_success() {
        return Err(Error::Status {
            url: request.url.clone(),
            status: response.status,
        });
    }
    Ok(response)
}

/// [`Fetcher`] backed by a blocking `reqwest` client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Build a client with gzip and rustls enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .gzip(true)
            .build()
            .map_err(|e| Error::Http {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        log::debug!("GET {} (timeout {:?})", request.url, request.timeout);

        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = &request.cookie {
            builder = builder.header(reqwest::header::COOKIE, cookie.as_str());
        }

        let transport = |e: reqwest::Error| Error::Http {
            url: request.url.clone(),
            reason: e.to_string(),
        };
        let response = builder.send().map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(transport)?.to_vec();

        log::trace!("{} -> HTTP {} ({} bytes)", request.url, status, body.len());
        Ok(FetchResponse { status, body })
    }
}
