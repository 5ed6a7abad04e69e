//! Transport seam between the client and the HTTP stack
//!
//! Operations are expressed as [`ApiRequest`] values and handed to a
//! [`Transport`]. The single concrete adapter, [`HttpTransport`], dispatches
//! them over a pooled `reqwest` client.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode};
use url::Url;

use crate::{ClientError, Config, Result};

/// A request ready for dispatch
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

/// Request payload
pub enum RequestBody {
    /// No body
    Empty,
    /// Fully buffered body
    Full(Bytes),
    /// Streaming body
    Stream(BoxStream<'static, Result<Bytes>>),
}

/// Typed result of an operation: status code, headers and a lazily
/// readable body.
///
/// HTTP error statuses are delivered here as-is; deciding what counts as
/// success is up to the caller.
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl ApiResponse {
    /// True for any 2xx status
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Response payload, readable once
pub struct ResponseBody(BodyInner);

enum BodyInner {
    Full(Bytes),
    Stream(BoxStream<'static, Result<Bytes>>),
}

impl ResponseBody {
    /// An empty body
    pub fn empty() -> Self {
        Self(BodyInner::Full(Bytes::new()))
    }

    /// A fully buffered body
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(BodyInner::Full(bytes.into()))
    }

    /// A streaming body
    pub fn from_stream(stream: BoxStream<'static, Result<Bytes>>) -> Self {
        Self(BodyInner::Stream(stream))
    }

    /// Collect the whole body into memory
    pub async fn bytes(self) -> Result<Bytes> {
        match self.0 {
            BodyInner::Full(bytes) => Ok(bytes),
            BodyInner::Stream(mut stream) => {
                let mut buf = Vec::new();
                while let Some(chunk) = stream.try_next().await? {
                    buf.extend_from_slice(&chunk);
                }
                Ok(Bytes::from(buf))
            }
        }
    }

    /// Consume the body chunk by chunk
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes>> {
        match self.0 {
            BodyInner::Full(bytes) => stream::once(async move { Ok(bytes) }).boxed(),
            BodyInner::Stream(stream) => stream,
        }
    }
}

/// Dispatches prepared requests over some HTTP stack
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Pooled HTTP transport backed by `reqwest`
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from the client configuration
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .default_headers(headers)
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut req = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);

        req = match request.body {
            RequestBody::Empty => req,
            RequestBody::Full(bytes) => req.body(bytes),
            RequestBody::Stream(stream) => req.body(reqwest::Body::wrap_stream(stream)),
        };

        let response = req.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = ResponseBody::from_stream(
            response
                .bytes_stream()
                .map_err(ClientError::Transport)
                .boxed(),
        );

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
