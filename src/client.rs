//! Main client implementation

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use futures::stream::BoxStream;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};
use reqwest::{Method, StatusCode};
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use url::Url;

use crate::headers::{
    AUTH_KEY, AUTH_NEW_TOKEN, AUTH_TOKEN, AUTH_TOKEN_EXPIRES, AUTH_USER, COPY_FROM, STORAGE_URL,
};
use crate::session::Session;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, RequestBody, Transport};
use crate::types::{
    AccountInfo, ContainerInfo, ContainerSummary, ListEntry, ListOptions, ObjectInfo,
    ObjectSummary,
};
use crate::{ClientError, Config, Result};

/// kt ucloud storage client.
///
/// One client instance covers all three resource tiers (account, container,
/// object). The session descriptor is replaced wholesale on every
/// re-authentication and lives behind a lock, so a single client can be
/// shared across tasks.
pub struct UcloudClient {
    config: Config,
    transport: Arc<dyn Transport>,
    auth_url: Url,
    lookahead: Duration,
    session: RwLock<Option<Session>>,
}

impl UcloudClient {
    /// Create a client over the default pooled HTTP transport
    pub fn new(config: Config) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::with_transport(config, transport)
    }

    /// Create a client over a caller-supplied transport
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let auth_url = Url::parse(&config.auth_url)?;
        let lookahead = Duration::from_std(config.refresh_lookahead)
            .map_err(|_| ClientError::Config("refresh lookahead out of range".to_string()))?;

        Ok(Self {
            config,
            transport,
            auth_url,
            lookahead,
            session: RwLock::new(None),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Session Management ====================

    /// Currently held session, if any
    pub async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Install a previously saved session
    pub async fn set_session(&self, session: Session) {
        *self.session.write().await = Some(session);
    }

    /// Drop the session; the next operation re-authenticates
    pub async fn invalidate(&self) {
        *self.session.write().await = None;
    }

    /// True when a session is held and still usable at `horizon`
    pub async fn is_session_valid(&self, horizon: DateTime<Utc>) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.is_valid_at(horizon))
    }

    /// Authenticate and install the issued session.
    ///
    /// With `new_token` set the server is asked to issue a fresh token
    /// instead of returning a cached one. On any non-200 answer the held
    /// session is cleared and [`ClientError::AuthFailed`] is returned.
    #[instrument(skip(self))]
    pub async fn authenticate(&self, new_token: bool) -> Result<Session> {
        let mut guard = self.session.write().await;
        match self.perform_auth(new_token).await {
            Ok(session) => {
                *guard = Some(session.clone());
                Ok(session)
            }
            Err(err) => {
                *guard = None;
                Err(err)
            }
        }
    }

    async fn perform_auth(&self, new_token: bool) -> Result<Session> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_USER, HeaderValue::from_str(&self.config.username)?);
        headers.insert(AUTH_KEY, HeaderValue::from_str(&self.config.api_key)?);
        if new_token {
            headers.insert(AUTH_NEW_TOKEN, HeaderValue::from_static("true"));
        }

        debug!(url = %self.auth_url, new_token, "authenticating");
        let response = self
            .transport
            .send(ApiRequest {
                method: Method::GET,
                url: self.auth_url.clone(),
                headers,
                body: RequestBody::Empty,
            })
            .await?;

        if response.status != StatusCode::OK {
            return Err(ClientError::AuthFailed {
                status: response.status.as_u16(),
                reason: reason_phrase(response.status),
            });
        }

        let storage_url = required_header(&response.headers, STORAGE_URL)?;
        let token = required_header(&response.headers, AUTH_TOKEN)?;
        let expires_in = required_header(&response.headers, AUTH_TOKEN_EXPIRES)?
            .parse::<i64>()
            .map_err(|_| {
                ClientError::InvalidAuthResponse(format!("unparsable {}", AUTH_TOKEN_EXPIRES))
            })?;

        let mut storage_url = Url::parse(&storage_url)?;
        if let Some(account) = &self.config.account {
            rewrite_account(&mut storage_url, account)?;
        }

        let expires_at = Utc::now() + Duration::seconds(expires_in);
        Ok(Session::new(storage_url, token, expires_at))
    }

    /// Return a session valid beyond the lookahead window, re-authenticating
    /// once if the held one is missing or about to expire.
    async fn ensure_session(&self) -> Result<Session> {
        let horizon = Utc::now() + self.lookahead;
        {
            let guard = self.session.read().await;
            if let Some(session) = guard.as_ref() {
                if session.is_valid_at(horizon) {
                    return Ok(session.clone());
                }
            }
        }

        let mut guard = self.session.write().await;
        // another task may have refreshed while we waited for the lock
        if let Some(session) = guard.as_ref() {
            if session.is_valid_at(horizon) {
                return Ok(session.clone());
            }
        }

        debug!("session missing or expiring, re-authenticating");
        match self.perform_auth(false).await {
            Ok(session) => {
                *guard = Some(session.clone());
                Ok(session)
            }
            Err(err) => {
                *guard = None;
                Err(err)
            }
        }
    }

    // ==================== Generic Dispatch ====================

    /// Issue a request against the storage endpoint.
    ///
    /// The target is the storage root, `root/container` or
    /// `root/container/object` depending on which path parts are given. The
    /// bearer token is attached after the lazy-refresh check; caller headers
    /// are forwarded as-is. HTTP error statuses are returned inside the
    /// [`ApiResponse`], never as errors.
    pub async fn request(
        &self,
        method: Method,
        container: Option<&str>,
        object: Option<&str>,
        query: &[(&str, String)],
        extra_headers: HeaderMap,
        body: RequestBody,
    ) -> Result<ApiResponse> {
        let session = self.ensure_session().await?;
        let url = resource_url(&session, container, object, query)?;

        let mut headers = extra_headers;
        headers.insert(AUTH_TOKEN, HeaderValue::from_str(session.token())?);

        debug!(%method, %url, "sending request");
        self.transport
            .send(ApiRequest {
                method,
                url,
                headers,
                body,
            })
            .await
    }

    // ==================== Account Operations ====================

    /// Peek account metadata
    #[instrument(skip(self))]
    pub async fn head_account(&self) -> Result<ApiResponse> {
        self.request(
            Method::HEAD,
            None,
            None,
            &[],
            HeaderMap::new(),
            RequestBody::Empty,
        )
        .await
    }

    /// Read the account container listing in the format given by `options`
    #[instrument(skip(self))]
    pub async fn get_account(&self, options: &ListOptions) -> Result<ApiResponse> {
        self.request(
            Method::GET,
            None,
            None,
            &options.to_query(),
            HeaderMap::new(),
            RequestBody::Empty,
        )
        .await
    }

    /// Create the account (reseller mode)
    #[instrument(skip(self))]
    pub async fn put_account(&self, headers: HeaderMap) -> Result<ApiResponse> {
        self.request(Method::PUT, None, None, &[], headers, RequestBody::Empty)
            .await
    }

    /// Update account metadata
    #[instrument(skip(self, headers))]
    pub async fn post_account(&self, headers: HeaderMap) -> Result<ApiResponse> {
        self.request(Method::POST, None, None, &[], headers, RequestBody::Empty)
            .await
    }

    /// Delete the account (reseller mode)
    #[instrument(skip(self))]
    pub async fn delete_account(&self) -> Result<ApiResponse> {
        self.request(
            Method::DELETE,
            None,
            None,
            &[],
            HeaderMap::new(),
            RequestBody::Empty,
        )
        .await
    }

    /// Account usage counters
    #[instrument(skip(self))]
    pub async fn stat_account(&self) -> Result<AccountInfo> {
        let response = self.head_account().await?;
        if !response.is_success() {
            return Err(unexpected_status(response.status));
        }
        Ok(AccountInfo::from_headers(&response.headers))
    }

    /// List containers as parsed rows
    #[instrument(skip(self))]
    pub async fn list_containers(&self, options: &ListOptions) -> Result<Vec<ContainerSummary>> {
        let query = json_query(options);
        let response = self
            .request(
                Method::GET,
                None,
                None,
                &query,
                HeaderMap::new(),
                RequestBody::Empty,
            )
            .await?;
        parse_listing(response).await
    }

    // ==================== Container Operations ====================

    /// Peek container metadata
    #[instrument(skip(self))]
    pub async fn head_container(&self, container: &str) -> Result<ApiResponse> {
        self.request(
            Method::HEAD,
            Some(container),
            None,
            &[],
            HeaderMap::new(),
            RequestBody::Empty,
        )
        .await
    }

    /// Read the container object listing in the format given by `options`
    #[instrument(skip(self))]
    pub async fn get_container(
        &self,
        container: &str,
        options: &ListOptions,
    ) -> Result<ApiResponse> {
        self.request(
            Method::GET,
            Some(container),
            None,
            &options.to_query(),
            HeaderMap::new(),
            RequestBody::Empty,
        )
        .await
    }

    /// Create a container
    #[instrument(skip(self, headers))]
    pub async fn put_container(&self, container: &str, headers: HeaderMap) -> Result<ApiResponse> {
        self.request(
            Method::PUT,
            Some(container),
            None,
            &[],
            headers,
            RequestBody::Empty,
        )
        .await
    }

    /// Update container metadata
    #[instrument(skip(self, headers))]
    pub async fn post_container(&self, container: &str, headers: HeaderMap) -> Result<ApiResponse> {
        self.request(
            Method::POST,
            Some(container),
            None,
            &[],
            headers,
            RequestBody::Empty,
        )
        .await
    }

    /// Delete a container
    #[instrument(skip(self))]
    pub async fn delete_container(&self, container: &str) -> Result<ApiResponse> {
        self.request(
            Method::DELETE,
            Some(container),
            None,
            &[],
            HeaderMap::new(),
            RequestBody::Empty,
        )
        .await
    }

    /// Container usage counters
    #[instrument(skip(self))]
    pub async fn stat_container(&self, container: &str) -> Result<ContainerInfo> {
        let response = self.head_container(container).await?;
        if !response.is_success() {
            return Err(unexpected_status(response.status));
        }
        Ok(ContainerInfo::from_headers(&response.headers))
    }

    /// List objects as parsed rows
    #[instrument(skip(self))]
    pub async fn list_objects(
        &self,
        container: &str,
        options: &ListOptions,
    ) -> Result<Vec<ListEntry>> {
        let query = json_query(options);
        let response = self
            .request(
                Method::GET,
                Some(container),
                None,
                &query,
                HeaderMap::new(),
                RequestBody::Empty,
            )
            .await?;
        parse_listing(response).await
    }

    /// Enumerate every object in `container`, paging with the marker
    /// parameter and stopping when a page comes back short.
    #[instrument(skip(self))]
    pub async fn list_all_objects(
        &self,
        container: &str,
        page_size: u32,
    ) -> Result<Vec<ObjectSummary>> {
        if page_size == 0 {
            return Err(ClientError::Config(
                "page_size must be at least 1".to_string(),
            ));
        }

        let mut objects = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let options = ListOptions {
                limit: Some(page_size),
                marker: marker.take(),
                ..ListOptions::default()
            };
            let page = self.list_objects(container, &options).await?;
            let page_len = page.len();

            for entry in page {
                marker = Some(entry.name().to_string());
                if let ListEntry::Object(object) = entry {
                    objects.push(object);
                }
            }

            if page_len < page_size as usize {
                break;
            }
        }

        Ok(objects)
    }

    // ==================== Object Operations ====================

    /// Peek object metadata
    #[instrument(skip(self))]
    pub async fn head_object(&self, container: &str, object: &str) -> Result<ApiResponse> {
        self.request(
            Method::HEAD,
            Some(container),
            Some(object),
            &[],
            HeaderMap::new(),
            RequestBody::Empty,
        )
        .await
    }

    /// Read an object; the body in the response streams on demand
    #[instrument(skip(self))]
    pub async fn get_object(&self, container: &str, object: &str) -> Result<ApiResponse> {
        self.request(
            Method::GET,
            Some(container),
            Some(object),
            &[],
            HeaderMap::new(),
            RequestBody::Empty,
        )
        .await
    }

    /// Create or replace an object from a buffered body
    #[instrument(skip(self, body, headers))]
    pub async fn put_object(
        &self,
        container: &str,
        object: &str,
        body: impl Into<Bytes>,
        headers: HeaderMap,
    ) -> Result<ApiResponse> {
        let body = body.into();
        let mut headers = headers;
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len() as u64));
        self.request(
            Method::PUT,
            Some(container),
            Some(object),
            &[],
            headers,
            RequestBody::Full(body),
        )
        .await
    }

    /// Create or replace an object from a streaming body
    pub async fn put_object_stream(
        &self,
        container: &str,
        object: &str,
        body: BoxStream<'static, Result<Bytes>>,
        content_length: Option<u64>,
        headers: HeaderMap,
    ) -> Result<ApiResponse> {
        let mut headers = headers;
        if let Some(length) = content_length {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        }
        self.request(
            Method::PUT,
            Some(container),
            Some(object),
            &[],
            headers,
            RequestBody::Stream(body),
        )
        .await
    }

    /// Update object metadata
    #[instrument(skip(self, headers))]
    pub async fn post_object(
        &self,
        container: &str,
        object: &str,
        headers: HeaderMap,
    ) -> Result<ApiResponse> {
        self.request(
            Method::POST,
            Some(container),
            Some(object),
            &[],
            headers,
            RequestBody::Empty,
        )
        .await
    }

    /// Delete an object
    #[instrument(skip(self))]
    pub async fn delete_object(&self, container: &str, object: &str) -> Result<ApiResponse> {
        self.request(
            Method::DELETE,
            Some(container),
            Some(object),
            &[],
            HeaderMap::new(),
            RequestBody::Empty,
        )
        .await
    }

    /// Server-side copy within the account
    #[instrument(skip(self))]
    pub async fn copy_object(
        &self,
        source_container: &str,
        source_object: &str,
        container: &str,
        object: &str,
    ) -> Result<ApiResponse> {
        let mut headers = HeaderMap::new();
        let copy_source = format!("/{}/{}", source_container, source_object);
        headers.insert(COPY_FROM, HeaderValue::from_str(&copy_source)?);
        // copy is a PUT without payload, the server requires an explicit zero length
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
        self.request(
            Method::PUT,
            Some(container),
            Some(object),
            &[],
            headers,
            RequestBody::Empty,
        )
        .await
    }

    /// Object metadata snapshot
    #[instrument(skip(self))]
    pub async fn stat_object(&self, container: &str, object: &str) -> Result<ObjectInfo> {
        let response = self.head_object(container, object).await?;
        if !response.is_success() {
            return Err(unexpected_status(response.status));
        }
        Ok(ObjectInfo::from_headers(&response.headers))
    }
}

// ==================== Helpers ====================

fn resource_url(
    session: &Session,
    container: Option<&str>,
    object: Option<&str>,
    query: &[(&str, String)],
) -> Result<Url> {
    let mut url = session.storage_url().clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| ClientError::Config("storage URL cannot be a base".to_string()))?;
        segments.pop_if_empty();
        if let Some(container) = container {
            segments.push(container);
            if let Some(object) = object {
                // slashes separate pseudo-directory segments of the object name
                for part in object.split('/') {
                    segments.push(part);
                }
            }
        }
    }
    for (name, value) in query {
        url.query_pairs_mut().append_pair(name, value);
    }
    Ok(url)
}

fn rewrite_account(url: &mut Url, account: &str) -> Result<()> {
    let mut segments: Vec<String> = url
        .path_segments()
        .map(|s| s.map(str::to_string).collect())
        .unwrap_or_default();
    segments.retain(|s| !s.is_empty());
    if segments.is_empty() {
        return Err(ClientError::InvalidAuthResponse(
            "storage URL has no account segment".to_string(),
        ));
    }

    let last = segments.len() - 1;
    segments[last] = account.to_string();

    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidAuthResponse("storage URL cannot be a base".to_string()))?
        .clear()
        .extend(segments);
    Ok(())
}

fn required_header(headers: &HeaderMap, name: &str) -> Result<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| ClientError::InvalidAuthResponse(format!("missing {}", name)))
}

fn json_query(options: &ListOptions) -> Vec<(&'static str, String)> {
    let mut query = options.to_query();
    query.retain(|(name, _)| *name != "format");
    query.push(("format", "json".to_string()));
    query
}

fn reason_phrase(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("").to_string()
}

fn unexpected_status(status: StatusCode) -> ClientError {
    ClientError::UnexpectedStatus {
        status: status.as_u16(),
        reason: reason_phrase(status),
    }
}

async fn parse_listing<T>(response: ApiResponse) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    if !response.is_success() {
        return Err(unexpected_status(response.status));
    }
    let body = response.body.bytes().await?;
    if body.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice(&body)?)
}
