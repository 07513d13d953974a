//! DevSecTools API client: request building, execution and response parsing.
//!
//! # Design
//! Each round trip is split into three steps. `build_*` turns a scan into a
//! plain `HttpRequest`, the executor sends it with reqwest under the
//! caller's `Context`, and `parse_*` turns the `HttpResponse` into a typed
//! value or an `ApiError`. The build and parse halves never touch the
//! network and are usable by hosts that run the I/O themselves.
//!
//! Configuration lives in an `ArcSwap`. Setters publish a new snapshot and
//! every request loads the snapshot once when it starts, so reconfiguring
//! the client never changes a request already in flight.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::context::Context;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::scan::{ScanResult, ScanType};
use crate::types::{DomainResponse, ErrorResponse, HttpProtocolResponse, TlsResponse};

/// Query parameter carrying the scan target.
pub const TARGET_PARAM: &str = "url";

const USER_AGENT: &str = concat!("devsec-core/", env!("CARGO_PKG_VERSION"));

/// Client for the DevSecTools scanning API.
///
/// Clones share the connection pool and the configuration: a setter called
/// on one clone is seen by requests started afterwards on every clone.
#[derive(Debug, Clone)]
pub struct DevSecClient {
    http: reqwest::Client,
    config: Arc<ArcSwap<Config>>,
}

impl DevSecClient {
    /// Production endpoint, 5 second timeout.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Client with its own connection pool and the given configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_http_client(http, config))
    }

    /// Configuration taken from `DEVSEC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::with_config(Config::from_env()?)
    }

    /// Use a caller-built reqwest client, e.g. with custom TLS roots.
    ///
    /// Timeouts come from `Config`; a timeout set on `http` itself applies
    /// on top of it.
    pub fn with_http_client(http: reqwest::Client, config: Config) -> Self {
        Self {
            http,
            config: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// The current configuration snapshot.
    pub fn config(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Replace the whole configuration for requests started from now on.
    pub fn set_config(&self, config: Config) {
        self.config.store(Arc::new(config));
    }

    /// Switch to another deployment; the endpoint is copied, never shared.
    pub fn set_endpoint(&self, endpoint: &Endpoint) {
        self.update_config(|config| config.with_endpoint(endpoint));
    }

    /// Switch to a custom base URL.
    pub fn set_base_url(&self, base_url: &str) {
        self.update_config(|config| config.with_base_url(base_url));
    }

    /// Per-request network timeout for requests started from now on.
    pub fn set_timeout(&self, timeout: Duration) {
        self.update_config(|config| config.with_timeout(timeout));
    }

    /// Upper bound on batch items in flight; zero is treated as one.
    pub fn set_max_concurrency(&self, max_concurrency: usize) {
        self.update_config(|config| config.with_max_concurrency(max_concurrency));
    }

    fn update_config(&self, update: impl Fn(Config) -> Config) {
        self.config
            .rcu(|current| Arc::new(update(Config::clone(current))));
    }

    /// Build the GET request for one scan against the current endpoint.
    pub fn build_scan(&self, scan: ScanType, target: &str) -> Result<HttpRequest> {
        build_request(
            &self.config(),
            HttpMethod::Get,
            scan.path(),
            &[(TARGET_PARAM, target)],
            None::<&()>,
        )
    }

    pub fn build_domain(&self, target: &str) -> Result<HttpRequest> {
        self.build_scan(ScanType::Domain, target)
    }

    pub fn build_http(&self, target: &str) -> Result<HttpRequest> {
        self.build_scan(ScanType::Http, target)
    }

    pub fn build_tls(&self, target: &str) -> Result<HttpRequest> {
        self.build_scan(ScanType::Tls, target)
    }

    pub fn parse_domain(&self, response: HttpResponse) -> Result<DomainResponse> {
        parse_response(&response)
    }

    pub fn parse_http(&self, response: HttpResponse) -> Result<HttpProtocolResponse> {
        parse_response(&response)
    }

    pub fn parse_tls(&self, response: HttpResponse) -> Result<TlsResponse> {
        parse_response(&response)
    }

    pub fn parse_scan(&self, scan: ScanType, response: HttpResponse) -> Result<ScanResult> {
        Ok(match scan {
            ScanType::Domain => ScanResult::Domain(parse_response(&response)?),
            ScanType::Http => ScanResult::Http(parse_response(&response)?),
            ScanType::Tls => ScanResult::Tls(parse_response(&response)?),
        })
    }

    /// Perform one request and decode the response body into `T`.
    ///
    /// The effective deadline is the earlier of the context's deadline and
    /// now plus the configured timeout. A context that is already expired
    /// or cancelled fails without contacting the server.
    pub async fn request<B, T>(
        &self,
        ctx: &Context,
        method: HttpMethod,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let config = self.config();
        let request = build_request(&config, method, path, query, body)?;
        let response = self.execute(ctx, &config, request).await?;
        parse_response(&response)
    }

    async fn execute(
        &self,
        ctx: &Context,
        config: &Config,
        request: HttpRequest,
    ) -> Result<HttpResponse> {
        let ctx = ctx.child_with_timeout(config.timeout);
        if ctx.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        if ctx.is_expired() {
            return Err(ApiError::DeadlineExceeded);
        }

        debug!(
            method = request.method.as_str(),
            url = %request.url,
            timeout = ?config.timeout,
            "dispatching request"
        );
        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(ApiError::Cancelled),
            result = until(ctx.deadline(), self.send(request)) => result,
        };
        let response = outcome?;
        debug!(
            status = response.status,
            elapsed = ?started.elapsed(),
            "request completed"
        );
        Ok(response)
    }

    /// One round trip with the body read to the end.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.http.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    /// Parsed domain information for `target`, e.g. `"example.com"`.
    pub async fn domain(&self, ctx: &Context, target: &str) -> Result<DomainResponse> {
        self.get_scan(ctx, ScanType::Domain, target).await
    }

    /// HTTP/1.1, HTTP/2 and HTTP/3 support of `target`.
    pub async fn http(&self, ctx: &Context, target: &str) -> Result<HttpProtocolResponse> {
        self.get_scan(ctx, ScanType::Http, target).await
    }

    /// Supported TLS versions and negotiated cipher suites of `target`.
    pub async fn tls(&self, ctx: &Context, target: &str) -> Result<TlsResponse> {
        self.get_scan(ctx, ScanType::Tls, target).await
    }

    pub async fn scan(&self, ctx: &Context, scan: ScanType, target: &str) -> Result<ScanResult> {
        Ok(match scan {
            ScanType::Domain => ScanResult::Domain(self.domain(ctx, target).await?),
            ScanType::Http => ScanResult::Http(self.http(ctx, target).await?),
            ScanType::Tls => ScanResult::Tls(self.tls(ctx, target).await?),
        })
    }

    async fn get_scan<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        scan: ScanType,
        target: &str,
    ) -> Result<T> {
        self.request(
            ctx,
            HttpMethod::Get,
            scan.path(),
            &[(TARGET_PARAM, target)],
            None::<&()>,
        )
        .await
    }
}

/// Race `future` against an optional deadline.
async fn until<T>(deadline: Option<Instant>, future: impl Future<Output = Result<T>>) -> Result<T> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, future)
            .await
            .map_err(|_| ApiError::DeadlineExceeded)?,
        None => future.await,
    }
}

/// Build a request against `config.endpoint`.
///
/// `path` segments are appended to the base URL's own path and every query
/// value is percent-encoded. A body is sent as JSON.
pub fn build_request<B: Serialize + ?Sized>(
    config: &Config,
    method: HttpMethod,
    path: &str,
    query: &[(&str, &str)],
    body: Option<&B>,
) -> Result<HttpRequest> {
    let url = endpoint_url(config.endpoint.base_url(), path, query)?;

    let (headers, body) = match body {
        Some(payload) => {
            let json = serde_json::to_string(payload)
                .map_err(|e| ApiError::SerializationError(e.to_string()))?;
            (
                vec![("content-type".to_string(), "application/json".to_string())],
                Some(json),
            )
        }
        None => (Vec::new(), None),
    };

    Ok(HttpRequest {
        method,
        url: url.into(),
        headers,
        body,
    })
}

fn endpoint_url(base_url: &str, path: &str, query: &[(&str, &str)]) -> Result<Url> {
    let invalid = |reason: String| ApiError::InvalidUrl {
        url: base_url.to_string(),
        reason,
    };

    let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("url cannot carry a path".to_string()))?
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

/// Decode a success body into `T`, or map a status >= 400 to an error.
pub fn parse_response<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    if response.is_error() {
        return Err(match serde_json::from_str::<ErrorResponse>(&response.body) {
            Ok(remote) => ApiError::Remote {
                status: response.status,
                message: remote.error,
            },
            Err(_) => ApiError::http(response.status, &response.body),
        });
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}
