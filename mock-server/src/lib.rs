//! Test double for the DevSecTools scanning API.
//!
//! Serves `/domain`, `/http` and `/tls` with deterministic payloads derived
//! from the scanned host. `AppState` counts requests and can slow down or
//! break every response, so client tests can exercise deadlines and
//! non-JSON error bodies.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainResponse {
    pub hostname: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub hostname: String,
    pub http11: bool,
    pub http2: bool,
    pub http3: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsResponse {
    pub hostname: String,
    pub tls_versions: TlsVersions,
    pub tls_connections: Vec<TlsConnection>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TlsVersions {
    pub tls10: bool,
    pub tls11: bool,
    pub tls12: bool,
    pub tls13: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsConnection {
    pub version: String,
    pub version_id: u16,
    pub cipher_suites: Vec<CipherSuite>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherSuite {
    pub authentication: String,
    pub encryption: String,
    pub gnutls_name: String,
    pub hash: String,
    pub iana_name: String,
    #[serde(rename = "isAEAD")]
    pub is_aead: bool,
    #[serde(rename = "isPFS")]
    pub is_pfs: bool,
    pub key_exchange: String,
    pub openssl_name: String,
    pub strength: String,
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize)]
pub struct ScanQuery {
    pub url: Option<String>,
}

/// Shared server state: a request counter plus optional fault injection.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    requests: Arc<AtomicUsize>,
    delay: Duration,
    outage: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` before answering any scan.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Answer every scan with 503 and a plain-text body.
    pub fn with_outage(mut self) -> Self {
        self.outage = true;
        self
    }

    /// Number of scan requests received so far, including rejected ones.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

pub fn app() -> Router {
    app_with_state(AppState::new())
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/domain", get(scan_domain))
        .route("/http", get(scan_http))
        .route("/tls", get(scan_tls))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::new()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

enum ScanFailure {
    BadRequest(&'static str),
    Outage,
}

impl IntoResponse for ScanFailure {
    fn into_response(self) -> Response {
        match self {
            ScanFailure::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: message.to_string(),
                }),
            )
                .into_response(),
            ScanFailure::Outage => {
                (StatusCode::SERVICE_UNAVAILABLE, "scanner unavailable").into_response()
            }
        }
    }
}

async fn admit(state: &AppState, query: &ScanQuery) -> Result<String, ScanFailure> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    if state.outage {
        return Err(ScanFailure::Outage);
    }
    let target = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(ScanFailure::BadRequest("missing url parameter"))?;
    extract_hostname(target).ok_or(ScanFailure::BadRequest("bad host"))
}

/// Reduce a scan target (bare host or full URL) to a lowercase hostname.
///
/// Returns `None` when the host part is not a syntactically valid DNS name.
pub fn extract_hostname(target: &str) -> Option<String> {
    let rest = target.split_once("://").map_or(target, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    };

    let valid = !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    valid.then(|| host.to_ascii_lowercase())
}

/// Hosts under `legacy.` pretend to be an old HTTP/1.1-only, TLS 1.0-1.2 stack.
fn is_legacy(hostname: &str) -> bool {
    hostname.starts_with("legacy.")
}

async fn scan_domain(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<DomainResponse>, ScanFailure> {
    let hostname = admit(&state, &query).await?;
    Ok(Json(DomainResponse { hostname }))
}

async fn scan_http(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<HttpResponse>, ScanFailure> {
    let hostname = admit(&state, &query).await?;
    let modern = !is_legacy(&hostname);
    Ok(Json(HttpResponse {
        hostname,
        http11: true,
        http2: modern,
        http3: modern,
    }))
}

async fn scan_tls(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<TlsResponse>, ScanFailure> {
    let hostname = admit(&state, &query).await?;
    let legacy = is_legacy(&hostname);
    let tls_versions = TlsVersions {
        tls10: legacy,
        tls11: legacy,
        tls12: true,
        tls13: !legacy,
    };

    let mut tls_connections = Vec::new();
    if legacy {
        tls_connections.push(connection("TLS 1.0", 0x0301, vec![rsa_aes128_cbc_sha()]));
        tls_connections.push(connection("TLS 1.1", 0x0302, vec![rsa_aes128_cbc_sha()]));
    }
    tls_connections.push(connection("TLS 1.2", 0x0303, vec![ecdhe_rsa_aes128_gcm_sha256()]));
    if !legacy {
        tls_connections.push(connection("TLS 1.3", 0x0304, vec![aes128_gcm_sha256()]));
    }

    Ok(Json(TlsResponse {
        hostname,
        tls_versions,
        tls_connections,
    }))
}

fn connection(version: &str, version_id: u16, cipher_suites: Vec<CipherSuite>) -> TlsConnection {
    TlsConnection {
        version: version.to_string(),
        version_id,
        cipher_suites,
    }
}

#[allow(clippy::too_many_arguments)]
fn suite(
    iana_name: &str,
    openssl_name: &str,
    gnutls_name: &str,
    key_exchange: &str,
    authentication: &str,
    encryption: &str,
    hash: &str,
    strength: &str,
) -> CipherSuite {
    CipherSuite {
        authentication: authentication.to_string(),
        encryption: encryption.to_string(),
        gnutls_name: gnutls_name.to_string(),
        hash: hash.to_string(),
        iana_name: iana_name.to_string(),
        is_aead: encryption.ends_with("GCM"),
        is_pfs: key_exchange.starts_with("ECDHE") || key_exchange == "-",
        key_exchange: key_exchange.to_string(),
        openssl_name: openssl_name.to_string(),
        strength: strength.to_string(),
        url: format!("https://ciphersuite.info/cs/{iana_name}/"),
    }
}

fn aes128_gcm_sha256() -> CipherSuite {
    suite(
        "TLS_AES_128_GCM_SHA256",
        "TLS_AES_128_GCM_SHA256",
        "TLS_AES_128_GCM_SHA256",
        "-",
        "-",
        "AES 128 GCM",
        "SHA256",
        "recommended",
    )
}

fn ecdhe_rsa_aes128_gcm_sha256() -> CipherSuite {
    suite(
        "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
        "ECDHE-RSA-AES128-GCM-SHA256",
        "TLS_ECDHE_RSA_AES_128_GCM_SHA256",
        "ECDHE",
        "RSA",
        "AES 128 GCM",
        "SHA256",
        "secure",
    )
}

fn rsa_aes128_cbc_sha() -> CipherSuite {
    suite(
        "TLS_RSA_WITH_AES_128_CBC_SHA",
        "AES128-SHA",
        "TLS_RSA_AES_128_CBC_SHA1",
        "RSA",
        "RSA",
        "AES 128 CBC",
        "SHA",
        "weak",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_hostname_accepts_bare_host() {
        assert_eq!(extract_hostname("example.com").as_deref(), Some("example.com"));
    }

    #[test]
    fn extract_hostname_strips_scheme_path_and_port() {
        assert_eq!(
            extract_hostname("https://Example.COM:8443/login?next=/").as_deref(),
            Some("example.com")
        );
    }

    #[test]
    fn extract_hostname_strips_userinfo() {
        assert_eq!(
            extract_hostname("https://user:pw@example.com").as_deref(),
            Some("example.com")
        );
    }

    #[test]
    fn extract_hostname_rejects_invalid_characters() {
        assert!(extract_hostname("exa_mple.com").is_none());
        assert!(extract_hostname("a b.com").is_none());
        assert!(extract_hostname("-bad.com").is_none());
    }

    #[test]
    fn extract_hostname_rejects_empty_labels() {
        assert!(extract_hostname("example..com").is_none());
        assert!(extract_hostname("https:///path").is_none());
    }

    #[test]
    fn tls_response_uses_camel_case_wire_names() {
        let response = TlsResponse {
            hostname: "example.com".to_string(),
            tls_versions: TlsVersions::default(),
            tls_connections: vec![connection("TLS 1.3", 0x0304, vec![aes128_gcm_sha256()])],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("tlsVersions").is_some());
        let conn = &json["tlsConnections"][0];
        assert_eq!(conn["versionId"], 772);
        let cipher = &conn["cipherSuites"][0];
        assert_eq!(cipher["isAEAD"], true);
        assert_eq!(cipher["isPFS"], true);
        assert_eq!(cipher["gnutlsName"], "TLS_AES_128_GCM_SHA256");
        assert_eq!(cipher["opensslName"], "TLS_AES_128_GCM_SHA256");
    }

    #[test]
    fn weak_suite_is_neither_aead_nor_pfs() {
        let cipher = rsa_aes128_cbc_sha();
        assert!(!cipher.is_aead);
        assert!(!cipher.is_pfs);
        assert_eq!(cipher.strength, "weak");
    }

    #[test]
    fn app_state_builders_compose() {
        let state = AppState::new()
            .with_delay(Duration::from_millis(5))
            .with_outage();
        assert_eq!(state.delay, Duration::from_millis(5));
        assert!(state.outage);
        assert_eq!(state.request_count(), 0);
    }
}
