//! Response payloads of the DevSecTools API.
//!
//! # Design
//! These mirror the wire format documented by the API but are defined
//! independently of the mock server's copies; the integration tests catch
//! any schema drift between the two.
//!
//! Decoding is lenient: missing fields take their default value and `null`
//! collections decode as empty, matching what the API's backend emits for
//! hosts it could not fully scan.

use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response of `/domain`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainResponse {
    pub hostname: String,
}

/// Response of `/http`: which HTTP protocol versions the host speaks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpProtocolResponse {
    pub hostname: String,
    pub http11: bool,
    pub http2: bool,
    pub http3: bool,
}

/// Response of `/tls`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TlsResponse {
    pub hostname: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tls_versions: TlsVersions,
    #[serde(deserialize_with = "null_as_default")]
    pub tls_connections: Vec<TlsConnection>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsVersions {
    pub tls10: bool,
    pub tls11: bool,
    pub tls12: bool,
    pub tls13: bool,
}

impl TlsVersions {
    /// Names of the enabled versions, oldest first.
    pub fn supported(&self) -> Vec<&'static str> {
        [
            (self.tls10, "TLS 1.0"),
            (self.tls11, "TLS 1.1"),
            (self.tls12, "TLS 1.2"),
            (self.tls13, "TLS 1.3"),
        ]
        .into_iter()
        .filter_map(|(enabled, name)| enabled.then_some(name))
        .collect()
    }
}

/// Handshake details for one negotiated TLS version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TlsConnection {
    pub version: String,
    pub version_id: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub cipher_suites: Vec<CipherSuite>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
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

impl CipherSuite {
    /// `true` for suites rated "secure" or "recommended".
    pub fn is_secure(&self) -> bool {
        matches!(
            self.strength.to_ascii_lowercase().as_str(),
            "secure" | "recommended"
        )
    }
}

/// Body of any response with status >= 400. Kept strict: a body without
/// `error` is reported raw instead of as an empty message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
