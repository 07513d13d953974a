//! Scan types offered by the API and their decoded results.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;
use crate::types::{DomainResponse, HttpProtocolResponse, TlsResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanType {
    Domain,
    Http,
    Tls,
}

impl ScanType {
    pub const ALL: [ScanType; 3] = [ScanType::Domain, ScanType::Http, ScanType::Tls];

    /// Tag used in batch descriptors and as the final path segment.
    pub fn as_str(self) -> &'static str {
        match self {
            ScanType::Domain => "domain",
            ScanType::Http => "http",
            ScanType::Tls => "tls",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            ScanType::Domain => "/domain",
            ScanType::Http => "/http",
            ScanType::Tls => "/tls",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanType {
    type Err = ApiError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        ScanType::ALL
            .into_iter()
            .find(|scan| scan.as_str() == tag)
            .ok_or_else(|| ApiError::InvalidMethod(tag.to_string()))
    }
}

/// The decoded outcome of one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    Domain(DomainResponse),
    Http(HttpProtocolResponse),
    Tls(TlsResponse),
}

impl ScanResult {
    pub fn scan_type(&self) -> ScanType {
        match self {
            ScanResult::Domain(_) => ScanType::Domain,
            ScanResult::Http(_) => ScanType::Http,
            ScanResult::Tls(_) => ScanType::Tls,
        }
    }

    pub fn hostname(&self) -> &str {
        match self {
            ScanResult::Domain(r) => &r.hostname,
            ScanResult::Http(r) => &r.hostname,
            ScanResult::Tls(r) => &r.hostname,
        }
    }

    pub fn as_domain(&self) -> Option<&DomainResponse> {
        match self {
            ScanResult::Domain(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_http(&self) -> Option<&HttpProtocolResponse> {
        match self {
            ScanResult::Http(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_tls(&self) -> Option<&TlsResponse> {
        match self {
            ScanResult::Tls(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags() {
        assert_eq!("domain".parse::<ScanType>().unwrap(), ScanType::Domain);
        assert_eq!("http".parse::<ScanType>().unwrap(), ScanType::Http);
        assert_eq!("tls".parse::<ScanType>().unwrap(), ScanType::Tls);
    }

    #[test]
    fn tags_match_exactly() {
        for tag in ["HTTP", "Domain", " tls ", "tls\n"] {
            let err = tag.parse::<ScanType>().unwrap_err();
            assert!(matches!(err, ApiError::InvalidMethod(ref got) if got == tag), "{tag:?}");
        }
    }

    #[test]
    fn unknown_tag_is_invalid_method() {
        let err = "dns".parse::<ScanType>().unwrap_err();
        assert!(matches!(err, ApiError::InvalidMethod(ref tag) if tag == "dns"));
        assert!(err.to_string().contains("dns"));
    }

    #[test]
    fn paths_match_tags() {
        for scan in ScanType::ALL {
            assert_eq!(scan.path(), format!("/{scan}"));
        }
    }

    #[test]
    fn result_accessors_match_variant() {
        let result = ScanResult::Http(HttpProtocolResponse {
            hostname: "example.com".to_string(),
            ..Default::default()
        });
        assert_eq!(result.scan_type(), ScanType::Http);
        assert_eq!(result.hostname(), "example.com");
        assert!(result.as_http().is_some());
        assert!(result.as_domain().is_none());
        assert!(result.as_tls().is_none());
    }
}
