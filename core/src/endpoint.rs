//! API deployments the client can talk to.

use std::borrow::Cow;
use std::fmt;

/// A base URL identifying one deployment of the API.
///
/// The well-known deployments are `const` values; using one copies it into
/// the configuration, so no caller can change what `PRODUCTION` means.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    base_url: Cow<'static, str>,
}

/// The public DevSecTools API.
pub const PRODUCTION: Endpoint = Endpoint::from_static("https://api.devsec.tools");

/// A locally running development deployment.
pub const LOCAL_DEV: Endpoint = Endpoint::from_static("http://api.devsec.local");

impl Endpoint {
    /// A custom endpoint. The URL is checked only when a request is built.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Cow::Owned(base_url.into()),
        }
    }

    pub const fn from_static(base_url: &'static str) -> Self {
        Self {
            base_url: Cow::Borrowed(base_url),
        }
    }

    /// Resolve a preset name, or treat anything with a scheme as a custom URL.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(PRODUCTION),
            "local" | "localdev" | "local-dev" => Some(LOCAL_DEV),
            _ if name.contains("://") => Some(Self::new(name.trim())),
            _ => None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        PRODUCTION
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_have_expected_urls() {
        assert_eq!(PRODUCTION.base_url(), "https://api.devsec.tools");
        assert_eq!(LOCAL_DEV.base_url(), "http://api.devsec.local");
    }

    #[test]
    fn endpoints_compare_by_value() {
        assert_eq!(Endpoint::new("https://api.devsec.tools"), PRODUCTION);
        assert_ne!(PRODUCTION, LOCAL_DEV);
    }

    #[test]
    fn modifying_a_copy_leaves_the_preset_alone() {
        let mut endpoint = PRODUCTION;
        endpoint = Endpoint::new(format!("{endpoint}/v2"));
        assert_eq!(endpoint.base_url(), "https://api.devsec.tools/v2");
        assert_eq!(PRODUCTION.base_url(), "https://api.devsec.tools");
    }

    #[test]
    fn from_name_resolves_presets_and_urls() {
        assert_eq!(Endpoint::from_name("Production"), Some(PRODUCTION));
        assert_eq!(Endpoint::from_name("local-dev"), Some(LOCAL_DEV));
        assert_eq!(
            Endpoint::from_name(" http://127.0.0.1:3000 "),
            Some(Endpoint::new("http://127.0.0.1:3000"))
        );
        assert_eq!(Endpoint::from_name("staging"), None);
    }
}
