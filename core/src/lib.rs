//! Async client for the DevSecTools scanning API.
//!
//! # Overview
//! Scans a host's domain, HTTP protocol support and TLS configuration via
//! `GET /domain`, `/http` and `/tls`, decoding the JSON answers into typed
//! structs. `DevSecClient::batch` runs many scans concurrently and writes
//! each outcome back into its own descriptor.
//!
//! # Design
//! - Request building and response parsing are pure (`build_*` / `parse_*`);
//!   only the executor performs I/O, bounded by a `Context` deadline.
//! - Configuration is an immutable snapshot swapped atomically; requests
//!   capture it when they start.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.
//!
//! ```no_run
//! # async fn demo() -> devsec_core::Result<()> {
//! use devsec_core::{Context, DevSecClient};
//!
//! let client = DevSecClient::new()?;
//! let tls = client.tls(&Context::background(), "example.com").await?;
//! println!("{}: {:?}", tls.hostname, tls.tls_versions.supported());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod client;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod scan;
pub mod types;

pub use batch::{BatchRequest, BatchSummary};
pub use client::{build_request, parse_response, DevSecClient};
pub use config::{Config, DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT};
pub use context::Context;
pub use endpoint::{Endpoint, LOCAL_DEV, PRODUCTION};
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use scan::{ScanResult, ScanType};
pub use types::{
    CipherSuite, DomainResponse, ErrorResponse, HttpProtocolResponse, TlsConnection, TlsResponse,
    TlsVersions,
};
