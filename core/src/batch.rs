//! Concurrent execution of independent scans.
//!
//! # Design
//! `DevSecClient::batch` drives every descriptor through a bounded
//! `for_each_concurrent` stream. Each unit owns a mutable borrow of exactly
//! one descriptor, so outcomes land in their own slot regardless of
//! completion order, and the call returns only once every unit is done.

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::client::DevSecClient;
use crate::context::Context;
use crate::error::{ApiError, Result};
use crate::scan::{ScanResult, ScanType};

/// One scan in a batch, plus the slots its outcome is written to.
///
/// Start from a fresh descriptor: after the batch, exactly one of `result`
/// and `error` is set.
#[derive(Debug)]
pub struct BatchRequest {
    /// Scan tag: `"domain"`, `"http"` or `"tls"`.
    pub method: String,
    pub target: String,
    pub result: Option<ScanResult>,
    pub error: Option<ApiError>,
}

impl BatchRequest {
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            result: None,
            error: None,
        }
    }

    pub fn scan(scan: ScanType, target: impl Into<String>) -> Self {
        Self::new(scan.as_str(), target)
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_some() && self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn of(requests: &[BatchRequest]) -> Self {
        let succeeded = requests.iter().filter(|r| r.is_ok()).count();
        Self {
            succeeded,
            failed: requests.len() - succeeded,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

impl DevSecClient {
    /// Run every request concurrently and write each outcome into its slot.
    ///
    /// At most `max_concurrency` (taken from the configuration when the
    /// batch starts) requests are in flight at once. All of them share
    /// `ctx`: cancelling it fails the remaining items with
    /// `ApiError::Cancelled`, and this call still waits for all of them.
    /// A failing item never affects its siblings.
    pub async fn batch(&self, ctx: &Context, requests: &mut [BatchRequest]) -> BatchSummary {
        let limit = self.config().max_concurrency.max(1);
        debug!(items = requests.len(), limit, "starting batch");

        stream::iter(requests.iter_mut())
            .for_each_concurrent(limit, |request| async move {
                let outcome = self.run_batch_item(ctx, &request.method, &request.target).await;
                match outcome {
                    Ok(result) => request.result = Some(result),
                    Err(err) => request.error = Some(err),
                }
            })
            .await;

        let summary = BatchSummary::of(requests);
        debug!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "batch finished"
        );
        summary
    }

    async fn run_batch_item(&self, ctx: &Context, method: &str, target: &str) -> Result<ScanResult> {
        let scan: ScanType = method.parse()?;
        self.scan(ctx, scan, target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::DomainResponse;

    #[test]
    fn new_descriptor_has_empty_slots() {
        let req = BatchRequest::scan(ScanType::Tls, "example.com");
        assert_eq!(req.method, "tls");
        assert!(req.result.is_none());
        assert!(req.error.is_none());
        assert!(!req.is_ok());
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut ok = BatchRequest::new("domain", "a.test");
        ok.result = Some(ScanResult::Domain(DomainResponse::default()));
        let mut failed = BatchRequest::new("dns", "b.test");
        failed.error = Some(ApiError::InvalidMethod("dns".to_string()));

        let summary = BatchSummary::of(&[ok, failed, BatchRequest::new("tls", "c.test")]);
        assert_eq!(summary, BatchSummary { succeeded: 1, failed: 2 });
        assert_eq!(summary.total(), 3);
    }

    #[tokio::test]
    async fn invalid_tags_fail_without_network() {
        // Nothing listens on this endpoint; only invalid tags are submitted.
        let client = DevSecClient::with_config(Config::default().with_base_url("http://127.0.0.1:9")).unwrap();
        let mut requests = vec![
            BatchRequest::new("dns", "example.com"),
            BatchRequest::new("whois", "example.com"),
        ];

        let summary = client.batch(&Context::background(), &mut requests).await;

        assert_eq!(summary.failed, 2);
        for req in &requests {
            assert!(req.result.is_none());
            let err = req.error.as_ref().unwrap();
            assert!(err.to_string().contains(&req.method));
        }
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let client = DevSecClient::new().unwrap();
        let summary = client.batch(&Context::background(), &mut []).await;
        assert_eq!(summary.total(), 0);
    }
}
