//! HTTP client for the two remote endpoints and image downloads
//!
//! Stateless beyond the shared connection pool: each call is a single
//! request with no retry and no timeout tuning beyond the transport
//! default.

use crate::config::Config;
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use tracing::debug;

const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

/// Outbound HTTP operations: list search, per-case detail, image GET.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: Client,
    config: Arc<Config>,
}

impl RemoteClient {
    /// Create a client sharing one connection pool across all workers.
    #[inline]
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Apply the configured Origin header, if set.
    fn with_origin(&self, req: RequestBuilder) -> RequestBuilder {
        if self.config.origin.is_empty() {
            req
        } else {
            req.header("Origin", &self.config.origin)
        }
    }

    /// Fetch the raw list-search response body.
    ///
    /// Posts the configured opaque query payload. The body is returned
    /// unparsed; the caller decides whether a malformed response is
    /// fatal.
    ///
    /// # Errors
    /// Any transport failure, with no further classification.
    pub async fn list_cases(&self) -> Result<String, reqwest::Error> {
        let mut req = self
            .client
            .post(&self.config.search_url)
            .header("Content-type", JSON_CONTENT_TYPE)
            .body(self.config.search_query.clone());
        req = self.with_origin(req);
        if !self.config.referer.is_empty() {
            req = req.header("Referer", &self.config.referer);
        }

        debug!(url = %self.config.search_url, "fetching case list");
        let resp = req.send().await?;
        resp.text().await
    }

    /// Fetch the raw detail response body for one case id.
    ///
    /// # Errors
    /// Any transport failure, with no further classification.
    pub async fn get_case_detail(&self, case_id: &str) -> Result<String, reqwest::Error> {
        let url = self.config.case_url(case_id);
        let mut req = self
            .client
            .get(&url)
            .header("Content-type", JSON_CONTENT_TYPE);
        req = self.with_origin(req);

        debug!(%url, "fetching case detail");
        let resp = req.send().await?;
        resp.text().await
    }

    /// Fetch raw image bytes from an arbitrary URL.
    ///
    /// # Errors
    /// Any transport failure.
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let resp = self.client.get(url).send().await?;
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }
}
