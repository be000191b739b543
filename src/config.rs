//! Pipeline configuration
//!
//! One immutable [`Config`] value is built at startup and shared by
//! reference (behind an `Arc`) with the dispatcher, workers, and
//! collector. Nothing mutates it after construction.

use serde::Deserialize;
use std::path::PathBuf;

/// Default list-search endpoint.
pub const DEFAULT_SEARCH_URL: &str =
    "https://gmcngine-api.globalmissingkids.org/api/cases/search";

/// Default prefix for per-case detail lookups (case id is appended).
pub const DEFAULT_CASE_URL_PREFIX: &str =
    "https://gmcngine-api.globalmissingkids.org/api/cases/";

/// Default opaque search payload sent to the list endpoint.
pub const DEFAULT_SEARCH_QUERY: &str = "{\"request\":{\"page\":0,\"size\":1512,\"sort\":[{\"missingSince\":\"desc\"},\"fullName\"],\"search\":\"\",\"status\":\"open\"}}";

/// Default Origin header value.
pub const DEFAULT_ORIGIN: &str = "https://find.globalmissingkids.org";

/// Default Referer header value.
pub const DEFAULT_REFERER: &str = "https://find.globalmissingkids.org/";

/// Default number of concurrent resolver workers.
pub const DEFAULT_WORKERS: usize = 10;

/// Top-level configuration for one harvest run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// List-search endpoint (POST).
    pub search_url: String,
    /// Prefix for per-case detail lookups; the case id is appended.
    pub case_url_prefix: String,
    /// Opaque query payload posted to the list endpoint.
    pub search_query: String,
    /// Origin header for outbound requests; empty disables it.
    pub origin: String,
    /// Referer header for the list request; empty disables it.
    pub referer: String,
    /// Read the raw list response from this file instead of the network.
    pub in_data_file: Option<PathBuf>,
    /// Save the raw list response body to this file after fetching.
    pub out_data_file: Option<PathBuf>,
    /// Path of the CSV output sink.
    pub output: PathBuf,
    /// Image cache directory; `None` disables caching (pass-through fetch).
    pub cache_dir: Option<PathBuf>,
    /// Number of concurrent resolver workers.
    pub workers: usize,
}

impl Config {
    /// Detail-lookup URL for a case id.
    #[inline]
    #[must_use]
    pub fn case_url(&self, case_id: &str) -> String {
        format!("{}{}", self.case_url_prefix, case_id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            case_url_prefix: DEFAULT_CASE_URL_PREFIX.to_string(),
            search_query: DEFAULT_SEARCH_QUERY.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            in_data_file: None,
            out_data_file: None,
            output: PathBuf::from("../output/output.csv"),
            cache_dir: Some(PathBuf::from("../output/cache")),
            workers: DEFAULT_WORKERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_url_appends_id() {
        let config = Config {
            case_url_prefix: "http://api.example/cases/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.case_url("C-42"), "http://api.example/cases/C-42");
    }

    #[test]
    fn defaults_match_upstream() {
        let config = Config::default();
        assert_eq!(config.workers, 10);
        assert!(config.search_query.contains("missingSince"));
    }
}
