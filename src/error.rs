//! Error types for the harvest pipeline
//!
//! Two tiers, matching the pipeline's failure model:
//! - [`ResolveError`]: per-item, classified, recoverable. Reported on
//!   the error queue and counted toward completion; never aborts the run.
//! - [`FatalError`]: process-level. Sink or top-level list failures stop
//!   the whole run immediately.

/// Fatal, process-level errors
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    /// List request could not be issued or read
    #[error("list request failed: {0}")]
    ListRequest(#[source] reqwest::Error),

    /// Top-level list response did not parse
    #[error("malformed list response: {0}")]
    MalformedList(#[from] serde_json::Error),

    /// Input data file could not be read
    #[error("cannot read input data file [{path}]: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },

    /// Output sink could not be created
    #[error("cannot create output file [{path}]: {source}")]
    SinkOpen {
        path: String,
        source: std::io::Error,
    },

    /// A row failed to reach the sink
    #[error("error writing output row: {0}")]
    SinkWrite(#[from] csv::Error),

    /// Sink flush failed at completion
    #[error("error flushing output: {0}")]
    SinkFlush(#[source] std::io::Error),
}

/// Per-item classified errors produced by a resolver worker
///
/// Exactly one of these (or one output row) is emitted for every
/// dispatched case summary.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Detail lookup failed at the transport level
    #[error("error downloading case [{case_id}] child [{child_id}] info: {source}")]
    Transport {
        case_id: String,
        child_id: String,
        #[source]
        source: reqwest::Error,
    },

    /// Detail response did not deserialize
    #[error("error decoding case [{case_id}] child [{child_id}] info: {source}")]
    Format {
        case_id: String,
        child_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Case status is "closed" - a domain rejection, not a failure
    #[error("case [{case_id}] for child [{child_id}] is closed")]
    CaseClosed { case_id: String, child_id: String },

    /// Detail record carried no child entries
    #[error("no child data available for case [{case_id}] child [{child_id}]")]
    NoChildData { case_id: String, child_id: String },
}

impl ResolveError {
    /// True for transport/format failures, false for domain rejections
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Format { .. })
    }

    /// Case id of the item this error classifies
    #[inline]
    #[must_use]
    pub fn case_id(&self) -> &str {
        match self {
            Self::Transport { case_id, .. }
            | Self::Format { case_id, .. }
            | Self::CaseClosed { case_id, .. }
            | Self::NoChildData { case_id, .. } => case_id,
        }
    }
}

/// Image cache failures
///
/// Always non-fatal to the row being assembled: the resolver swallows
/// these and leaves the image fields empty.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Image fetch failed
    #[error("error downloading image [{url}]: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
