//! caseharvest - concurrent missing-child case harvester
//!
//! Retrieves a paginated case listing from a remote service, resolves
//! each entry into a detailed record over a bounded worker pool, caches
//! associated images content-addressed on disk, and emits one
//! normalized CSV row per resolved case.
//!
//! The heart of the crate is [`pipeline::run_pipeline`]: dispatcher,
//! resolver workers, and collector coordinated purely through channels,
//! with cooperative cancellation and per-item classified errors.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod sink;

pub use cache::{ImageCache, ResolvedImage};
pub use client::RemoteClient;
pub use config::Config;
pub use error::{CacheError, FatalError, ResolveError};
pub use model::{CaseDetail, CaseSummary, ChildRecord, SearchCasesResponse, Timestamp};
pub use pipeline::{run_pipeline, PipelineReport, Resolver};
pub use sink::{CsvSink, OutputRow, FIELD_COUNT};
