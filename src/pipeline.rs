//! Concurrent case-resolution pipeline
//!
//! One dispatcher task streams case summaries into a shared work queue,
//! a fixed pool of resolver workers fans them out, and a single
//! collector drains results and errors, owns the sink, and decides
//! termination. Coordination is message-passing only; the cancellation
//! token is the single piece of shared state, checked cooperatively at
//! suspension points and never pre-empting in-flight I/O.
//!
//! Every dispatched item produces exactly one message: an output row or
//! a classified error. The collector terminates normally when the
//! completion count reaches the input size, or early when both intake
//! queues close (every worker has exited after cancellation).

use crate::cache::ImageCache;
use crate::client::RemoteClient;
use crate::config::Config;
use crate::error::{FatalError, ResolveError};
use crate::model::{CaseDetailResponse, CaseSummary};
use crate::sink::{CsvSink, OutputRow};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Literal detail status that rejects a case as a domain rule.
const STATUS_CLOSED: &str = "closed";

/// Outcome counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineReport {
    /// Items in the input list (the completion target).
    pub total: usize,
    /// Items actually pushed onto the work queue before any cancellation.
    pub submitted: usize,
    /// Rows written to the sink.
    pub rows_written: usize,
    /// Classified per-item errors.
    pub errors: usize,
    /// Whether cancellation was observed during the run.
    pub cancelled: bool,
}

impl PipelineReport {
    /// Items accounted for by the collector (success or error).
    #[inline]
    #[must_use]
    pub fn completed(&self) -> usize {
        self.rows_written + self.errors
    }
}

/// Resolves one case summary into an output row or a classified error.
#[derive(Debug, Clone)]
pub struct Resolver {
    config: Arc<Config>,
    client: RemoteClient,
    cache: ImageCache,
}

impl Resolver {
    /// Create a resolver sharing the client's connection pool.
    #[inline]
    #[must_use]
    pub fn new(config: Arc<Config>, client: RemoteClient, cache: ImageCache) -> Self {
        Self {
            config,
            client,
            cache,
        }
    }

    /// Process one case summary end to end.
    ///
    /// Detail lookup and decode failures, closed cases, and missing
    /// child records each classify into one [`ResolveError`]. Image
    /// fetch failures are swallowed: the corresponding data field stays
    /// empty and the row is still produced.
    ///
    /// # Errors
    /// One classified error per rejected item; never fatal.
    pub async fn resolve(&self, summary: &CaseSummary) -> Result<OutputRow, ResolveError> {
        let case_id = summary.case_id.clone();
        let child_id = summary.child_id.clone();
        info!(%case_id, %child_id, "resolving case");

        let body = self
            .client
            .get_case_detail(&case_id)
            .await
            .map_err(|source| ResolveError::Transport {
                case_id: case_id.clone(),
                child_id: child_id.clone(),
                source,
            })?;

        let detail: CaseDetailResponse =
            serde_json::from_str(&body).map_err(|source| ResolveError::Format {
                case_id: case_id.clone(),
                child_id: child_id.clone(),
                source,
            })?;
        let case = detail.case;

        if case.status == STATUS_CLOSED {
            return Err(ResolveError::CaseClosed { case_id, child_id });
        }

        let Some(child) = case.children.first() else {
            return Err(ResolveError::NoChildData { case_id, child_id });
        };

        let mut row = OutputRow::from_case(summary, child, self.config.case_url(&case_id));

        if !child.images.portrait.is_empty() {
            row.portrait_url = child.images.portrait.clone();
            match self.cache.resolve(&row.portrait_url).await {
                Ok(image) => row.portrait_base64 = image.data_base64,
                Err(err) => warn!(%case_id, %err, "portrait fetch failed"),
            }
        }

        if let Some(aux_url) = case.auxiliary_url() {
            row.auxiliary_url = aux_url.to_string();
            match self.cache.resolve(aux_url).await {
                Ok(image) => row.auxiliary_base64 = image.data_base64,
                Err(err) => warn!(%case_id, %err, "auxiliary image fetch failed"),
            }
        }

        Ok(row)
    }
}

/// Push each summary onto the work queue, one at a time.
///
/// The cancellation token is checked before every push; once set, the
/// remaining items are simply never submitted. Returns the number of
/// items actually submitted.
async fn dispatch(
    summaries: Vec<CaseSummary>,
    queue: mpsc::Sender<CaseSummary>,
    cancel: CancellationToken,
) -> usize {
    let mut submitted = 0;
    for summary in summaries {
        if cancel.is_cancelled() {
            break;
        }
        tokio::select! {
            () = cancel.cancelled() => break,
            sent = queue.send(summary) => {
                if sent.is_err() {
                    break;
                }
                submitted += 1;
            }
        }
    }
    submitted
}

/// Worker loop: pull from the shared queue until it closes or
/// cancellation is observed. Each item emits exactly one message on
/// exactly one of the outbound queues.
async fn worker_loop(
    resolver: Resolver,
    queue: Arc<Mutex<mpsc::Receiver<CaseSummary>>>,
    rows: mpsc::Sender<OutputRow>,
    errors: mpsc::Sender<ResolveError>,
    cancel: CancellationToken,
) {
    loop {
        let summary = tokio::select! {
            () = cancel.cancelled() => break,
            item = async { queue.lock().await.recv().await } => match item {
                Some(summary) => summary,
                None => break,
            },
        };

        match resolver.resolve(&summary).await {
            Ok(row) => {
                if rows.send(row).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                if errors.send(err).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Run the whole pipeline over an already-parsed input list.
///
/// Spawns the dispatcher and `config.workers` resolver workers, then
/// collects inline: rows go to the sink in the fixed column order,
/// errors are logged, and either outcome counts toward completion.
/// Rows arrive in completion order, not input order.
///
/// Returns once every dispatched item is accounted for, or once every
/// worker has exited after cancellation; all spawned tasks are joined
/// before returning.
///
/// # Errors
/// Only sink failures are fatal; they cancel the remaining work and
/// abort the run.
pub async fn run_pipeline(
    config: Arc<Config>,
    client: RemoteClient,
    summaries: Vec<CaseSummary>,
    sink: &mut CsvSink,
    cancel: CancellationToken,
) -> Result<PipelineReport, FatalError> {
    let total = summaries.len();
    let workers = config.workers.max(1);

    let (work_tx, work_rx) = mpsc::channel::<CaseSummary>(workers);
    let (row_tx, mut row_rx) = mpsc::channel::<OutputRow>(workers);
    let (err_tx, mut err_rx) = mpsc::channel::<ResolveError>(workers);

    let queue = Arc::new(Mutex::new(work_rx));
    let cache = ImageCache::new(client.clone(), config.cache_dir.clone());
    let resolver = Resolver::new(Arc::clone(&config), client, cache);

    let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(workers);
    for _ in 0..workers {
        handles.push(tokio::spawn(worker_loop(
            resolver.clone(),
            Arc::clone(&queue),
            row_tx.clone(),
            err_tx.clone(),
            cancel.clone(),
        )));
    }
    // Workers hold the only remaining senders; the intake queues close
    // when the last worker exits.
    drop(row_tx);
    drop(err_tx);

    let dispatcher = tokio::spawn(dispatch(summaries, work_tx, cancel.clone()));

    let mut report = PipelineReport {
        total,
        ..PipelineReport::default()
    };
    let mut rows_open = true;
    let mut errors_open = true;

    while report.completed() < total && (rows_open || errors_open) {
        tokio::select! {
            row = row_rx.recv(), if rows_open => match row {
                Some(row) => {
                    if let Err(err) = sink.write_row(row) {
                        cancel.cancel();
                        return Err(err);
                    }
                    report.rows_written += 1;
                }
                None => rows_open = false,
            },
            item_err = err_rx.recv(), if errors_open => match item_err {
                Some(item_err) => {
                    warn!("{item_err}");
                    report.errors += 1;
                }
                None => errors_open = false,
            },
        }
    }

    report.cancelled = cancel.is_cancelled();
    report.submitted = dispatcher.await.unwrap_or(0);
    for handle in handles {
        let _ = handle.await;
    }

    if report.completed() == total {
        sink.flush()?;
        info!(
            rows = report.rows_written,
            errors = report.errors,
            "work done"
        );
    } else {
        info!(
            completed = report.completed(),
            total, "pipeline stopped before completion"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(output: &std::path::Path) -> Arc<Config> {
        Arc::new(Config {
            output: output.to_path_buf(),
            cache_dir: None,
            workers: 2,
            ..Config::default()
        })
    }

    #[tokio::test]
    async fn empty_input_completes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir.path().join("out.csv"));
        let client = RemoteClient::new(Arc::clone(&config));
        let mut sink = CsvSink::create(&config.output).unwrap();

        let report = run_pipeline(
            config,
            client,
            Vec::new(),
            &mut sink,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.total, 0);
        assert_eq!(report.completed(), 0);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn pre_asserted_cancellation_submits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir.path().join("out.csv"));
        let client = RemoteClient::new(Arc::clone(&config));
        let mut sink = CsvSink::create(&config.output).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let summaries = vec![CaseSummary::default(), CaseSummary::default()];
        let report = run_pipeline(config, client, summaries, &mut sink, cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.submitted, 0);
        assert_eq!(report.rows_written, 0);
    }
}
