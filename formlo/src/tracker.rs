//! Conversion job tracking.
//!
//! Owns the lifecycle of one in-flight conversion: submission, the
//! fixed-interval status poll, terminal-state detection, and
//! cancellation of the poll loop. Polling runs as a spawned task bound
//! to a [`CancellationToken`]; the token is triggered by a terminal
//! status, by logout or tracker teardown, and by a newer submission
//! superseding the old one. At most one job is observed at a time.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, ApiError, ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES};
use crate::models::{ConversionJob, JobStatus};

/// Backend operations the tracker needs.
///
/// [`ApiClient`] is the production source; tests drive the poll loop
/// with scripted sources instead of a live backend.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Upload a document, creating a new conversion job.
    async fn submit(&self, filename: &str, bytes: Vec<u8>) -> Result<ConversionJob, ApiError>;
    /// Read the current status of a job.
    async fn fetch(&self, job_id: &str) -> Result<ConversionJob, ApiError>;
}

#[async_trait]
impl JobSource for ApiClient {
    async fn submit(&self, filename: &str, bytes: Vec<u8>) -> Result<ConversionJob, ApiError> {
        self.upload(filename, bytes).await
    }

    async fn fetch(&self, job_id: &str) -> Result<ConversionJob, ApiError> {
        self.job(job_id).await
    }
}

/// Poll cadence and bounds.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between consecutive status queries.
    pub interval: Duration,
    /// Upper bound on total polling time before the tracker gives up
    /// on observing a terminal status.
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(600),
        }
    }
}

/// Terminal signal emitted at most once per tracked job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The backend reported `completed`.
    Completed,
    /// The backend reported `failed`.
    Failed {
        /// The backend's error message for the job.
        message: String,
    },
    /// The poll deadline elapsed without a terminal status. The job
    /// may still finish server-side; the client just stops watching.
    TimedOut,
}

/// Errors surfaced when a submission is rejected before polling starts.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The path has no usable file name.
    #[error("{path} is not a usable file name")]
    InvalidPath {
        /// The offending path.
        path: String,
    },

    /// The extension is not in the allow-list.
    #[error("unsupported file type {extension:?}; allowed types are {}", ALLOWED_EXTENSIONS.join(", "))]
    UnsupportedType {
        /// Lowercased extension of the rejected file.
        extension: String,
    },

    /// The file exceeds the client-side size cap.
    #[error("file is {size} bytes, over the 10 MB upload limit")]
    TooLarge {
        /// Size of the rejected file in bytes.
        size: u64,
    },

    /// The file could not be read from disk.
    #[error("could not read {path}: {source}")]
    Read {
        /// The offending path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The upload itself failed; no job was created.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A live view of the job being tracked.
pub struct JobHandle {
    /// Backend-assigned job identifier.
    pub job_id: String,
    /// Source file name as submitted (client-held).
    pub filename: String,
    /// Receives each status snapshot as polls come back. The latest
    /// snapshot wholesale-replaces the previous one.
    pub updates: watch::Receiver<ConversionJob>,
    /// Resolves once with the terminal outcome. The sender is dropped
    /// without a value when observation ends first (poll transport
    /// failure), leaving the job in its last-known state.
    pub outcome: oneshot::Receiver<JobOutcome>,
}

/// Tracks at most one conversion job at a time.
pub struct JobTracker {
    source: Arc<dyn JobSource>,
    config: PollConfig,
    active: Option<ActivePoll>,
}

struct ActivePoll {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl JobTracker {
    /// Create a tracker polling `source` with the given cadence.
    pub fn new(source: Arc<dyn JobSource>, config: PollConfig) -> Self {
        Self {
            source,
            config,
            active: None,
        }
    }

    /// Validate and submit a document, then start polling its job.
    ///
    /// The allow-list and size cap are checked against file metadata
    /// before any bytes are read. A transport or API failure surfaces
    /// immediately and creates no job; in that case any earlier poll
    /// loop keeps running. On success the previous loop, if any, is
    /// cancelled before the new one starts.
    pub async fn submit(&mut self, path: &Path) -> Result<JobHandle, SubmitError> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| SubmitError::InvalidPath {
                path: path.display().to_string(),
            })?
            .to_string();

        let size = tokio::fs::metadata(path)
            .await
            .map_err(|source| SubmitError::Read {
                path: path.display().to_string(),
                source,
            })?
            .len();
        validate_upload(&filename, size)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SubmitError::Read {
                path: path.display().to_string(),
                source,
            })?;

        let job = self.source.submit(&filename, bytes).await?;
        tracing::info!(job_id = %job.id, %filename, "conversion job created");

        Ok(self.track(job, filename))
    }

    /// Begin observing an already-created job. Supersedes and cancels
    /// any poll loop still running.
    pub(crate) fn track(&mut self, job: ConversionJob, filename: String) -> JobHandle {
        self.cancel();

        let job_id = job.id.clone();
        let cancel = CancellationToken::new();
        let (update_tx, updates) = watch::channel(job);
        let (outcome_tx, outcome) = oneshot::channel();

        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.source),
            job_id.clone(),
            self.config.clone(),
            cancel.clone(),
            update_tx,
            outcome_tx,
        ));
        self.active = Some(ActivePoll { cancel, handle });

        JobHandle {
            job_id,
            filename,
            updates,
            outcome,
        }
    }

    /// Stop observing the active job, if any.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }

    /// Whether a poll loop is currently running.
    pub fn is_tracking(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Client-side guard applied before any bytes are transferred. The
/// backend enforces the same rules authoritatively.
pub fn validate_upload(filename: &str, size: u64) -> Result<(), SubmitError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(SubmitError::UnsupportedType { extension });
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(SubmitError::TooLarge { size });
    }
    Ok(())
}

/// Poll a job until a terminal status, the deadline, a transport
/// failure, or cancellation, whichever comes first.
async fn poll_loop(
    source: Arc<dyn JobSource>,
    job_id: String,
    config: PollConfig,
    cancel: CancellationToken,
    updates: watch::Sender<ConversionJob>,
    outcome: oneshot::Sender<JobOutcome>,
) {
    let deadline = tokio::time::Instant::now() + config.max_wait;
    let start = tokio::time::Instant::now() + config.interval;
    let mut ticker = tokio::time::interval_at(start, config.interval);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!(%job_id, "poll loop cancelled");
                return;
            }
            () = tokio::time::sleep_until(deadline) => {
                tracing::warn!(%job_id, "gave up waiting for a terminal status");
                let _ = outcome.send(JobOutcome::TimedOut);
                return;
            }
            _ = ticker.tick() => {}
        }

        match source.fetch(&job_id).await {
            Ok(job) => {
                if cancel.is_cancelled() {
                    return;
                }
                let status = job.status;
                let error_message = job.error_message.clone();
                let _ = updates.send(job);

                match status {
                    JobStatus::Completed => {
                        let _ = outcome.send(JobOutcome::Completed);
                        return;
                    }
                    JobStatus::Failed => {
                        let message =
                            error_message.unwrap_or_else(|| "conversion failed".to_string());
                        let _ = outcome.send(JobOutcome::Failed { message });
                        return;
                    }
                    _ => {}
                }
            }
            Err(err) => {
                // Transport failure is fatal to observation; the job
                // stays in its last-known state and is never retried.
                tracing::warn!(%job_id, error = %err, "status poll failed; stopping observation");
                return;
            }
        }
    }
}
