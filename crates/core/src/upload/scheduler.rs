//! Part scheduler
//!
//! Drains a FIFO queue of part numbers with at most `concurrency` uploads in
//! flight. A single coordinating loop owns the queue, the per-part state,
//! the current session identifier and the progress aggregator; part uploads
//! run as tasks in a `JoinSet` and report back through their join results.
//!
//! ```text
//!   queue ──pop_front──► dispatch ──► JoinSet (≤ C) ──join_next──► outcome
//!     ▲                                                              │
//!     └──────────── push_front (retryable failure) ◄─────────────────┘
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use mgsdb_common::resilience::{Backoff, BackoffStrategy, Jitter};
use mgsdb_domain::{PartStatus, PartUploadResponse, UploadError, UploadSettings};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::plan::{PartPlan, PartTask};
use super::ports::{PartUpload, UploadSource, UploadTransport};
use super::progress::ProgressAggregator;

/// Tuning for [`PartScheduler`]
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    pub part_size: u64,
    /// Maximum parts in flight
    pub concurrency: usize,
    /// `None` retries a transient part failure forever
    pub max_part_attempts: Option<u32>,
    /// Delay before each retry of the same part
    pub backoff: Backoff,
    pub part_timeout: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&UploadSettings::default())
    }
}

impl From<&UploadSettings> for SchedulerConfig {
    fn from(settings: &UploadSettings) -> Self {
        Self {
            part_size: settings.part_size,
            concurrency: settings.concurrency,
            max_part_attempts: settings.max_part_attempts,
            backoff: Backoff::new(
                BackoffStrategy::exponential(
                    Duration::from_millis(settings.retry_initial_delay_ms),
                    Duration::from_millis(settings.retry_max_delay_ms),
                ),
                Jitter::Equal,
            ),
            part_timeout: settings.part_timeout(),
        }
    }
}

struct PartOutcome {
    part_number: u32,
    result: Result<PartUploadResponse, UploadError>,
}

/// Everything a part task needs, cloned per dispatch
struct PartJob {
    transport: Arc<dyn UploadTransport>,
    source: Arc<dyn UploadSource>,
    cancel: CancellationToken,
    session_id: String,
    part_number: u32,
    total_parts: u32,
    range: std::ops::Range<u64>,
    delay: Duration,
    timeout: Option<Duration>,
}

impl PartJob {
    async fn run(self) -> PartOutcome {
        let part_number = self.part_number;
        let result = self.upload().await;
        PartOutcome { part_number, result }
    }

    async fn upload(self) -> Result<PartUploadResponse, UploadError> {
        if !self.delay.is_zero() {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(UploadError::Cancelled),
                () = tokio::time::sleep(self.delay) => {}
            }
        }
        if self.cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        let content = self.source.read_range(self.range).await?;
        let call = self.transport.upload_part(PartUpload {
            session_id: self.session_id,
            part_number: self.part_number,
            total_parts: self.total_parts,
            file_name: self.source.file_name().to_string(),
            content,
        });

        match self.timeout {
            Some(limit) => {
                tokio::time::timeout(limit, call).await.map_err(|_| UploadError::Timeout(limit))?
            }
            None => call.await,
        }
    }
}

/// Bounded-concurrency uploader for the parts of one session
pub struct PartScheduler {
    transport: Arc<dyn UploadTransport>,
    config: SchedulerConfig,
}

impl PartScheduler {
    pub fn new(transport: Arc<dyn UploadTransport>, config: SchedulerConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Upload every part of `plan` into `session_id`.
    ///
    /// Returns the session identifier as last rotated by the server, to be
    /// used for finalization. Transient part failures are requeued at the
    /// front of the queue; the first non-retryable failure stops further
    /// dispatching, lets in-flight parts settle, and is then returned.
    /// Cancellation aborts in-flight parts immediately.
    ///
    /// # Errors
    /// - `UploadError::Cancelled` if `cancel` fires
    /// - `UploadError::RetriesExhausted` if a part hits `max_part_attempts`
    /// - any non-retryable error reported by the transport or the source
    pub async fn run(
        &self,
        source: Arc<dyn UploadSource>,
        plan: &PartPlan,
        session_id: String,
        progress: &mut ProgressAggregator,
        cancel: &CancellationToken,
    ) -> Result<String, UploadError> {
        let concurrency = self.config.concurrency.max(1);
        let mut session_id = session_id;
        let mut tasks = plan.tasks();
        let mut queue: VecDeque<u32> = plan.part_numbers().collect();
        let mut in_flight: JoinSet<PartOutcome> = JoinSet::new();
        let mut fatal: Option<UploadError> = None;

        debug!(total_parts = plan.total_parts(), concurrency, "Scheduling parts");

        loop {
            if cancel.is_cancelled() {
                in_flight.abort_all();
                return Err(UploadError::Cancelled);
            }

            if fatal.is_none() {
                while in_flight.len() < concurrency {
                    let Some(part_number) = queue.pop_front() else { break };
                    let Some(task) = task_mut(&mut tasks, part_number) else { continue };
                    task.start();
                    let job = self.job_for(task, plan, &source, &session_id, cancel);
                    debug!(part_number, attempt = task.attempts(), "Dispatching part");
                    in_flight.spawn(job.run());
                }
            }

            if in_flight.is_empty() {
                break;
            }

            let joined = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    in_flight.abort_all();
                    return Err(UploadError::Cancelled);
                }
                joined = in_flight.join_next() => joined,
            };
            let Some(joined) = joined else { break };

            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    fatal.get_or_insert_with(|| {
                        UploadError::fatal(format!("part task failed: {join_err}"))
                    });
                    continue;
                }
            };

            let Some(task) = task_mut(&mut tasks, outcome.part_number) else { continue };
            match outcome.result {
                Ok(response) => {
                    task.complete();
                    if let Some(rotated) = response.upload_session.filter(|id| !id.is_empty()) {
                        if rotated != session_id {
                            debug!(part_number = task.part_number, "Upload session rotated");
                            session_id = rotated;
                        }
                    }
                    progress.advance(task.len());
                    debug!(part_number = task.part_number, "Part acknowledged");
                }
                Err(err) if err.is_retryable() && fatal.is_none() => {
                    task.fail();
                    if let Some(limit) = self.config.max_part_attempts {
                        if task.attempts() >= limit {
                            warn!(
                                part_number = task.part_number,
                                attempts = task.attempts(),
                                error = %err,
                                "Part exhausted its attempts"
                            );
                            fatal = Some(UploadError::RetriesExhausted {
                                part_number: task.part_number,
                                attempts: task.attempts(),
                                last_error: err.to_string(),
                            });
                            continue;
                        }
                    }
                    warn!(
                        part_number = task.part_number,
                        attempts = task.attempts(),
                        error = %err,
                        "Part failed, requeueing"
                    );
                    task.requeue();
                    queue.push_front(task.part_number);
                }
                Err(err) => {
                    task.fail();
                    if fatal.is_none() {
                        warn!(
                            part_number = task.part_number,
                            error = %err,
                            "Part failed fatally, draining in-flight parts"
                        );
                        fatal = Some(err);
                    }
                }
            }
        }

        if let Some(err) = fatal {
            return Err(err);
        }

        let outstanding = tasks.iter().filter(|t| t.status() != PartStatus::Done).count();
        if outstanding > 0 {
            return Err(UploadError::fatal(format!(
                "{outstanding} parts were never acknowledged"
            )));
        }

        info!(total_parts = plan.total_parts(), "All parts uploaded");
        Ok(session_id)
    }

    fn job_for(
        &self,
        task: &PartTask,
        plan: &PartPlan,
        source: &Arc<dyn UploadSource>,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> PartJob {
        let retry_number = task.attempts().saturating_sub(1);
        let delay = match retry_number {
            0 => Duration::ZERO,
            n => self.config.backoff.delay_for(n - 1),
        };
        PartJob {
            transport: Arc::clone(&self.transport),
            source: Arc::clone(source),
            cancel: cancel.clone(),
            session_id: session_id.to_string(),
            part_number: task.part_number,
            total_parts: plan.total_parts(),
            range: task.range.clone(),
            delay,
            timeout: self.config.part_timeout,
        }
    }
}

fn task_mut(tasks: &mut [PartTask], part_number: u32) -> Option<&mut PartTask> {
    let index = usize::try_from(part_number.checked_sub(1)?).ok()?;
    tasks.get_mut(index)
}
