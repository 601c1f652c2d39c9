//! Upload orchestration
//!
//! Chooses between the direct upload and the session protocol, then drives
//! negotiation, the part scheduler and finalization while publishing
//! progress.

use std::future::Future;
use std::sync::Arc;

use mgsdb_domain::{UploadError, UploadPhase, UploadProgress, UploadSettings, UploadedFile};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::plan::PartPlan;
use super::ports::{UploadSource, UploadTransport};
use super::progress::ProgressAggregator;
use super::scheduler::{PartScheduler, SchedulerConfig};
use super::session::{FileReference, SessionFinalizer, SessionNegotiator};

/// Entry point for uploading one file
pub struct UploadEngine {
    transport: Arc<dyn UploadTransport>,
    negotiator: SessionNegotiator,
    scheduler: PartScheduler,
    finalizer: SessionFinalizer,
}

impl UploadEngine {
    pub fn new(transport: Arc<dyn UploadTransport>, config: SchedulerConfig) -> Self {
        Self {
            negotiator: SessionNegotiator::new(Arc::clone(&transport)),
            scheduler: PartScheduler::new(Arc::clone(&transport), config),
            finalizer: SessionFinalizer::new(Arc::clone(&transport)),
            transport,
        }
    }

    pub fn from_settings(transport: Arc<dyn UploadTransport>, settings: &UploadSettings) -> Self {
        Self::new(transport, SchedulerConfig::from(settings))
    }

    pub fn config(&self) -> &SchedulerConfig {
        self.scheduler.config()
    }

    /// Upload `source`, publishing progress into `progress`.
    ///
    /// Files smaller than one part go through a single direct call; larger
    /// files are split into parts and pushed through an upload session.
    /// `progress` is dropped on return, closing the channel for observers.
    ///
    /// # Errors
    /// Returns the first fatal [`UploadError`]; transient part failures are
    /// retried internally.
    #[instrument(
        skip_all,
        fields(upload_id = %Uuid::new_v4(), file = %source.file_name(), size = source.len())
    )]
    pub async fn upload(
        &self,
        source: Arc<dyn UploadSource>,
        cancel: CancellationToken,
        progress: watch::Sender<UploadProgress>,
    ) -> Result<UploadedFile, UploadError> {
        let size = source.len();
        let part_size = self.config().part_size;

        let (plan, total_parts) = if size < part_size {
            (None, 1)
        } else {
            let plan = PartPlan::new(size, part_size)?;
            (Some(plan), plan.total_parts())
        };
        let mut aggregator = ProgressAggregator::with_sender(progress, size, total_parts);

        let result = match plan {
            None => self.upload_direct(source, &mut aggregator, &cancel).await,
            Some(plan) => self.upload_multipart(source, plan, &mut aggregator, &cancel).await,
        };

        match &result {
            Ok(file) => {
                aggregator.set_phase(UploadPhase::Completed);
                info!(file_url = %file.file_url, parts = file.parts, "Upload completed");
            }
            Err(UploadError::Cancelled) => {
                aggregator.set_phase(UploadPhase::Cancelled);
                info!("Upload cancelled");
            }
            Err(err) => {
                aggregator.set_phase(UploadPhase::Failed);
                warn!(error = %err, "Upload failed");
            }
        }
        result
    }

    /// Run [`upload`](Self::upload) on a background task.
    pub fn spawn(self: &Arc<Self>, source: Arc<dyn UploadSource>) -> UploadHandle {
        let cancel = CancellationToken::new();
        let (sender, progress) = watch::channel(UploadProgress::new(source.len(), 0));
        let engine = Arc::clone(self);
        let task_cancel = cancel.clone();
        let join = tokio::spawn(async move { engine.upload(source, task_cancel, sender).await });
        UploadHandle { progress, cancel, join }
    }

    async fn upload_direct(
        &self,
        source: Arc<dyn UploadSource>,
        progress: &mut ProgressAggregator,
        cancel: &CancellationToken,
    ) -> Result<UploadedFile, UploadError> {
        progress.set_phase(UploadPhase::Transferring);
        let size = source.len();

        let content = until_cancelled(cancel, source.read_range(0..size)).await?;
        let (sent, mut sent_rx) = watch::channel(0);
        let call = self.transport.upload_direct(source.file_name(), content, sent);
        tokio::pin!(call);

        let mut reporting = true;
        let response = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(UploadError::Cancelled),
                result = &mut call => break result?,
                changed = sent_rx.changed(), if reporting => match changed {
                    Ok(()) => progress.report_sent(*sent_rx.borrow_and_update()),
                    Err(_) => reporting = false,
                },
            }
        };
        let reference = FileReference::from_response(response)?;
        progress.advance(size.saturating_sub(progress.snapshot().bytes_done));

        Ok(UploadedFile { file_url: reference.file_url, key: reference.key, size, parts: 1 })
    }

    async fn upload_multipart(
        &self,
        source: Arc<dyn UploadSource>,
        plan: PartPlan,
        progress: &mut ProgressAggregator,
        cancel: &CancellationToken,
    ) -> Result<UploadedFile, UploadError> {
        progress.set_phase(UploadPhase::Negotiating);
        let session_id =
            until_cancelled(cancel, self.negotiator.open(source.file_name(), plan.total_parts()))
                .await?;

        progress.set_phase(UploadPhase::Transferring);
        let session_id =
            self.scheduler.run(Arc::clone(&source), &plan, session_id, progress, cancel).await?;

        progress.set_phase(UploadPhase::Finalizing);
        let reference = until_cancelled(cancel, self.finalizer.complete(&session_id)).await?;

        Ok(UploadedFile {
            file_url: reference.file_url,
            key: reference.key,
            size: plan.size(),
            parts: plan.total_parts(),
        })
    }
}

/// Background upload started by [`UploadEngine::spawn`]
pub struct UploadHandle {
    progress: watch::Receiver<UploadProgress>,
    cancel: CancellationToken,
    join: JoinHandle<Result<UploadedFile, UploadError>>,
}

impl UploadHandle {
    /// Receiver of progress snapshots; closes when the upload ends.
    pub fn progress(&self) -> watch::Receiver<UploadProgress> {
        self.progress.clone()
    }

    /// Request cancellation; in-flight part calls are abandoned.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the upload to finish.
    ///
    /// # Errors
    /// Returns the upload's error, or `UploadError::Cancelled` /
    /// a fatal transport error if the background task itself died.
    pub async fn wait(self) -> Result<UploadedFile, UploadError> {
        match self.join.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(UploadError::Cancelled),
            Err(err) => Err(UploadError::fatal(format!("upload task failed: {err}"))),
        }
    }
}

async fn until_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, UploadError>
where
    F: Future<Output = Result<T, UploadError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(UploadError::Cancelled),
        result = fut => result,
    }
}
