//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use surveydoc_core::config::worker::WorkerConfig;
use surveydoc_core::error::AppError;

use crate::jobs::BlobSweepJob;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Schedules and tenant list
    config: WorkerConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, config })
    }

    /// Register the blob sweep on `worker.sweep_schedule`
    pub async fn register_blob_sweep(&self, job: BlobSweepJob) -> Result<(), AppError> {
        let job = Arc::new(job);
        let schedule = self.config.sweep_schedule.clone();
        let cron = CronJob::new_async(schedule.as_str(), move |_uuid, _lock| {
            let job = Arc::clone(&job);
            Box::pin(async move {
                tracing::debug!("Starting scheduled blob sweep");
                job.run().await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid sweep schedule '{}': {}", schedule, e))
        })?;

        self.scheduler
            .add(cron)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add blob_sweep schedule: {}", e)))?;

        tracing::info!(schedule = %schedule, "Registered: blob_sweep");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use surveydoc_core::error::ErrorKind;
    use surveydoc_database::MemoryDocumentStore;
    use surveydoc_service::BlobSweeper;
    use surveydoc_storage::MemoryBlobStore;

    use super::*;

    fn job() -> BlobSweepJob {
        let sweeper = BlobSweeper::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryBlobStore::new()),
            3600,
        );
        BlobSweepJob::new(Arc::new(sweeper), vec!["acme".into()])
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejects_invalid_schedule() {
        let config = WorkerConfig {
            sweep_schedule: "every full moon".into(),
            ..Default::default()
        };
        let scheduler = CronScheduler::new(config).await.unwrap();
        let err = scheduler.register_blob_sweep(job()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_registers_default_schedule() {
        let scheduler = CronScheduler::new(WorkerConfig::default()).await.unwrap();
        scheduler.register_blob_sweep(job()).await.unwrap();
    }
}
