// Job runner: one tokio task per uploaded dump. Tasks wait on a semaphore, then run the
// CPU-bound pipeline on the blocking pool and publish the terminal state.
// Every job ends in `completed` or `error`, including when the pipeline panics.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::cache::ResultCache;
use crate::dump_repo::DumpRepo;
use crate::models::{MemoryDump, now_millis};
use crate::pipeline::{self, PipelineConfig};

/// Terminal outcome of one job, as seen by the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed(String),
    /// The dump left `pending` before the job started (e.g. failed at startup recovery).
    Skipped,
}

pub struct JobRunner {
    repo: Arc<DumpRepo>,
    cache: Arc<ResultCache>,
    config: Arc<PipelineConfig>,
    permits: Arc<Semaphore>,
    pub jobs_completed_total: Arc<AtomicU64>,
    pub jobs_failed_total: Arc<AtomicU64>,
}

impl JobRunner {
    pub fn new(
        repo: Arc<DumpRepo>,
        cache: Arc<ResultCache>,
        config: PipelineConfig,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            repo,
            cache,
            config: Arc::new(config),
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
            jobs_completed_total: Arc::new(AtomicU64::new(0)),
            jobs_failed_total: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawn the job for a freshly created (pending) dump. The buffer is owned by the job.
    pub fn submit(&self, dump: &MemoryDump, bytes: Bytes) -> JoinHandle<JobOutcome> {
        let job = Job {
            dump_id: dump.id,
            declared: dump.declared_format,
            repo: Arc::clone(&self.repo),
            cache: Arc::clone(&self.cache),
            config: Arc::clone(&self.config),
            permits: Arc::clone(&self.permits),
            completed: Arc::clone(&self.jobs_completed_total),
            failed: Arc::clone(&self.jobs_failed_total),
        };
        tokio::spawn(job.run(bytes))
    }

    pub fn jobs_completed(&self) -> u64 {
        self.jobs_completed_total.load(Ordering::Relaxed)
    }

    pub fn jobs_failed(&self) -> u64 {
        self.jobs_failed_total.load(Ordering::Relaxed)
    }
}

struct Job {
    dump_id: i64,
    declared: Option<crate::models::DumpFormat>,
    repo: Arc<DumpRepo>,
    cache: Arc<ResultCache>,
    config: Arc<PipelineConfig>,
    permits: Arc<Semaphore>,
    completed: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl Job {
    #[instrument(skip_all, fields(dump_id = self.dump_id, bytes = bytes.len()))]
    async fn run(self, bytes: Bytes) -> JobOutcome {
        let _permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(p) => p,
            Err(e) => {
                return self.fail(format!("job runner closed: {}", e)).await;
            }
        };

        match self.repo.mark_processing(self.dump_id).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(operation = "mark_processing", "dump no longer pending, skipping");
                return JobOutcome::Skipped;
            }
            Err(e) => {
                warn!(error = %e, operation = "mark_processing", "store error");
                return self.fail(format!("store error: {}", e)).await;
            }
        }

        let config = Arc::clone(&self.config);
        let declared = self.declared;
        let generated_at = now_millis();
        let result = tokio::task::spawn_blocking(move || {
            pipeline::process(&bytes, declared, &config, generated_at)
        })
        .await;

        let processed = match result {
            Ok(Ok(processed)) => processed,
            Ok(Err(e)) => {
                info!(error = %e, operation = "decode", "dump rejected");
                return self.fail(e.to_string()).await;
            }
            Err(e) => {
                warn!(error = %e, operation = "pipeline", "pipeline task failed");
                return self.fail(format!("internal error while processing dump: {}", e)).await;
            }
        };

        // Taken before the commit so a delete right after it keeps the id out of the cache.
        let generation = self.cache.generation().await;
        match self.repo.publish_completed(self.dump_id, &processed).await {
            Ok(true) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                info!(
                    operation = "publish",
                    format = %processed.format(),
                    records_count = processed.records.len(),
                    status = ?processed.analysis.status,
                    "dump completed"
                );
                self.cache
                    .insert_if_current(self.dump_id, Arc::new(processed), generation)
                    .await;
                JobOutcome::Completed
            }
            Ok(false) => {
                warn!(operation = "publish", "dump left processing before publish");
                JobOutcome::Skipped
            }
            Err(e) => {
                warn!(error = %e, operation = "publish", "store error");
                self.fail(format!("store error: {}", e)).await
            }
        }
    }

    async fn fail(&self, message: String) -> JobOutcome {
        self.failed.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.repo.mark_error(self.dump_id, &message).await {
            warn!(error = %e, operation = "mark_error", "could not record job failure");
        }
        JobOutcome::Failed(message)
    }
}
