// Background worker: discard terminal dumps older than retention_days every
// retention_interval_secs and evict them from the cache. VACUUM follows its own
// schedule (cron expression in local time, or a fixed interval).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, instrument, warn};

use crate::cache::ResultCache;
use crate::dump_repo::DumpRepo;
use crate::models::now_millis;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone)]
pub struct RetentionWorkerConfig {
    pub retention_days: u32,
    pub retention_interval_secs: u64,
    /// Optional cron expression for VACUUM (e.g. "0 0 3 * * *" = 03:00 daily). Uses local time.
    pub vacuum_schedule: Option<String>,
    /// Run VACUUM every N seconds when vacuum_schedule is not set.
    pub vacuum_interval_secs: u64,
}

impl From<&crate::config::DatabaseConfig> for RetentionWorkerConfig {
    fn from(db: &crate::config::DatabaseConfig) -> Self {
        Self {
            retention_days: db.retention_days,
            retention_interval_secs: db.retention_interval_secs,
            vacuum_schedule: db.vacuum_schedule.clone(),
            vacuum_interval_secs: db.vacuum_interval_secs,
        }
    }
}

/// When the next VACUUM is due.
#[derive(Debug, Clone)]
enum VacuumSchedule {
    Cron(Box<cron::Schedule>),
    Every(Duration),
    Off,
}

impl VacuumSchedule {
    fn from_config(config: &RetentionWorkerConfig) -> Self {
        match config.vacuum_schedule.as_deref() {
            Some(expr) => match cron::Schedule::from_str(expr) {
                Ok(schedule) => VacuumSchedule::Cron(Box::new(schedule)),
                Err(e) => {
                    warn!(cron = %expr, error = %e, "invalid vacuum_schedule; VACUUM will not run");
                    VacuumSchedule::Off
                }
            },
            None if config.vacuum_interval_secs > 0 => {
                VacuumSchedule::Every(Duration::from_secs(config.vacuum_interval_secs))
            }
            None => VacuumSchedule::Off,
        }
    }

    fn next_delay(&self) -> Option<Duration> {
        match self {
            VacuumSchedule::Cron(schedule) => {
                let now = chrono::Local::now();
                // An exhausted schedule is re-checked hourly.
                let delay = match schedule.after(&now).next() {
                    Some(next) => (next - now).to_std().unwrap_or(Duration::from_secs(1)),
                    None => Duration::from_secs(3600),
                };
                Some(delay)
            }
            VacuumSchedule::Every(interval) => Some(*interval),
            VacuumSchedule::Off => None,
        }
    }
}

/// Spawns the retention worker. Returns a join handle.
pub fn spawn(
    repo: Arc<DumpRepo>,
    cache: Arc<ResultCache>,
    config: RetentionWorkerConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(repo, cache, config).await;
    })
}

#[instrument(skip(repo, cache), fields(interval_secs = config.retention_interval_secs))]
async fn run(repo: Arc<DumpRepo>, cache: Arc<ResultCache>, config: RetentionWorkerConfig) {
    let mut prune_interval =
        tokio::time::interval(Duration::from_secs(config.retention_interval_secs.max(1)));
    prune_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let schedule = VacuumSchedule::from_config(&config);
    let mut next_vacuum = schedule.next_delay().map(|d| Instant::now() + d);

    loop {
        let vacuum_at = next_vacuum.unwrap_or_else(Instant::now);
        tokio::select! {
            _ = prune_interval.tick() => {
                if let Err(e) = run_one_tick(&repo, &cache, &config).await {
                    warn!(error = %e, operation = "prune", "retention tick failed");
                }
            }
            _ = tokio::time::sleep_until(vacuum_at), if next_vacuum.is_some() => {
                match repo.vacuum().await {
                    Ok(()) => info!(operation = "vacuum", "vacuum complete"),
                    Err(e) => warn!(error = %e, operation = "vacuum", "vacuum failed"),
                }
                next_vacuum = schedule.next_delay().map(|d| Instant::now() + d);
            }
        }
    }
}

/// One retention pass. Returns the number of dumps discarded.
pub async fn run_one_tick(
    repo: &DumpRepo,
    cache: &ResultCache,
    config: &RetentionWorkerConfig,
) -> anyhow::Result<usize> {
    let cutoff = now_millis() - (config.retention_days as i64) * MS_PER_DAY;
    let pruned = repo.prune_older_than(cutoff).await?;
    for &id in &pruned {
        cache.invalidate(id).await;
    }
    if !pruned.is_empty() {
        info!(dumps_pruned = pruned.len(), operation = "prune", "old dumps discarded");
    }
    Ok(pruned.len())
}
