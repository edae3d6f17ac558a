// Job runner and retention worker: jobs reach a terminal state, results land in the cache

mod common;

use common::*;
use dumpscope::cache::ResultCache;
use dumpscope::dump_repo::DeleteOutcome;
use dumpscope::models::{DumpFormat, DumpStatus};
use dumpscope::pipeline::PipelineConfig;
use dumpscope::retention_worker::{RetentionWorkerConfig, run_one_tick};
use dumpscope::worker::{JobOutcome, JobRunner};
use std::sync::Arc;

fn runner(repo: Arc<dumpscope::dump_repo::DumpRepo>, cache: Arc<ResultCache>, max: usize) -> JobRunner {
    JobRunner::new(repo, cache, PipelineConfig::default(), max)
}

#[tokio::test]
async fn valid_dump_completes_and_is_cached() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let cache = Arc::new(ResultCache::new(4));
    let runner = runner(repo.clone(), cache.clone(), 2);

    let bytes = mp_dump(20);
    let dump = repo
        .create_dump("run.bin", Some(DumpFormat::Mp), bytes.len() as u64)
        .await
        .unwrap();
    let outcome = runner.submit(&dump, bytes.into()).await.unwrap();
    assert_eq!(outcome, JobOutcome::Completed);

    let stored = repo.get_dump(dump.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DumpStatus::Completed);
    assert_eq!(stored.detected_format, Some(DumpFormat::Mp));

    let cached = cache.get(dump.id).await.unwrap();
    assert_eq!(cached.records.len(), 20);
    assert_eq!(runner.jobs_completed(), 1);
    assert_eq!(runner.jobs_failed(), 0);
}

#[tokio::test]
async fn invalid_dump_fails_with_message() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let cache = Arc::new(ResultCache::new(4));
    let runner = runner(repo.clone(), cache.clone(), 2);

    let dump = repo.create_dump("junk.bin", None, 5).await.unwrap();
    let outcome = runner
        .submit(&dump, bytes::Bytes::from_static(&[1, 2, 3, 4, 5]))
        .await
        .unwrap();
    let JobOutcome::Failed(message) = outcome else {
        panic!("expected failure, got {:?}", outcome);
    };

    let stored = repo.get_dump(dump.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DumpStatus::Error);
    assert_eq!(stored.error.as_deref(), Some(message.as_str()));
    assert!(cache.get(dump.id).await.is_none());
    assert_eq!(runner.jobs_failed(), 1);
}

#[tokio::test]
async fn declared_format_mismatch_fails() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let runner = runner(repo.clone(), Arc::new(ResultCache::new(4)), 1);

    let bytes = mp_dump(4);
    let dump = repo
        .create_dump("gauge.bin", Some(DumpFormat::Mdg), bytes.len() as u64)
        .await
        .unwrap();
    let outcome = runner.submit(&dump, bytes.into()).await.unwrap();
    assert!(matches!(outcome, JobOutcome::Failed(_)));
    assert_eq!(
        repo.get_dump(dump.id).await.unwrap().unwrap().status,
        DumpStatus::Error
    );
}

#[tokio::test]
async fn queued_jobs_all_finish_with_one_permit() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let runner = runner(repo.clone(), Arc::new(ResultCache::new(8)), 1);

    let mut handles = Vec::new();
    for n in 1..=4 {
        let bytes = mp_dump(n * 5);
        let dump = repo
            .create_dump(&format!("{}.bin", n), None, bytes.len() as u64)
            .await
            .unwrap();
        handles.push((dump.id, runner.submit(&dump, bytes.into())));
    }
    for (id, handle) in handles {
        assert_eq!(handle.await.unwrap(), JobOutcome::Completed);
        assert_eq!(
            repo.get_dump(id).await.unwrap().unwrap().status,
            DumpStatus::Completed
        );
    }
    assert_eq!(runner.jobs_completed(), 4);
}

#[tokio::test]
async fn job_skips_dump_that_is_no_longer_pending() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let runner = runner(repo.clone(), Arc::new(ResultCache::new(4)), 1);

    let bytes = mp_dump(3);
    let dump = repo.create_dump("a.bin", None, bytes.len() as u64).await.unwrap();
    repo.fail_interrupted().await.unwrap();

    let outcome = runner.submit(&dump, bytes.into()).await.unwrap();
    assert_eq!(outcome, JobOutcome::Skipped);
    assert_eq!(
        repo.get_dump(dump.id).await.unwrap().unwrap().status,
        DumpStatus::Error
    );
}

#[tokio::test]
async fn retention_tick_prunes_and_evicts() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let cache = Arc::new(ResultCache::new(4));
    let runner = runner(repo.clone(), cache.clone(), 1);

    let bytes = mp_dump(5);
    let done = repo.create_dump("old.bin", None, bytes.len() as u64).await.unwrap();
    runner.submit(&done, bytes.into()).await.unwrap();
    assert!(cache.get(done.id).await.is_some());

    let keep_all = RetentionWorkerConfig {
        retention_days: 30,
        retention_interval_secs: 3600,
        vacuum_schedule: None,
        vacuum_interval_secs: 3600,
    };
    assert_eq!(run_one_tick(&repo, &cache, &keep_all).await.unwrap(), 0);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let pending = repo.create_dump("new.bin", None, 1).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let drop_all = RetentionWorkerConfig {
        retention_days: 0,
        ..keep_all
    };
    assert_eq!(run_one_tick(&repo, &cache, &drop_all).await.unwrap(), 1);
    assert!(repo.get_dump(done.id).await.unwrap().is_none());
    assert!(cache.get(done.id).await.is_none());
    // in-flight dumps are never pruned
    assert!(repo.get_dump(pending.id).await.unwrap().is_some());
}

#[tokio::test]
async fn delete_between_load_and_fill_leaves_cache_empty() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let cache = Arc::new(ResultCache::new(4));
    let runner = runner(repo.clone(), cache.clone(), 1);

    let bytes = mp_dump(5);
    let dump = repo.create_dump("gone.bin", None, bytes.len() as u64).await.unwrap();
    runner.submit(&dump, bytes.into()).await.unwrap();
    cache.invalidate(dump.id).await;

    // a reader misses, snapshots the generation and reads the store
    assert!(cache.get(dump.id).await.is_none());
    let generation = cache.generation().await;
    let loaded = repo.load_outputs(dump.id).await.unwrap().unwrap();

    // the delete commits and invalidates before the reader fills
    assert_eq!(repo.delete_dump(dump.id).await.unwrap(), DeleteOutcome::Deleted);
    cache.invalidate(dump.id).await;

    assert!(!cache.insert_if_current(dump.id, Arc::new(loaded), generation).await);
    assert!(cache.get(dump.id).await.is_none());
    assert!(cache.get_or_load(&repo, dump.id).await.unwrap().is_none());
}

#[tokio::test]
async fn read_through_fills_cache_when_nothing_intervenes() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let cache = Arc::new(ResultCache::new(4));
    let runner = runner(repo.clone(), Arc::new(ResultCache::new(0)), 1);

    let bytes = mp_dump(5);
    let dump = repo.create_dump("kept.bin", None, bytes.len() as u64).await.unwrap();
    runner.submit(&dump, bytes.into()).await.unwrap();
    assert!(cache.is_empty().await);

    let loaded = cache.get_or_load(&repo, dump.id).await.unwrap().unwrap();
    assert_eq!(loaded.records.len(), 5);
    assert_eq!(cache.len().await, 1);
    assert_eq!(cache.counters(), (0, 1));
}
