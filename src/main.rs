use anyhow::Result;
use dumpscope::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(service = %version::user_agent(), "starting");

    let repo = Arc::new(
        dump_repo::DumpRepo::connect(
            &app_config.database.path,
            app_config.database.max_pool_size,
        )
        .await?,
    );
    repo.init().await?;
    let interrupted = repo.fail_interrupted().await?;
    if interrupted > 0 {
        tracing::warn!(
            dumps_count = interrupted,
            operation = "recover",
            "dumps left in flight by the previous run marked as error"
        );
    }

    let cache = Arc::new(cache::ResultCache::new(app_config.cache.capacity));
    let runner = Arc::new(worker::JobRunner::new(
        repo.clone(),
        cache.clone(),
        app_config.pipeline(),
        app_config.jobs.max_concurrent_jobs,
    ));

    let retention_handle = retention_worker::spawn(
        repo.clone(),
        cache.clone(),
        retention_worker::RetentionWorkerConfig::from(&app_config.database),
    );

    let app = routes::app(
        repo,
        cache.clone(),
        runner.clone(),
        app_config.decoder.max_input_bytes,
    );
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    retention_handle.abort();
    let (cache_hits, cache_misses) = cache.counters();
    tracing::info!(
        jobs_completed = runner.jobs_completed(),
        jobs_failed = runner.jobs_failed(),
        cache_hits,
        cache_misses,
        "shut down"
    );
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Received shutdown signal");
}
