use anyhow::Result;
use tokio::sync::mpsc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::pipeline;

/// Starts the cron jobs. Each pipeline tick is sent over `trigger`; the
/// receiver runs it, so runs never overlap and the browser stays on one task.
pub async fn start_scheduler(cron: &str, trigger: mpsc::Sender<()>) -> Result<JobScheduler> {
    let sched = JobScheduler::new().await?;

    sched
        .add(Job::new_async("0 */5 * * * *", |_uuid, _l| {
            Box::pin(async move {
                info!("⏰ [Scheduler] Heartbeat: pipeline scheduler active.");
            })
        })?)
        .await?;

    sched
        .add(Job::new_async(cron, move |_uuid, _l| {
            let trigger = trigger.clone();
            Box::pin(async move {
                info!("⏰ [Scheduler] Triggering scheduled pipeline run...");
                match trigger.try_send(()) {
                    Ok(()) => info!("✅ [Scheduler] Pipeline run queued."),
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("⚠️ [Scheduler] A run is already pending, skipping this tick.")
                    }
                    Err(e) => error!("❌ [Scheduler] Failed to queue pipeline run: {}", e),
                }
            })
        })?)
        .await?;

    sched.start().await?;
    info!("✅ Pipeline scheduler started ({})", cron);
    Ok(sched)
}

/// Runs the pipeline on every scheduler tick until Ctrl-C.
pub async fn run_forever(config: &Config) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(1);
    let mut sched = start_scheduler(&config.pipeline.cron, tx).await?;

    loop {
        tokio::select! {
            tick = rx.recv() => {
                if tick.is_none() {
                    break;
                }
                if let Err(e) = pipeline::run_with_retries(config).await {
                    error!("🔥 [Scheduler] Scheduled run failed: {:#}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down scheduler");
                break;
            }
        }
    }

    sched.shutdown().await?;
    Ok(())
}
