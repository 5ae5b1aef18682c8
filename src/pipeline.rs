use anyhow::{anyhow, Result};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::{cleaner, loader, scrape};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub scraped: usize,
    pub cleaned: Option<usize>,
    pub loaded: Option<i64>,
}

/// scrape -> clean -> load. A failing stage stops the later ones.
pub async fn run_once(config: &Config) -> Result<PipelineReport> {
    info!("🚀 [Pipeline] Stage 1/3: scrape");
    let outcome = scrape::run_with(config).await?;

    info!("🚀 [Pipeline] Stage 2/3: clean");
    let cleaned = cleaner::run(&config.paths.raw_csv, &config.paths.cleaned_csv)?;

    info!("🚀 [Pipeline] Stage 3/3: load");
    let loaded = loader::run(&config.paths.cleaned_csv, &config.paths.database).await?;

    Ok(PipelineReport {
        scraped: outcome.dataset.len(),
        cleaned,
        loaded,
    })
}

/// Runs the pipeline, retrying a failed run `config.pipeline.retries` times.
pub async fn run_with_retries(config: &Config) -> Result<PipelineReport> {
    let attempts = config.pipeline.retries + 1;
    let mut last_error = String::from("pipeline never ran");

    for attempt in 1..=attempts {
        if attempt > 1 {
            info!(
                "🔄 [Pipeline] Retry {}/{} in {}s",
                attempt - 1,
                config.pipeline.retries,
                config.pipeline.retry_delay.as_secs()
            );
            sleep(config.pipeline.retry_delay).await;
        }

        match run_once(config).await {
            Ok(report) => {
                info!("✅ [Pipeline] Completed: {:?}", report);
                return Ok(report);
            }
            Err(e) => {
                warn!("❌ [Pipeline] Attempt {}/{} failed: {:#}", attempt, attempts, e);
                last_error = format!("{:#}", e);
            }
        }
    }

    error!("🔥 [Pipeline] Giving up after {} attempts", attempts);
    Err(anyhow!("pipeline failed after {} attempts. Last error: {}", attempts, last_error))
}
