use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use crate::browser::ChromeSession;
use crate::collector::{CollectionOutcome, Collector, StopReason};
use crate::config::Config;
use crate::pacing::RandomPacing;
use crate::snapshot::SnapshotSession;

/// Written next to the raw dataset so a later stage (or a human) can tell a
/// short dataset from a broken run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub target_url: String,
    pub target_count: usize,
    pub rows: usize,
    pub pages_visited: usize,
    pub stop_reason: StopReason,
}

/// Runs one collection with configuration from the environment and writes
/// the raw dataset.
pub async fn run() -> Result<CollectionOutcome> {
    let config = Config::from_env()?;
    run_with(&config).await
}

pub async fn run_with(config: &Config) -> Result<CollectionOutcome> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!("🕷️ Scrape run {} starting (target {} records)", run_id, config.scrape.target_count);

    let collector = Collector::new(config.scrape.clone(), RandomPacing)?;
    let outcome = match &config.scrape.replay_dir {
        Some(dir) => {
            let mut session = SnapshotSession::from_dir(dir)?;
            collector.collect_with(&mut session).await?
        }
        None => {
            let headless = config.scrape.headless;
            collector.run(|| ChromeSession::launch(headless)).await?
        }
    };

    outcome.dataset.write_csv(&config.paths.raw_csv)?;

    let summary = RunSummary {
        run_id,
        started_at,
        finished_at: Utc::now(),
        target_url: config.scrape.target_url.clone(),
        target_count: config.scrape.target_count,
        rows: outcome.dataset.len(),
        pages_visited: outcome.pages_visited,
        stop_reason: outcome.stop_reason,
    };
    write_summary(&summary, &config.paths.raw_csv.with_file_name("run_summary.json"))?;

    info!(
        "✅ Scrape run {} done: {} rows, {} pages, {:?}",
        run_id,
        summary.rows,
        summary.pages_visited,
        summary.stop_reason
    );
    Ok(outcome)
}

fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json).with_context(|| format!("writing run summary {}", path.display()))
}
