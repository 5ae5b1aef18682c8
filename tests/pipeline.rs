mod common;

use std::fs;
use std::path::{Path, PathBuf};

use listing_crawler::config::{Config, DataPaths, PipelineConfig};
use listing_crawler::{db, pipeline, StopReason};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn replay_config(dir: &Path, target: usize) -> Config {
    let mut scrape = common::fast_config(target, &dir.join("debug"));
    scrape.replay_dir = Some(fixtures());
    Config {
        scrape,
        paths: DataPaths::in_dir(dir.join("data")),
        pipeline: PipelineConfig::default(),
    }
}

#[tokio::test]
async fn replayed_pages_produce_raw_dataset_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = replay_config(dir.path(), 108);

    let outcome = listing_crawler::scrape::run_with(&config).await.unwrap();

    assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    assert_eq!(outcome.pages_visited, 2);
    let raw = fs::read_to_string(&config.paths.raw_csv).unwrap();
    assert_eq!(
        raw,
        "title,price,link\n\
         Apartment in Almaty,₸ 25 000,https://www.airbnb.com/rooms/50011?adults=1&check_in=2024-03-01\n\
         Guesthouse in Almaty,No Price,https://www.airbnb.com/rooms/50012\n\
         Loft in Almaty,$48 night,https://www.airbnb.com/rooms/50013\n\
         Home in Almaty,€ 61 night,https://www.airbnb.com/rooms/50014\n"
    );

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("data").join("run_summary.json")).unwrap()).unwrap();
    assert_eq!(summary["rows"], 4);
    assert_eq!(summary["stop_reason"], "no_next_page");
}

#[tokio::test]
async fn full_pipeline_loads_priced_listings() {
    let dir = tempfile::tempdir().unwrap();
    let config = replay_config(dir.path(), 3);

    let report = pipeline::run_once(&config).await.unwrap();

    assert_eq!(report.scraped, 3);
    assert_eq!(report.cleaned, Some(2));
    assert_eq!(report.loaded, Some(2));

    let pool = db::connect(&config.paths.database).await.unwrap();
    let rows = db::fetch_listings(&pool).await.unwrap();
    pool.close().await;
    let cleaned: Vec<_> = rows.iter().map(|r| (r.title.clone().unwrap(), r.price_cleaned.unwrap())).collect();
    assert_eq!(
        cleaned,
        vec![
            ("Apartment in Almaty".to_string(), 25000),
            ("Loft in Almaty".to_string(), 48),
        ]
    );
}

#[tokio::test]
async fn failed_scrape_is_retried_then_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = replay_config(dir.path(), 3);
    config.scrape.replay_dir = Some(dir.path().join("does-not-exist"));
    config.pipeline.retries = 1;
    config.pipeline.retry_delay = std::time::Duration::ZERO;

    let err = pipeline::run_with_retries(&config).await.unwrap_err();
    assert!(err.to_string().contains("after 2 attempts"));
    assert!(!config.paths.raw_csv.exists());
}
