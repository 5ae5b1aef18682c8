use anyhow::bail;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use listing_crawler::{cleaner, loader, pipeline, scheduler, scrape, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let command = std::env::args().nth(1).unwrap_or_else(|| "pipeline".to_string());

    match command.as_str() {
        "scrape" => {
            scrape::run_with(&config).await?;
        }
        "clean" => {
            cleaner::run(&config.paths.raw_csv, &config.paths.cleaned_csv)?;
        }
        "load" => {
            loader::run(&config.paths.cleaned_csv, &config.paths.database).await?;
        }
        "pipeline" => {
            pipeline::run_with_retries(&config).await?;
        }
        "schedule" => {
            scheduler::run_forever(&config).await?;
        }
        other => bail!(
            "unknown command {:?}; expected one of: scrape, clean, load, pipeline, schedule",
            other
        ),
    }

    Ok(())
}
