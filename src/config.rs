use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use std::env;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_TARGET_URL: &str = "https://www.airbnb.com/s/Almaty--Kazakhstan/homes";
pub const DEFAULT_BASE_ORIGIN: &str = "https://www.airbnb.com";
pub const DEFAULT_CARD_SELECTOR: &str = r#"[data-testid="card-container"]"#;
pub const DEFAULT_NEXT_SELECTOR: &str = r#"a[aria-label="Next"]"#;
pub const DEFAULT_TARGET_COUNT: usize = 108;

/// Everything the collection run needs. Selectors and the target are inputs,
/// not constants, so a different listing site only needs a different `.env`.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub target_url: String,
    /// Origin that relative card hrefs are resolved against.
    pub base_origin: String,
    pub card_selector: String,
    pub next_selector: String,
    pub target_count: usize,
    pub max_pages: usize,
    pub currency_glyphs: Vec<char>,
    pub scroll: ScrollConfig,
    pub nav_timeout: Duration,
    pub settle_delay: Duration,
    pub empty_retry_delay: Duration,
    pub control_settle_delay: Duration,
    /// Randomized pause after each page turn, in milliseconds.
    pub page_delay_ms: RangeInclusive<u64>,
    pub headless: bool,
    pub debug_dir: PathBuf,
    /// Replay saved HTML pages from this directory instead of launching Chrome.
    pub replay_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ScrollConfig {
    pub steps: u32,
    pub step_px: i64,
    pub back_px: i64,
    pub step_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct DataPaths {
    pub raw_csv: PathBuf,
    pub cleaned_csv: PathBuf,
    pub database: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub cron: String,
    pub retries: u32,
    pub retry_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub scrape: ScrapeConfig,
    pub paths: DataPaths,
    pub pipeline: PipelineConfig,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            steps: 4,
            step_px: 2000,
            back_px: 2000,
            step_delay: Duration::from_secs(1),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            base_origin: DEFAULT_BASE_ORIGIN.to_string(),
            card_selector: DEFAULT_CARD_SELECTOR.to_string(),
            next_selector: DEFAULT_NEXT_SELECTOR.to_string(),
            target_count: DEFAULT_TARGET_COUNT,
            max_pages: 50,
            currency_glyphs: vec!['$', '₸', '€'],
            scroll: ScrollConfig::default(),
            nav_timeout: Duration::from_secs(90),
            settle_delay: Duration::from_secs(5),
            empty_retry_delay: Duration::from_secs(5),
            control_settle_delay: Duration::from_secs(1),
            page_delay_ms: 6_000..=10_000,
            headless: true,
            debug_dir: PathBuf::from("debug"),
            replay_dir: None,
        }
    }
}

impl DataPaths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            raw_csv: dir.join("raw_data.csv"),
            cleaned_csv: dir.join("cleaned_data.csv"),
            database: dir.join("output.db"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cron: "0 0 0 * * *".to_string(),
            retries: 1,
            retry_delay: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let defaults = ScrapeConfig::default();
        let base_origin = env_or("BASE_ORIGIN", DEFAULT_BASE_ORIGIN);
        Url::parse(&base_origin)
            .with_context(|| format!("BASE_ORIGIN is not a valid URL: {}", base_origin))?;

        let glyphs: Vec<char> = env_or("CURRENCY_GLYPHS", "$₸€").chars().filter(|c| !c.is_whitespace()).collect();
        if glyphs.is_empty() {
            return Err(anyhow!("CURRENCY_GLYPHS must name at least one glyph"));
        }

        let min_delay: u64 = env_parse("PAGE_DELAY_MIN_SECS", 6)?;
        let max_delay: u64 = env_parse("PAGE_DELAY_MAX_SECS", 10)?;
        if max_delay < min_delay {
            return Err(anyhow!(
                "PAGE_DELAY_MAX_SECS ({}) is below PAGE_DELAY_MIN_SECS ({})",
                max_delay,
                min_delay
            ));
        }

        let scrape = ScrapeConfig {
            target_url: env_or("TARGET_URL", DEFAULT_TARGET_URL),
            base_origin,
            card_selector: env_or("CARD_SELECTOR", DEFAULT_CARD_SELECTOR),
            next_selector: env_or("NEXT_SELECTOR", DEFAULT_NEXT_SELECTOR),
            target_count: env_parse("TARGET_COUNT", DEFAULT_TARGET_COUNT)?,
            max_pages: env_parse("MAX_PAGES", defaults.max_pages)?,
            currency_glyphs: glyphs,
            scroll: ScrollConfig {
                steps: env_parse("SCROLL_STEPS", 4)?,
                step_px: env_parse("SCROLL_STEP_PX", 2000)?,
                back_px: env_parse("SCROLL_BACK_PX", 2000)?,
                step_delay: Duration::from_millis(env_parse("SCROLL_DELAY_MS", 1000)?),
            },
            nav_timeout: Duration::from_secs(env_parse("NAV_TIMEOUT_SECS", 90)?),
            settle_delay: Duration::from_secs(env_parse("SETTLE_SECS", 5)?),
            empty_retry_delay: Duration::from_secs(env_parse("EMPTY_RETRY_SECS", 5)?),
            control_settle_delay: Duration::from_millis(env_parse("CONTROL_SETTLE_MS", 1000)?),
            page_delay_ms: (min_delay * 1000)..=(max_delay * 1000),
            headless: env_parse("HEADLESS", true)?,
            debug_dir: PathBuf::from(env_or("DEBUG_DIR", "debug")),
            replay_dir: env::var("REPLAY_DIR").ok().filter(|d| !d.trim().is_empty()).map(PathBuf::from),
        };

        let pipeline = PipelineConfig {
            cron: env_or("PIPELINE_CRON", "0 0 0 * * *"),
            retries: env_parse("PIPELINE_RETRIES", 1)?,
            retry_delay: Duration::from_secs(env_parse("PIPELINE_RETRY_DELAY_SECS", 60)?),
        };

        Ok(Self {
            scrape,
            paths: DataPaths::in_dir(env_or("DATA_DIR", "data")),
            pipeline,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid value for {}: {:?} ({})", key, raw, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_listing_site() {
        let cfg = ScrapeConfig::default();
        assert_eq!(cfg.target_count, 108);
        assert_eq!(cfg.scroll.steps, 4);
        assert_eq!(cfg.nav_timeout, Duration::from_secs(90));
        assert_eq!(cfg.page_delay_ms, 6_000..=10_000);
        assert!(cfg.currency_glyphs.contains(&'₸'));
    }

    #[test]
    fn data_paths_share_one_directory() {
        let paths = DataPaths::in_dir("out");
        assert_eq!(paths.raw_csv, PathBuf::from("out/raw_data.csv"));
        assert_eq!(paths.cleaned_csv, PathBuf::from("out/cleaned_data.csv"));
        assert_eq!(paths.database, PathBuf::from("out/output.db"));
    }

    #[test]
    fn env_parse_rejects_garbage() {
        env::set_var("LISTING_CRAWLER_TEST_NUMBER", "twelve");
        let parsed: Result<u32> = env_parse("LISTING_CRAWLER_TEST_NUMBER", 3);
        assert!(parsed.is_err());
        env::remove_var("LISTING_CRAWLER_TEST_NUMBER");
        let parsed: u32 = env_parse("LISTING_CRAWLER_TEST_NUMBER", 3).unwrap();
        assert_eq!(parsed, 3);
    }
}
