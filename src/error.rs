use std::time::Duration;
use thiserror::Error;

/// Failures reported by a browser session implementation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("navigation to {url} timed out after {}s", timeout.as_secs())]
    Timeout { url: String, timeout: Duration },
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("browser error: {0}")]
    Browser(String),
}

/// A single card could not be turned into a record. The card is skipped.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("card text unavailable: {0}")]
    Text(String),
    #[error("card anchor unavailable: {0}")]
    Anchor(String),
    #[error("cannot resolve href {href:?}: {reason}")]
    BadHref { href: String, reason: String },
}

/// The next-page control was found but no activation strategy worked.
#[derive(Debug, Error)]
#[error("next-page control could not be activated (scripted: {scripted}; forced: {forced})")]
pub struct NavigationError {
    pub scripted: String,
    pub forced: String,
}

/// Errors that abort a collection run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("fatal: initial navigation to {url} exceeded {}s", timeout.as_secs())]
    FatalTimeout { url: String, timeout: Duration },
    #[error("browser session failed: {0}")]
    Session(#[from] SessionError),
    #[error("invalid scrape configuration: {0}")]
    Config(String),
    #[error("writing dataset failed: {0}")]
    Output(String),
}

impl From<csv::Error> for ScrapeError {
    fn from(err: csv::Error) -> Self {
        ScrapeError::Output(err.to_string())
    }
}

impl From<std::io::Error> for ScrapeError {
    fn from(err: std::io::Error) -> Self {
        ScrapeError::Output(err.to_string())
    }
}
