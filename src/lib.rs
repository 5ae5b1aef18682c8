pub mod browser;
pub mod cleaner;
pub mod collector;
pub mod config;
pub mod db;
pub mod emitter;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod models;
pub mod pacing;
pub mod pagination;
pub mod pipeline;
pub mod scheduler;
pub mod scrape;
pub mod scroller;
pub mod snapshot;

pub use collector::{CollectionOutcome, Collector, StopReason};
pub use config::Config;
pub use emitter::Dataset;
pub use error::ScrapeError;
pub use models::CandidateRecord;
