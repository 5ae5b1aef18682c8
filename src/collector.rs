use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::browser::BrowserSession;
use crate::config::ScrapeConfig;
use crate::emitter::Dataset;
use crate::error::{ScrapeError, SessionError};
use crate::extractor::Extractor;
use crate::models::CandidateRecord;
use crate::pacing::Pacing;
use crate::pagination::{self, PageTurn};
use crate::scroller;

/// Outcome of merging one record into the [`Accumulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Added,
    Duplicate,
    /// The record had no link; it is kept as its own entry and never
    /// deduplicated.
    Unkeyed,
}

/// Insertion-ordered records, at most one per non-empty link. The first
/// record seen for a link is kept. Link-less records are appended as they
/// come.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    records: Vec<CandidateRecord>,
    seen: HashSet<String>,
    unkeyed: usize,
}

impl Accumulator {
    pub fn merge(&mut self, record: CandidateRecord) -> Merge {
        if record.link.is_empty() {
            self.unkeyed += 1;
            self.records.push(record);
            return Merge::Unkeyed;
        }
        if !self.seen.insert(record.link.clone()) {
            return Merge::Duplicate;
        }
        self.records.push(record);
        Merge::Added
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    /// Records kept without a link.
    pub fn unkeyed(&self) -> usize {
        self.unkeyed
    }

    pub fn into_records(self) -> Vec<CandidateRecord> {
        self.records
    }
}

#[derive(Debug)]
pub struct CollectionState {
    pub accumulator: Accumulator,
    pub page_number: usize,
    pub target_count: usize,
}

impl CollectionState {
    fn new(target_count: usize) -> Self {
        Self {
            accumulator: Accumulator::default(),
            page_number: 1,
            target_count,
        }
    }

    fn target_reached(&self) -> bool {
        self.accumulator.len() >= self.target_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TargetReached,
    /// No cards rendered, even after the retry.
    Exhausted,
    NoNextPage,
    /// The next-page control could not be activated.
    Stalled,
    PageLimit,
    /// The browser stopped answering card queries.
    SessionLost,
}

#[derive(Debug)]
pub struct CollectionOutcome {
    pub dataset: Dataset,
    pub stop_reason: StopReason,
    pub pages_visited: usize,
    /// Accumulator size after each page, in page order.
    pub progress: Vec<usize>,
}

/// Drives one collection run: scroll, read cards, merge, turn the page,
/// until the target is met or the listing runs out.
pub struct Collector<P: Pacing> {
    config: ScrapeConfig,
    extractor: Extractor,
    pacing: P,
}

impl<P: Pacing> Collector<P> {
    pub fn new(config: ScrapeConfig, pacing: P) -> Result<Self, ScrapeError> {
        let extractor = Extractor::new(&config.base_origin, &config.currency_glyphs)?;
        Ok(Self {
            config,
            extractor,
            pacing,
        })
    }

    /// Acquires a session with `open`, collects, and releases it.
    pub async fn run<S, F>(&self, open: F) -> Result<CollectionOutcome, ScrapeError>
    where
        S: BrowserSession,
        F: FnOnce() -> Result<S, SessionError>,
    {
        let mut session = open()?;
        self.collect_with(&mut session).await
    }

    /// Collects from an already acquired session. The session is closed on
    /// every return path.
    pub async fn collect_with<S: BrowserSession>(&self, session: &mut S) -> Result<CollectionOutcome, ScrapeError> {
        let result = self.collect(session).await;
        session.close();
        result
    }

    async fn collect<S: BrowserSession>(&self, session: &mut S) -> Result<CollectionOutcome, ScrapeError> {
        let cfg = &self.config;

        info!("🚀 Navigating to {}", cfg.target_url);
        session.navigate(&cfg.target_url, cfg.nav_timeout).map_err(|e| match e {
            SessionError::Timeout { url, timeout } => ScrapeError::FatalTimeout { url, timeout },
            other => ScrapeError::Session(other),
        })?;
        self.pause(cfg.settle_delay).await;

        let mut state = CollectionState::new(cfg.target_count);
        let mut progress = Vec::new();

        let stop_reason = loop {
            if state.target_reached() {
                break StopReason::TargetReached;
            }
            info!("📄 Page #{}", state.page_number);

            scroller::scroll_page(session, &cfg.scroll, &self.pacing).await;

            let cards = match self.query_cards(session, state.page_number).await {
                Ok(cards) => cards,
                Err(e) => {
                    error!("❌ Card query failed on page {}: {}", state.page_number, e);
                    break StopReason::SessionLost;
                }
            };
            if cards.is_empty() {
                break StopReason::Exhausted;
            }

            for card in &cards {
                match self.extractor.extract(card) {
                    Ok(record) => {
                        if state.accumulator.merge(record) == Merge::Unkeyed {
                            debug!("card without link kept unkeyed");
                        }
                    }
                    Err(e) => debug!("skipping card: {}", e),
                }
            }
            progress.push(state.accumulator.len());
            info!(
                "Cards: {}, collected {} / {}",
                cards.len(),
                state.accumulator.len(),
                state.target_count
            );

            if state.target_reached() {
                break StopReason::TargetReached;
            }
            if state.page_number >= cfg.max_pages {
                warn!("⚠️ Page limit {} reached before target", cfg.max_pages);
                break StopReason::PageLimit;
            }

            match pagination::advance(session, &cfg.next_selector, cfg.control_settle_delay, &self.pacing).await {
                Ok(PageTurn::Advanced(how)) => {
                    debug!("next page via {:?} activation", how);
                    state.page_number += 1;
                    sleep(self.pacing.page_turn(&cfg.page_delay_ms)).await;
                    if let Err(e) = session.wait_until_ready() {
                        warn!("⚠️ DOM-ready wait failed on page {}: {}", state.page_number, e);
                    }
                }
                Ok(PageTurn::NoNextPage) => {
                    info!("Next-page control not found, pagination finished");
                    break StopReason::NoNextPage;
                }
                Err(e) => {
                    warn!("⚠️ Pagination stalled: {}", e);
                    break StopReason::Stalled;
                }
            }
        };

        if state.accumulator.unkeyed() > 0 {
            info!("{} collected cards have no link", state.accumulator.unkeyed());
        }
        info!("🏁 Collection finished ({:?}) with {} records", stop_reason, state.accumulator.len());

        Ok(CollectionOutcome {
            dataset: Dataset::emit(state.accumulator, state.target_count),
            stop_reason,
            pages_visited: state.page_number,
            progress,
        })
    }

    /// Queries cards, retrying once after a delay when none are rendered or
    /// the first query fails. A failing retry is returned as the error.
    async fn query_cards<S: BrowserSession>(
        &self,
        session: &mut S,
        page_number: usize,
    ) -> Result<Vec<S::Card>, SessionError> {
        let selector = &self.config.card_selector;
        match session.query_cards(selector) {
            Ok(cards) if !cards.is_empty() => return Ok(cards),
            Ok(_) => warn!("⚠️ No cards on page {}, waiting for render", page_number),
            Err(e) => warn!("⚠️ Card query failed on page {} ({}), retrying", page_number, e),
        }

        self.pause(self.config.empty_retry_delay).await;
        let cards = session.query_cards(selector)?;
        if cards.is_empty() {
            warn!("⚠️ Still no cards on page {}, treating listing as exhausted", page_number);
            self.dump_page(session, page_number);
        }
        Ok(cards)
    }

    fn dump_page<S: BrowserSession>(&self, session: &mut S, page_number: usize) {
        let html = match session.page_html() {
            Ok(html) => html,
            Err(e) => {
                debug!("could not read page html for debug dump: {}", e);
                return;
            }
        };
        let path = self.config.debug_dir.join(format!("empty_page_{}.html", page_number));
        let written = fs::create_dir_all(&self.config.debug_dir).and_then(|_| fs::write(&path, html));
        match written {
            Ok(()) => debug!("page html saved to {}", path.display()),
            Err(e) => debug!("debug dump to {} failed: {}", path.display(), e),
        }
    }

    async fn pause(&self, nominal: Duration) {
        sleep(self.pacing.fixed(nominal)).await;
    }
}
