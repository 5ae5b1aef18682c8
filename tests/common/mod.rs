#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use listing_crawler::browser::{BrowserSession, Card};
use listing_crawler::config::{ScrapeConfig, ScrollConfig};
use listing_crawler::error::{ExtractionError, SessionError};
use listing_crawler::snapshot::SnapshotCard;

pub enum FakeCard {
    Listing(SnapshotCard),
    Detached,
}

impl Card for FakeCard {
    fn inner_text(&self) -> Result<String, ExtractionError> {
        match self {
            FakeCard::Listing(card) => card.inner_text(),
            FakeCard::Detached => Err(ExtractionError::Text("node is detached".to_string())),
        }
    }

    fn first_anchor_href(&self) -> Result<Option<String>, ExtractionError> {
        match self {
            FakeCard::Listing(card) => card.first_anchor_href(),
            FakeCard::Detached => Err(ExtractionError::Anchor("node is detached".to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FakeItem {
    Listing { text: String, href: Option<String> },
    Detached,
}

pub fn listing(title: &str, price: &str, href: &str) -> FakeItem {
    FakeItem::Listing {
        text: format!("{}\nEntire rental unit\n{}", title, price),
        href: Some(href.to_string()),
    }
}

/// Scripted in-memory page source. Page `n` shows `pages[n]`; the next-page
/// control exists on every page but the last unless `next_on_last_page`.
#[derive(Default)]
pub struct FakeSession {
    pub pages: Vec<Vec<FakeItem>>,
    pub current: usize,
    pub next_on_last_page: bool,
    pub scripted_click_fails: bool,
    pub forced_click_fails: bool,
    pub navigation_times_out: bool,
    /// Number of card queries that come back empty before the first page renders.
    pub blank_queries: usize,
    /// Card queries fail outright, as they do once the browser is gone.
    pub queries_fail: bool,
    pub closed: bool,
    pub card_queries: usize,
    pub ready_waits: usize,
}

impl FakeSession {
    pub fn with_pages(pages: Vec<Vec<FakeItem>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    fn has_next(&self) -> bool {
        self.current + 1 < self.pages.len() || self.next_on_last_page
    }

    fn turn(&mut self) -> Result<(), SessionError> {
        if self.current + 1 < self.pages.len() {
            self.current += 1;
        }
        Ok(())
    }
}

impl BrowserSession for FakeSession {
    type Card = FakeCard;
    type Control = ();

    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SessionError> {
        if self.navigation_times_out {
            return Err(SessionError::Timeout {
                url: url.to_string(),
                timeout,
            });
        }
        self.current = 0;
        Ok(())
    }

    fn wait_until_ready(&mut self) -> Result<(), SessionError> {
        self.ready_waits += 1;
        Ok(())
    }

    fn scroll_by(&mut self, _dy: i64) -> Result<(), SessionError> {
        Err(SessionError::Browser("already at bottom".to_string()))
    }

    fn query_cards(&mut self, _selector: &str) -> Result<Vec<FakeCard>, SessionError> {
        self.card_queries += 1;
        if self.queries_fail {
            return Err(SessionError::Browser("target closed".to_string()));
        }
        if self.blank_queries > 0 {
            self.blank_queries -= 1;
            return Ok(Vec::new());
        }
        let items = self.pages.get(self.current).cloned().unwrap_or_default();
        Ok(items
            .into_iter()
            .map(|item| match item {
                FakeItem::Listing { text, href } => FakeCard::Listing(SnapshotCard::new(text, href.as_deref())),
                FakeItem::Detached => FakeCard::Detached,
            })
            .collect())
    }

    fn find_control(&mut self, _selector: &str) -> Result<Option<()>, SessionError> {
        Ok(self.has_next().then_some(()))
    }

    fn scroll_into_view(&mut self, _control: &()) -> Result<(), SessionError> {
        Ok(())
    }

    fn activate_scripted(&mut self, _control: &()) -> Result<(), SessionError> {
        if self.scripted_click_fails {
            return Err(SessionError::Browser("synthetic click rejected".to_string()));
        }
        self.turn()
    }

    fn activate_forced(&mut self, _control: &()) -> Result<(), SessionError> {
        if self.forced_click_fails {
            return Err(SessionError::Browser("control is covered by an overlay".to_string()));
        }
        self.turn()
    }

    fn page_html(&mut self) -> Result<String, SessionError> {
        Ok("<html><body></body></html>".to_string())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Listing-site defaults with every wait at zero and debug dumps in `debug_dir`.
pub fn fast_config(target_count: usize, debug_dir: &Path) -> ScrapeConfig {
    ScrapeConfig {
        target_count,
        scroll: ScrollConfig {
            step_delay: Duration::ZERO,
            ..ScrollConfig::default()
        },
        settle_delay: Duration::ZERO,
        empty_retry_delay: Duration::ZERO,
        control_settle_delay: Duration::ZERO,
        page_delay_ms: 0..=0,
        debug_dir: debug_dir.to_path_buf(),
        ..ScrapeConfig::default()
    }
}
