//! Replays saved HTML pages through the [`BrowserSession`] interface.
//!
//! Each page is a full document as dumped from the live site. Activating the
//! next-page control moves to the following snapshot; activating it on the
//! last snapshot fails, which the collector reads as a stalled pagination.

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::browser::{BrowserSession, Card};
use crate::error::{ExtractionError, SessionError};

#[derive(Debug, Clone)]
pub struct SnapshotCard {
    text: String,
    href: Option<String>,
}

impl SnapshotCard {
    pub fn new(text: impl Into<String>, href: Option<&str>) -> Self {
        Self {
            text: text.into(),
            href: href.map(str::to_string),
        }
    }
}

impl Card for SnapshotCard {
    fn inner_text(&self) -> Result<String, ExtractionError> {
        Ok(self.text.clone())
    }

    fn first_anchor_href(&self) -> Result<Option<String>, ExtractionError> {
        Ok(self.href.clone())
    }
}

pub struct SnapshotControl;

pub struct SnapshotSession {
    pages: Vec<String>,
    current: usize,
    navigated: bool,
    closed: bool,
    scrolls: usize,
}

impl SnapshotSession {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            current: 0,
            navigated: false,
            closed: false,
            scrolls: 0,
        }
    }

    /// Loads every `*.html` file in `dir`, in file-name order.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut files: Vec<_> = std::fs::read_dir(dir)
            .with_context(|| format!("reading replay directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "html"))
            .collect();
        files.sort();

        let pages = files
            .iter()
            .map(|p| std::fs::read_to_string(p).with_context(|| format!("reading snapshot {}", p.display())))
            .collect::<Result<Vec<_>>>()?;
        info!("📼 Replaying {} saved pages from {}", pages.len(), dir.display());
        Ok(Self::new(pages))
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls
    }

    fn document(&self) -> Result<Html, SessionError> {
        if self.closed {
            return Err(SessionError::Browser("session already closed".to_string()));
        }
        if !self.navigated {
            return Err(SessionError::Browser("no page loaded".to_string()));
        }
        let html = self.pages.get(self.current).map(String::as_str).unwrap_or_default();
        Ok(Html::parse_document(html))
    }

    fn advance(&mut self) -> Result<(), SessionError> {
        if self.current + 1 >= self.pages.len() {
            return Err(SessionError::Browser(format!("no page after snapshot {}", self.current + 1)));
        }
        self.current += 1;
        Ok(())
    }
}

fn parse_selector(selector: &str) -> Result<Selector, SessionError> {
    Selector::parse(selector).map_err(|e| SessionError::Browser(format!("bad selector {:?}: {}", selector, e)))
}

/// Approximates `innerText`: one line per non-blank text node.
fn rendered_lines(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

impl BrowserSession for SnapshotSession {
    type Card = SnapshotCard;
    type Control = SnapshotControl;

    fn navigate(&mut self, _url: &str, _timeout: Duration) -> Result<(), SessionError> {
        if self.pages.is_empty() {
            return Err(SessionError::Browser("no snapshots to replay".to_string()));
        }
        self.current = 0;
        self.navigated = true;
        Ok(())
    }

    fn wait_until_ready(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    fn scroll_by(&mut self, _dy: i64) -> Result<(), SessionError> {
        self.scrolls += 1;
        Ok(())
    }

    fn query_cards(&mut self, selector: &str) -> Result<Vec<SnapshotCard>, SessionError> {
        let document = self.document()?;
        let cards = parse_selector(selector)?;
        let anchor = parse_selector("a")?;

        Ok(document
            .select(&cards)
            .map(|card| SnapshotCard {
                text: rendered_lines(card),
                href: card
                    .select(&anchor)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string),
            })
            .collect())
    }

    fn find_control(&mut self, selector: &str) -> Result<Option<SnapshotControl>, SessionError> {
        let document = self.document()?;
        let control = parse_selector(selector)?;
        let found = document.select(&control).next().is_some();
        Ok(found.then_some(SnapshotControl))
    }

    fn scroll_into_view(&mut self, _control: &SnapshotControl) -> Result<(), SessionError> {
        Ok(())
    }

    fn activate_scripted(&mut self, _control: &SnapshotControl) -> Result<(), SessionError> {
        self.advance()
    }

    fn activate_forced(&mut self, _control: &SnapshotControl) -> Result<(), SessionError> {
        self.advance()
    }

    fn page_html(&mut self) -> Result<String, SessionError> {
        Ok(self.pages.get(self.current).cloned().unwrap_or_default())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div data-testid="card-container">
            <a href="/rooms/1"><span>Loft near Arbat</span></a>
            <div><span>Entire flat</span><span>₸ 25 000 night</span></div>
          </div>
          <div data-testid="card-container"><span>Nameless</span></div>
          <a aria-label="Next" href="?page=2">Next</a>
        </body></html>
    "#;

    #[test]
    fn cards_carry_lines_and_first_href() {
        let mut session = SnapshotSession::new(vec![PAGE.to_string()]);
        session.navigate("https://example.test", Duration::from_secs(1)).unwrap();

        let cards = session.query_cards(r#"[data-testid="card-container"]"#).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].inner_text().unwrap(), "Loft near Arbat\nEntire flat\n₸ 25 000 night");
        assert_eq!(cards[0].first_anchor_href().unwrap().as_deref(), Some("/rooms/1"));
        assert_eq!(cards[1].first_anchor_href().unwrap(), None);
    }

    #[test]
    fn last_snapshot_cannot_advance() {
        let mut session = SnapshotSession::new(vec![PAGE.to_string()]);
        session.navigate("https://example.test", Duration::from_secs(1)).unwrap();

        let control = session.find_control(r#"a[aria-label="Next"]"#).unwrap();
        assert!(control.is_some());
        assert!(session.activate_scripted(&SnapshotControl).is_err());
        assert!(session.find_control("button.missing").unwrap().is_none());
    }

    #[test]
    fn queries_fail_before_navigation() {
        let mut session = SnapshotSession::new(vec![PAGE.to_string()]);
        assert!(session.query_cards("div").is_err());
    }
}
