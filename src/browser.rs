use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::protocol::cdp::DOM::NodeId;
use headless_chrome::protocol::cdp::Page::AddScriptToEvaluateOnNewDocument;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use once_cell::sync::Lazy;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{ExtractionError, SessionError};

static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/123.0.0.0 Safari/537.36",
    ]
});

const FALLBACK_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// Runs before any page script so the listing site sees a regular browser.
const STEALTH_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'hardwareConcurrency', { get: () => 4 });
    const getParameter = WebGLRenderingContext.prototype.getParameter;
    WebGLRenderingContext.prototype.getParameter = function(parameter) {
        if (parameter === 37445) return 'Intel Inc.';
        if (parameter === 37446) return 'Intel Iris OpenGL Engine';
        return getParameter.apply(this, [parameter]);
    };
    window.chrome = { runtime: {}, loadTimes: function() {}, csi: function() {}, app: {} };
"#;

const FIRST_ANCHOR_HREF_JS: &str = "function() { const a = this.querySelector('a'); return a ? a.getAttribute('href') : null; }";
const SYNTHETIC_CLICK_JS: &str = "function() { this.click(); return true; }";

/// Read access to one rendered listing card.
pub trait Card {
    /// Visible text, one rendered line per `\n`.
    fn inner_text(&self) -> Result<String, ExtractionError>;
    /// `href` of the first anchor inside the card, `None` when there is no anchor.
    fn first_anchor_href(&self) -> Result<Option<String>, ExtractionError>;
}

/// The page automation surface the collector drives.
///
/// One session is one page in one browser; every call is serialized on the
/// caller's task.
pub trait BrowserSession {
    type Card: Card;
    type Control;

    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SessionError>;
    /// Blocks until the current document reports DOM-ready.
    fn wait_until_ready(&mut self) -> Result<(), SessionError>;
    fn scroll_by(&mut self, dy: i64) -> Result<(), SessionError>;
    fn query_cards(&mut self, selector: &str) -> Result<Vec<Self::Card>, SessionError>;
    fn find_control(&mut self, selector: &str) -> Result<Option<Self::Control>, SessionError>;
    fn scroll_into_view(&mut self, control: &Self::Control) -> Result<(), SessionError>;
    /// Dispatches a synthetic click event from page script.
    fn activate_scripted(&mut self, control: &Self::Control) -> Result<(), SessionError>;
    /// Clicks the control with real input events, regardless of overlays.
    fn activate_forced(&mut self, control: &Self::Control) -> Result<(), SessionError>;
    fn page_html(&mut self) -> Result<String, SessionError>;
    /// Releases the browser. Must be safe to call more than once.
    fn close(&mut self);
}

fn browser_err(e: impl std::fmt::Display) -> SessionError {
    SessionError::Browser(e.to_string())
}

/// True when a lookup failed only because the selector matched nothing.
fn is_no_match(e: &anyhow::Error) -> bool {
    e.is::<NoElementFound>()
}

/// A headless Chrome page, driven over CDP.
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

pub struct ChromeCard {
    tab: Arc<Tab>,
    node_id: NodeId,
}

pub struct ChromeControl {
    node_id: NodeId,
}

impl ChromeSession {
    pub fn launch(headless: bool) -> Result<Self, SessionError> {
        use rand::seq::SliceRandom;
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(FALLBACK_USER_AGENT);
        info!("🌐 Launching Chrome (headless: {}, UA: {})", headless, user_agent);

        let ua_arg = format!("--user-agent={}", user_agent);
        let args = vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-infobars"),
            OsStr::new("--start-maximized"),
            OsStr::new(&ua_arg),
        ];

        let browser = Browser::new(LaunchOptions {
            headless,
            window_size: Some((1920, 1080)),
            idle_browser_timeout: Duration::from_secs(180),
            args,
            ..Default::default()
        })
        .map_err(|e| SessionError::Launch(e.to_string()))?;

        let tab = browser.new_tab().map_err(|e| SessionError::Launch(e.to_string()))?;
        tab.enable_debugger().map_err(browser_err)?;
        tab.call_method(AddScriptToEvaluateOnNewDocument {
            source: STEALTH_SCRIPT.to_string(),
            world_name: None,
            include_command_line_api: None,
            run_immediately: None,
        })
        .map_err(browser_err)?;

        Ok(Self {
            browser: Some(browser),
            tab,
        })
    }

    fn element(&self, node_id: NodeId) -> Result<Element<'_>, SessionError> {
        Element::new(&self.tab, node_id).map_err(browser_err)
    }
}

impl Card for ChromeCard {
    fn inner_text(&self) -> Result<String, ExtractionError> {
        Element::new(&self.tab, self.node_id)
            .and_then(|el| el.get_inner_text())
            .map_err(|e| ExtractionError::Text(e.to_string()))
    }

    fn first_anchor_href(&self) -> Result<Option<String>, ExtractionError> {
        let element = Element::new(&self.tab, self.node_id).map_err(|e| ExtractionError::Anchor(e.to_string()))?;
        let result = element
            .call_js_fn(FIRST_ANCHOR_HREF_JS, vec![], false)
            .map_err(|e| ExtractionError::Anchor(e.to_string()))?;
        Ok(result.value.and_then(|v| v.as_str().map(str::to_string)))
    }
}

impl BrowserSession for ChromeSession {
    type Card = ChromeCard;
    type Control = ChromeControl;

    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SessionError> {
        let started = Instant::now();
        self.tab.set_default_timeout(timeout);
        let result = self
            .tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ());
        self.tab.set_default_timeout(Duration::from_secs(30));

        result.map_err(|e| {
            if started.elapsed() >= timeout {
                SessionError::Timeout {
                    url: url.to_string(),
                    timeout,
                }
            } else {
                browser_err(e)
            }
        })
    }

    fn wait_until_ready(&mut self) -> Result<(), SessionError> {
        self.tab.wait_until_navigated().map(|_| ()).map_err(browser_err)
    }

    fn scroll_by(&mut self, dy: i64) -> Result<(), SessionError> {
        self.tab
            .evaluate(&format!("window.scrollBy(0, {});", dy), false)
            .map(|_| ())
            .map_err(browser_err)
    }

    fn query_cards(&mut self, selector: &str) -> Result<Vec<ChromeCard>, SessionError> {
        // CDP reports an empty match set as `NoElementFound`.
        match self.tab.find_elements(selector) {
            Ok(elements) => Ok(elements
                .iter()
                .map(|el| ChromeCard {
                    tab: Arc::clone(&self.tab),
                    node_id: el.node_id,
                })
                .collect()),
            Err(e) if is_no_match(&e) => {
                debug!("card query for {} matched nothing", selector);
                Ok(Vec::new())
            }
            Err(e) => Err(browser_err(e)),
        }
    }

    fn find_control(&mut self, selector: &str) -> Result<Option<ChromeControl>, SessionError> {
        match self.tab.find_element(selector) {
            Ok(el) => Ok(Some(ChromeControl { node_id: el.node_id })),
            Err(e) if is_no_match(&e) => {
                debug!("control {} not found", selector);
                Ok(None)
            }
            Err(e) => Err(browser_err(e)),
        }
    }

    fn scroll_into_view(&mut self, control: &ChromeControl) -> Result<(), SessionError> {
        self.element(control.node_id)?
            .scroll_into_view()
            .map(|_| ())
            .map_err(browser_err)
    }

    fn activate_scripted(&mut self, control: &ChromeControl) -> Result<(), SessionError> {
        self.element(control.node_id)?
            .call_js_fn(SYNTHETIC_CLICK_JS, vec![], false)
            .map(|_| ())
            .map_err(browser_err)
    }

    fn activate_forced(&mut self, control: &ChromeControl) -> Result<(), SessionError> {
        self.element(control.node_id)?
            .click()
            .map(|_| ())
            .map_err(browser_err)
    }

    fn page_html(&mut self) -> Result<String, SessionError> {
        self.tab.get_content().map_err(browser_err)
    }

    fn close(&mut self) {
        if let Some(browser) = self.browser.take() {
            info!("🧹 Closing Chrome");
            drop(browser);
        }
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_empty_match_sets_count_as_no_match() {
        assert!(is_no_match(&anyhow::Error::from(NoElementFound {})));
        assert!(!is_no_match(&anyhow::anyhow!("Unable to make method calls because underlying connection is closed")));
        assert!(!is_no_match(&anyhow::Error::from(headless_chrome::browser::tab::ElementNotVisible {})));
    }
}
