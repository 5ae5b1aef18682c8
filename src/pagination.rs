use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::browser::BrowserSession;
use crate::error::NavigationError;
use crate::pacing::Pacing;

/// Which activation path turned the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Scripted,
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTurn {
    Advanced(Activation),
    /// The next-page control is not on the page: there are no further pages.
    NoNextPage,
}

/// Finds the next-page control and activates it, trying a synthetic click
/// first and a forced click second.
///
/// The caller owns the post-activation wait (pacing delay, DOM-ready).
pub async fn advance<S, P>(
    session: &mut S,
    selector: &str,
    settle: Duration,
    pacing: &P,
) -> Result<PageTurn, NavigationError>
where
    S: BrowserSession,
    P: Pacing,
{
    let control = match session.find_control(selector) {
        Ok(Some(control)) => control,
        Ok(None) => return Ok(PageTurn::NoNextPage),
        Err(e) => {
            warn!("⚠️ Looking up next-page control failed, treating as last page: {}", e);
            return Ok(PageTurn::NoNextPage);
        }
    };

    if let Err(e) = session.scroll_into_view(&control) {
        debug!("next-page control could not be scrolled into view: {}", e);
    }
    sleep(pacing.fixed(settle)).await;

    let scripted = match session.activate_scripted(&control) {
        Ok(()) => return Ok(PageTurn::Advanced(Activation::Scripted)),
        Err(e) => e,
    };
    debug!("scripted click failed ({}), forcing click", scripted);

    match session.activate_forced(&control) {
        Ok(()) => Ok(PageTurn::Advanced(Activation::Forced)),
        Err(forced) => Err(NavigationError {
            scripted: scripted.to_string(),
            forced: forced.to_string(),
        }),
    }
}
