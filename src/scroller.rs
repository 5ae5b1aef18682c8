use tokio::time::sleep;
use tracing::debug;

use crate::browser::BrowserSession;
use crate::config::ScrollConfig;
use crate::pacing::Pacing;

/// Scrolls down in steps so lazy-loaded cards render, then scrolls back up a
/// little so the listing grid settles. Never fails: a scroll that errors or
/// has nothing left to move is just logged.
pub async fn scroll_page<S, P>(session: &mut S, config: &ScrollConfig, pacing: &P)
where
    S: BrowserSession,
    P: Pacing,
{
    for step in 1..=config.steps {
        if let Err(e) = session.scroll_by(config.step_px) {
            debug!("scroll step {}/{} had no effect: {}", step, config.steps, e);
        }
        sleep(pacing.fixed(config.step_delay)).await;
    }

    if let Err(e) = session.scroll_by(-config.back_px) {
        debug!("correction scroll had no effect: {}", e);
    }
    sleep(pacing.fixed(config.step_delay)).await;
}
