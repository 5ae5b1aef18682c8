use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Decides how long each wait in a collection run actually lasts.
///
/// The collector asks for every delay through this trait so production runs
/// get human-like jitter while tests run with zero or fixed waits.
pub trait Pacing {
    /// A fixed settle delay (scroll steps, render settle, retry gap).
    fn fixed(&self, nominal: Duration) -> Duration;
    /// The pause after turning a page, drawn from `range_ms`.
    fn page_turn(&self, range_ms: &RangeInclusive<u64>) -> Duration;
}

/// Waits the configured delays; page turns are uniformly random.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPacing;

impl Pacing for RandomPacing {
    fn fixed(&self, nominal: Duration) -> Duration {
        nominal
    }

    fn page_turn(&self, range_ms: &RangeInclusive<u64>) -> Duration {
        let millis = if range_ms.is_empty() {
            *range_ms.start()
        } else {
            rand::thread_rng().gen_range(range_ms.clone())
        };
        Duration::from_millis(millis)
    }
}

/// Deterministic delays. `zero()` disables waiting entirely.
#[derive(Debug, Clone, Copy)]
pub struct FixedPacing {
    fixed: Duration,
    page_turn: Duration,
}

impl FixedPacing {
    pub fn new(fixed: Duration, page_turn: Duration) -> Self {
        Self { fixed, page_turn }
    }

    pub fn zero() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

impl Pacing for FixedPacing {
    fn fixed(&self, _nominal: Duration) -> Duration {
        self.fixed
    }

    fn page_turn(&self, _range_ms: &RangeInclusive<u64>) -> Duration {
        self.page_turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_page_turn_stays_in_range() {
        let range = 6_000..=10_000;
        for _ in 0..200 {
            let d = RandomPacing.page_turn(&range);
            assert!(d >= Duration::from_secs(6) && d <= Duration::from_secs(10));
        }
    }

    #[test]
    fn degenerate_range_uses_start() {
        #[allow(clippy::reversed_empty_ranges)]
        let range = 5_000..=1_000;
        assert_eq!(RandomPacing.page_turn(&range), Duration::from_secs(5));
    }

    #[test]
    fn zero_pacing_never_waits() {
        let pacing = FixedPacing::zero();
        assert_eq!(pacing.fixed(Duration::from_secs(5)), Duration::ZERO);
        assert_eq!(pacing.page_turn(&(6_000..=10_000)), Duration::ZERO);
    }
}
