//! Capped exponential backoff for the continuous listen loop.

use std::time::Duration;

/// Upper bound on the retry delay. Backoff doubles until it reaches this
/// ceiling and then stays there; only a successful sync resets it.
pub const BACKOFF_CEILING: Duration = Duration::from_secs(3600);

/// Doubling retry-delay calculator.
///
/// `next_delay` yields the current delay and doubles the stored one, so a
/// 5s initial delay produces 5s, 10s, 20s, ... up to the ceiling. The
/// loop never abandons retrying; the ceiling only clamps the growth.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    ceiling: Duration,
    current: Duration,
}

impl Backoff {
    /// Create a backoff starting at `initial` and capped at `ceiling`.
    pub fn new(initial: Duration, ceiling: Duration) -> Self {
        Self {
            initial,
            ceiling,
            current: initial,
        }
    }

    /// The delay to sleep for now. Doubles the stored delay for the next
    /// call, clamped to the ceiling.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.ceiling);
        delay
    }

    /// Restore the initial delay after a successful sync.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
