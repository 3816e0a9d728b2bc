use std::time::{Duration, Instant};

/// Fixed-period tick schedule. Missed ticks are skipped, never bunched.
#[derive(Clone, Debug)]
pub struct Ticker {
    period: Duration,
    next: Option<Instant>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// True if a tick is due at `now`; schedules the following one.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.next {
            Some(next) if now < next => false,
            Some(next) if now - next < self.period => {
                self.next = Some(next + self.period);
                true
            }
            _ => {
                self.next = Some(now + self.period);
                true
            }
        }
    }

    /// Time left before the next tick is due.
    pub fn until_next(&self, now: Instant) -> Duration {
        self.next
            .map(|next| next.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}
