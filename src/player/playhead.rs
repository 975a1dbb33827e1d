use std::time::{Duration, Instant};

/// Logical position shared by every track of the group.
///
/// While running, the position advances with wall time from the instant it
/// was last anchored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Playhead {
    base: Duration,
    since: Option<Instant>,
}

impl Playhead {
    pub fn at(&self, now: Instant) -> Duration {
        match self.since {
            Some(since) => self.base.saturating_add(now.saturating_duration_since(since)),
            None => self.base,
        }
    }

    pub fn run(&mut self, now: Instant) {
        if self.since.is_none() {
            self.since = Some(now);
        }
    }

    pub fn set(&mut self, position: Duration, now: Instant) {
        self.base = position;
        if self.since.is_some() {
            self.since = Some(now);
        }
    }
}
