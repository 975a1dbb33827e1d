use std::time::{Duration, Instant};

/// Accumulates listening time while playback runs.
///
/// There is at most one armed span at a time; arming again first banks the
/// running span.
#[derive(Debug, Clone, Default)]
pub struct ListeningTimer {
    armed_at: Option<Instant>,
    banked: Duration,
}

impl ListeningTimer {
    pub fn start(&mut self, now: Instant) {
        self.bank(now);
        self.armed_at = Some(now);
    }

    pub fn stop(&mut self, now: Instant) {
        self.bank(now);
        self.armed_at = None;
    }

    /// Periodic update, moves the running span into the bank
    pub fn tick(&mut self, now: Instant) {
        if self.armed_at.is_some() {
            self.bank(now);
            self.armed_at = Some(now);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .armed_at
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default();
        self.banked + running
    }

    fn bank(&mut self, now: Instant) {
        if let Some(since) = self.armed_at.take() {
            self.banked += now.saturating_duration_since(since);
        }
    }
}
