//! Scriptable backend for player and game tests

use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use crate::{
    domain::stem::Stem,
    media::{MediaBackend, MediaError, MediaEvent, MediaEventKind, TrackTag},
};

#[derive(Debug, Default)]
pub struct FakeBackend {
    /// Emit `Loaded` as soon as a unit is bound
    pub auto_load: bool,
    /// Stems whose load fails (when `auto_load` is on)
    pub fail_load: HashSet<Stem>,
    /// Stems whose `start` is rejected
    pub reject_start: HashSet<Stem>,
    /// Position reported for a running unit, none when absent
    pub reported: HashMap<TrackTag, Duration>,

    pub bound: HashMap<TrackTag, String>,
    pub running: HashMap<TrackTag, Duration>,
    pub starts: Vec<(TrackTag, Duration)>,
    pub seeks: Vec<(TrackTag, Duration)>,
    pub released: Vec<TrackTag>,
    pending: Vec<MediaEvent>,
}

impl FakeBackend {
    pub fn loading() -> Self {
        Self {
            auto_load: true,
            ..Default::default()
        }
    }

    pub fn push(&mut self, tag: TrackTag, kind: MediaEventKind) {
        self.pending.push(MediaEvent::new(tag, kind));
    }

    pub fn running_stems(&self) -> Vec<Stem> {
        let mut stems: Vec<_> = self.running.keys().map(|t| t.stem).collect();
        stems.sort();
        stems
    }
}

impl MediaBackend for FakeBackend {
    fn bind(&mut self, tag: TrackTag, url: &str) {
        self.bound.insert(tag, url.to_string());
        if self.auto_load {
            let kind = if self.fail_load.contains(&tag.stem) {
                MediaEventKind::Failed {
                    reason: format!("404 {url}"),
                }
            } else {
                MediaEventKind::Loaded {
                    duration: Some(Duration::from_secs(180)),
                }
            };
            self.push(tag, kind);
        }
    }

    fn start(&mut self, tag: TrackTag, at: Duration) -> Result<(), MediaError> {
        if !self.bound.contains_key(&tag) {
            return Err(MediaError::Unbound(tag));
        }
        if self.reject_start.contains(&tag.stem) {
            return Err(MediaError::Rejected("not allowed".into()));
        }
        self.starts.push((tag, at));
        self.running.insert(tag, at);
        Ok(())
    }

    fn pause(&mut self, tag: TrackTag) {
        self.running.remove(&tag);
    }

    fn seek(&mut self, tag: TrackTag, at: Duration) {
        self.seeks.push((tag, at));
        self.reported.remove(&tag);
        if let Some(pos) = self.running.get_mut(&tag) {
            *pos = at;
        }
    }

    fn release(&mut self, tag: TrackTag) {
        self.bound.remove(&tag);
        self.running.remove(&tag);
        self.released.push(tag);
    }

    fn position(&self, tag: TrackTag) -> Option<Duration> {
        if self.running.contains_key(&tag) {
            self.reported.get(&tag).copied()
        } else {
            None
        }
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.pending)
    }
}
