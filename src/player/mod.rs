//! Synchronized multi-stem playback.
//!
//! The player keeps one track per stem and a single shared playhead. Every
//! start, stop and seek is expressed against that playhead, so a stem that
//! joins late or gets re-seeked lands where the others are.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    domain::stem::{PerStem, Stem},
    media::{MediaBackend, MediaEvent, MediaEventKind, TrackTag},
};

pub mod playhead;

use playhead::Playhead;

/// Drift beyond which a running track is re-seeked to the shared playhead
pub const DEFAULT_DRIFT_TOLERANCE: Duration = Duration::from_millis(120);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlayerError {
    #[error("no playable audio for this song")]
    AllStemsUnavailable,
}

/// Something the player did on its own that the owner has to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerNotice {
    /// A track ran out, the group stopped and rewound
    Ended,
    /// Every audible track failed while playing, the group stopped
    Silenced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loaded,
    /// Terminal for the rest of the round
    Errored,
}

#[derive(Debug)]
struct Track {
    url: String,
    load: LoadState,
    running: bool,
}

pub struct StemPlayer<B> {
    backend: B,
    generation: u64,
    tracks: PerStem<Option<Track>>,
    active: PerStem<bool>,
    playhead: Playhead,
    playing: bool,
    duration: Option<Duration>,
    drift_tolerance: Duration,
}

impl<B: MediaBackend> StemPlayer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            generation: 0,
            tracks: PerStem::default(),
            active: PerStem::default(),
            playhead: Playhead::default(),
            playing: false,
            duration: None,
            drift_tolerance: DEFAULT_DRIFT_TOLERANCE,
        }
    }

    pub fn with_drift_tolerance(mut self, tolerance: Duration) -> Self {
        self.drift_tolerance = tolerance;
        self
    }

    /// Stops and releases every track and opens a new generation.
    ///
    /// Events still in flight for older generations are ignored from now on.
    pub fn begin_round(&mut self) -> u64 {
        self.release_all();
        self.generation += 1;
        self.active = PerStem::default();
        self.playhead = Playhead::default();
        self.duration = None;
        self.generation
    }

    /// Binds a fresh resource to `stem`. Sound is not started.
    ///
    /// A stem that already failed this round stays failed.
    pub fn load(&mut self, stem: Stem, url: &str) {
        let tag = self.tag(stem);
        if let Some(track) = &self.tracks[stem] {
            if track.load == LoadState::Errored {
                debug!("Not reloading {stem}, it failed earlier this round");
                return;
            }
            self.backend.release(tag);
        }

        self.tracks[stem] = Some(Track {
            url: url.to_string(),
            load: LoadState::Unloaded,
            running: false,
        });
        self.backend.bind(tag, url);
    }

    /// Declares which stems may be heard. Deactivated stems fall silent.
    pub fn set_active(&mut self, stems: &[Stem]) {
        for stem in Stem::ALL {
            let active = stems.contains(&stem);
            self.active[stem] = active;
            if !active {
                self.silence(stem);
            }
        }
    }

    /// Starts every audible track at the shared playhead.
    ///
    /// Tracks that refuse to start are marked errored. Fails only when
    /// nothing could be started at all.
    pub fn play(&mut self, now: Instant) -> Result<(), PlayerError> {
        if self.playing {
            return Ok(());
        }

        let at = self.playhead.at(now);
        let mut started = 0;
        for stem in self.audible() {
            if self.start_track(stem, at) {
                started += 1;
            }
        }

        if started == 0 {
            warn!("No stem could be started");
            return Err(PlayerError::AllStemsUnavailable);
        }

        self.playing = true;
        self.playhead.run(now);
        info!("Playing {started} stem(s) from {at:?}");
        Ok(())
    }

    /// Stops every track and rewinds the shared playhead to the start
    pub fn pause(&mut self) {
        self.halt();
    }

    /// Makes `stem` audible, joining it in sync if the group is playing
    pub fn reveal_next(&mut self, stem: Stem, now: Instant) {
        self.active[stem] = true;
        if self.playing && self.is_audible(stem) {
            let at = self.playhead.at(now);
            self.start_track(stem, at);
        }
    }

    /// Moves the shared playhead for every bound track, audible or not
    pub fn seek(&mut self, position: Duration, now: Instant) {
        let position = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        self.playhead.set(position, now);

        for stem in Stem::ALL {
            if self.is_usable(stem) {
                let tag = self.tag(stem);
                self.backend.seek(tag, position);
            }
        }
    }

    /// Applies pending media events and corrects drift.
    pub fn tick(&mut self, now: Instant) -> Vec<PlayerNotice> {
        let mut notices = Vec::new();
        for event in self.backend.poll_events() {
            if let Some(notice) = self.apply(event) {
                notices.push(notice);
            }
        }

        if self.playing {
            self.correct_drift(now);
        }

        notices
    }

    /// Applies one media event. Stale or redundant events change nothing.
    pub fn apply(&mut self, event: MediaEvent) -> Option<PlayerNotice> {
        let MediaEvent { tag, kind } = event;
        if tag.generation != self.generation {
            debug!("Ignoring stale event for {} from round {}", tag.stem, tag.generation);
            return None;
        }

        let track = self.tracks[tag.stem].as_mut()?;
        if track.load == LoadState::Errored {
            return None;
        }

        match kind {
            MediaEventKind::Loaded { duration } => {
                track.load = LoadState::Loaded;
                if self.duration.is_none() {
                    self.duration = duration;
                }
                None
            }
            MediaEventKind::Failed { reason } => {
                warn!("Stem {} failed to load ({}): {reason}", tag.stem, track.url);
                self.mark_errored(tag.stem);
                if self.playing && !self.any_running() {
                    self.halt();
                    return Some(PlayerNotice::Silenced);
                }
                None
            }
            MediaEventKind::Ended if track.running => {
                info!("Stem {} reached the end, stopping", tag.stem);
                self.halt();
                Some(PlayerNotice::Ended)
            }
            MediaEventKind::Ended => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self, now: Instant) -> Duration {
        self.playhead.at(now)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn load_state(&self, stem: Stem) -> Option<LoadState> {
        self.tracks[stem].as_ref().map(|t| t.load)
    }

    pub fn is_errored(&self, stem: Stem) -> bool {
        self.load_state(stem) == Some(LoadState::Errored)
    }

    /// Active and not errored
    pub fn is_audible(&self, stem: Stem) -> bool {
        self.active[stem] && self.is_usable(stem)
    }

    pub fn audible(&self) -> Vec<Stem> {
        Stem::ALL
            .into_iter()
            .filter(|s| self.is_audible(*s))
            .collect()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Stops and releases everything bound in the current generation
    pub fn release_all(&mut self) {
        self.halt();
        for stem in Stem::ALL {
            let tag = self.tag(stem);
            if self.tracks[stem].take().is_some() {
                self.backend.release(tag);
            }
        }
    }

    fn tag(&self, stem: Stem) -> TrackTag {
        TrackTag::new(self.generation, stem)
    }

    fn is_usable(&self, stem: Stem) -> bool {
        self.tracks[stem]
            .as_ref()
            .is_some_and(|t| t.load != LoadState::Errored)
    }

    fn any_running(&self) -> bool {
        self.tracks.iter().any(|(_, t)| t.as_ref().is_some_and(|t| t.running))
    }

    fn start_track(&mut self, stem: Stem, at: Duration) -> bool {
        let tag = self.tag(stem);
        match self.backend.start(tag, at) {
            Ok(()) => {
                if let Some(track) = self.tracks[stem].as_mut() {
                    track.running = true;
                }
                true
            }
            Err(e) => {
                warn!("Stem {stem} failed to start: {e}");
                self.mark_errored(stem);
                false
            }
        }
    }

    fn silence(&mut self, stem: Stem) {
        let tag = self.tag(stem);
        if let Some(track) = self.tracks[stem].as_mut() {
            if track.running {
                track.running = false;
                self.backend.pause(tag);
            }
        }
    }

    fn mark_errored(&mut self, stem: Stem) {
        self.silence(stem);
        if let Some(track) = self.tracks[stem].as_mut() {
            track.load = LoadState::Errored;
        }
    }

    /// Stops the group and rewinds every usable track to zero
    fn halt(&mut self) {
        for stem in Stem::ALL {
            self.silence(stem);
            if self.is_usable(stem) {
                let tag = self.tag(stem);
                self.backend.seek(tag, Duration::ZERO);
            }
        }
        self.playing = false;
        self.playhead = Playhead::default();
    }

    fn correct_drift(&mut self, now: Instant) {
        let expected = self.playhead.at(now);
        for (stem, track) in self.tracks.iter() {
            let Some(track) = track else { continue };
            if !track.running {
                continue;
            }
            let tag = TrackTag::new(self.generation, stem);
            let Some(actual) = self.backend.position(tag) else {
                continue;
            };
            let drift = actual.abs_diff(expected);
            if drift > self.drift_tolerance {
                debug!("Stem {stem} drifted {drift:?}, resyncing to {expected:?}");
                self.backend.seek(tag, expected);
            }
        }
    }
}
