//! Seam to the host media subsystem.
//!
//! Backends load and decode audio on their own schedule. Outcomes come back
//! as [`MediaEvent`]s tagged with the round generation that bound the unit,
//! so the player can discard anything from a previous round.

use std::{collections::HashSet, time::Duration};

use thiserror::Error;

use crate::{config::AudioConfig, domain::stem::Stem};

#[cfg(test)]
pub mod fake;
#[cfg(feature = "audio")]
pub mod device;

/// Identifies one playable unit: a stem bound during a given round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackTag {
    pub generation: u64,
    pub stem: Stem,
}

impl TrackTag {
    pub fn new(generation: u64, stem: Stem) -> Self {
        Self { generation, stem }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    Loaded { duration: Option<Duration> },
    Failed { reason: String },
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub tag: TrackTag,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn new(tag: TrackTag, kind: MediaEventKind) -> Self {
        Self { tag, kind }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MediaError {
    #[error("no resource bound for {0:?}")]
    Unbound(TrackTag),

    #[error("playback rejected: {0}")]
    Rejected(String),

    #[error("failed to fetch media: {0}")]
    Fetch(String),

    #[error("failed to decode media: {0}")]
    Decode(String),

    #[error("audio device unavailable: {0}")]
    Device(String),
}

/// Operations the player needs from the platform's media layer.
///
/// Only `start` reports failure synchronously. Load failures, decode
/// failures during playback, and end of media arrive through `poll_events`.
pub trait MediaBackend {
    /// Starts loading `url` for `tag`, replacing anything bound to it
    fn bind(&mut self, tag: TrackTag, url: &str);

    /// Starts sound at position `at`
    fn start(&mut self, tag: TrackTag, at: Duration) -> Result<(), MediaError>;

    fn pause(&mut self, tag: TrackTag);

    /// Moves the unit to `at`. A running unit keeps running from there.
    fn seek(&mut self, tag: TrackTag, at: Duration);

    /// Drops the resource. Nothing is reported for `tag` afterwards.
    fn release(&mut self, tag: TrackTag);

    /// Where a running unit actually is, if the backend can tell
    fn position(&self, tag: TrackTag) -> Option<Duration>;

    fn poll_events(&mut self) -> Vec<MediaEvent>;
}

impl<B: MediaBackend + ?Sized> MediaBackend for Box<B> {
    fn bind(&mut self, tag: TrackTag, url: &str) {
        (**self).bind(tag, url)
    }

    fn start(&mut self, tag: TrackTag, at: Duration) -> Result<(), MediaError> {
        (**self).start(tag, at)
    }

    fn pause(&mut self, tag: TrackTag) {
        (**self).pause(tag)
    }

    fn seek(&mut self, tag: TrackTag, at: Duration) {
        (**self).seek(tag, at)
    }

    fn release(&mut self, tag: TrackTag) {
        (**self).release(tag)
    }

    fn position(&self, tag: TrackTag) -> Option<Duration> {
        (**self).position(tag)
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        (**self).poll_events()
    }
}

/// Backend that never makes a sound: every bind loads, every start succeeds.
#[derive(Debug, Default)]
pub struct NullBackend {
    bound: HashSet<TrackTag>,
    events: Vec<MediaEvent>,
}

impl MediaBackend for NullBackend {
    fn bind(&mut self, tag: TrackTag, _url: &str) {
        self.bound.insert(tag);
        self.events.push(MediaEvent::new(
            tag,
            MediaEventKind::Loaded { duration: None },
        ));
    }

    fn start(&mut self, tag: TrackTag, _at: Duration) -> Result<(), MediaError> {
        if self.bound.contains(&tag) {
            Ok(())
        } else {
            Err(MediaError::Unbound(tag))
        }
    }

    fn pause(&mut self, _tag: TrackTag) {}

    fn seek(&mut self, _tag: TrackTag, _at: Duration) {}

    fn release(&mut self, tag: TrackTag) {
        self.bound.remove(&tag);
        self.events.retain(|e| e.tag != tag);
    }

    fn position(&self, _tag: TrackTag) -> Option<Duration> {
        None
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Opens the backend selected by the audio config
pub fn open_backend(config: &AudioConfig) -> Result<Box<dyn MediaBackend>, MediaError> {
    if config.mute {
        log::info!("Audio muted, using silent backend");
        return Ok(Box::new(NullBackend::default()));
    }

    #[cfg(feature = "audio")]
    return Ok(Box::new(device::RodioBackend::new()?));

    #[cfg(not(feature = "audio"))]
    {
        log::warn!("Built without the 'audio' feature, using silent backend");
        Ok(Box::new(NullBackend::default()))
    }
}
