//! Audio device backend using rodio
//!
//! Each bound unit is fetched and probed on its own loader thread. Sound is
//! produced by a fresh `Sink` per start, skipping into the decoded stream,
//! so a seek on a running unit is a restart at the new position.

use std::{
    collections::HashMap,
    io::Cursor,
    sync::{Arc, mpsc},
    thread,
    time::{Duration, Instant},
};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::media::{MediaBackend, MediaError, MediaEvent, MediaEventKind, TrackTag};

type Fetched = Result<(Arc<[u8]>, Option<Duration>), MediaError>;

#[derive(Default)]
struct Unit {
    data: Option<Arc<[u8]>>,
    sink: Option<Sink>,
    /// Position the sink started at, and when
    started: Option<(Duration, Instant)>,
    /// Start requested before the data arrived
    pending: Option<(Duration, Instant)>,
}

pub struct RodioBackend {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    units: HashMap<TrackTag, Unit>,
    loads_tx: mpsc::Sender<(TrackTag, Fetched)>,
    loads_rx: mpsc::Receiver<(TrackTag, Fetched)>,
    events: Vec<MediaEvent>,
}

impl RodioBackend {
    pub fn new() -> Result<Self, MediaError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| MediaError::Device(e.to_string()))?;
        let (loads_tx, loads_rx) = mpsc::channel();

        Ok(Self {
            _stream: stream,
            handle,
            units: HashMap::new(),
            loads_tx,
            loads_rx,
            events: Vec::new(),
        })
    }

    fn fetch(url: &str) -> Result<Vec<u8>, MediaError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = reqwest::blocking::get(url)
                .and_then(|r| r.error_for_status())
                .map_err(|e| MediaError::Fetch(e.to_string()))?;
            let bytes = response
                .bytes()
                .map_err(|e| MediaError::Fetch(e.to_string()))?;
            Ok(bytes.to_vec())
        } else {
            let path = url.strip_prefix("file://").unwrap_or(url);
            std::fs::read(path).map_err(|e| MediaError::Fetch(format!("{path}: {e}")))
        }
    }

    fn decode(data: &Arc<[u8]>) -> Result<Decoder<Cursor<Arc<[u8]>>>, MediaError> {
        Decoder::new(Cursor::new(Arc::clone(data))).map_err(|e| MediaError::Decode(e.to_string()))
    }

    fn load(url: &str) -> Fetched {
        let data: Arc<[u8]> = Arc::from(Self::fetch(url)?);
        let duration = Self::decode(&data)?.total_duration();
        Ok((data, duration))
    }

    fn open_sink(
        handle: &OutputStreamHandle,
        data: &Arc<[u8]>,
        at: Duration,
    ) -> Result<Sink, MediaError> {
        let source = Self::decode(data)?.skip_duration(at);
        let sink = Sink::try_new(handle).map_err(|e| MediaError::Rejected(e.to_string()))?;
        sink.append(source);
        Ok(sink)
    }

    /// Starts a unit whose data is present
    fn run(handle: &OutputStreamHandle, unit: &mut Unit, at: Duration) -> Result<(), MediaError> {
        let Some(data) = &unit.data else {
            unit.pending = Some((at, Instant::now()));
            return Ok(());
        };
        let sink = Self::open_sink(handle, data, at)?;
        unit.sink = Some(sink);
        unit.started = Some((at, Instant::now()));
        Ok(())
    }

    fn receive_loads(&mut self) {
        while let Ok((tag, fetched)) = self.loads_rx.try_recv() {
            // released in the meantime
            let Some(unit) = self.units.get_mut(&tag) else {
                continue;
            };

            match fetched {
                Ok((data, duration)) => {
                    unit.data = Some(data);
                    self.events
                        .push(MediaEvent::new(tag, MediaEventKind::Loaded { duration }));

                    if let Some((at, requested)) = unit.pending.take() {
                        let at = at.saturating_add(requested.elapsed());
                        if let Err(e) = Self::run(&self.handle, unit, at) {
                            self.events.push(MediaEvent::new(
                                tag,
                                MediaEventKind::Failed {
                                    reason: e.to_string(),
                                },
                            ));
                        }
                    }
                }
                Err(e) => {
                    unit.pending = None;
                    self.events.push(MediaEvent::new(
                        tag,
                        MediaEventKind::Failed {
                            reason: e.to_string(),
                        },
                    ));
                }
            }
        }
    }

    fn detect_ends(&mut self) {
        for (tag, unit) in self.units.iter_mut() {
            if unit.sink.as_ref().is_some_and(|s| s.empty()) {
                unit.sink = None;
                unit.started = None;
                self.events.push(MediaEvent::new(*tag, MediaEventKind::Ended));
            }
        }
    }
}

impl MediaBackend for RodioBackend {
    fn bind(&mut self, tag: TrackTag, url: &str) {
        self.units.insert(tag, Unit::default());

        let tx = self.loads_tx.clone();
        let url = url.to_string();
        thread::spawn(move || {
            let fetched = Self::load(&url);
            if let Err(e) = &fetched {
                log::debug!("Loading {url} failed: {e}");
            }
            let _ = tx.send((tag, fetched));
        });
    }

    fn start(&mut self, tag: TrackTag, at: Duration) -> Result<(), MediaError> {
        let unit = self.units.get_mut(&tag).ok_or(MediaError::Unbound(tag))?;
        Self::run(&self.handle, unit, at)
    }

    fn pause(&mut self, tag: TrackTag) {
        if let Some(unit) = self.units.get_mut(&tag) {
            unit.sink = None;
            unit.started = None;
            unit.pending = None;
        }
    }

    fn seek(&mut self, tag: TrackTag, at: Duration) {
        let Some(unit) = self.units.get_mut(&tag) else {
            return;
        };
        if unit.started.is_none() && unit.pending.is_none() {
            return;
        }

        if let Err(e) = Self::run(&self.handle, unit, at) {
            unit.sink = None;
            unit.started = None;
            self.events.push(MediaEvent::new(
                tag,
                MediaEventKind::Failed {
                    reason: e.to_string(),
                },
            ));
        }
    }

    fn release(&mut self, tag: TrackTag) {
        self.units.remove(&tag);
    }

    fn position(&self, tag: TrackTag) -> Option<Duration> {
        let (at, since) = self.units.get(&tag)?.started?;
        Some(at.saturating_add(since.elapsed()))
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        self.receive_loads();
        self.detect_ends();
        std::mem::take(&mut self.events)
    }
}
