//! Round lifecycle: song selection, progressive stem reveal, guesses and
//! the attempt budget.
//!
//! Every change to which stems are revealed is forwarded to the
//! [`StemPlayer`], so what the player hears always matches the round.

use std::{fmt::Display, time::Duration};

use chrono::{DateTime, Local};
use log::{debug, error, info};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::{
    assets::{AssetResolver, StemUrlResolver},
    domain::{
        catalog::{Catalog, Library, Song},
        stem::{NUM_STEMS, Stem},
    },
    media::MediaBackend,
    player::{LoadState, PlayerNotice, StemPlayer},
    suggest::{DEFAULT_LIMIT, SuggestionIndex},
};

pub mod clock;
pub mod error;
pub mod snapshot;
pub mod timer;

use clock::{Clock, SystemClock};
use error::GameError;
use snapshot::{Snapshot, StemStatus, format_clock};
use timer::ListeningTimer;

/// Wrong guesses allowed per round
pub const ATTEMPT_BUDGET: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    InProgress,
    Won,
    Lost,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::InProgress
    }
}

/// One submitted guess, never changed afterwards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuessRecord {
    pub title: String,
    pub correct: bool,
    pub stems_revealed: usize,
    #[serde(serialize_with = "snapshot::as_secs")]
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct { title: String },
    Wrong { remaining: u8 },
    OutOfGuesses { answer: String },
    NoPlayableAudio,
}

impl Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feedback::Correct { title } => write!(f, "Correct! It was \"{title}\"."),
            Feedback::Wrong { remaining: 1 } => write!(f, "Wrong guess, 1 guess remaining."),
            Feedback::Wrong { remaining } => {
                write!(f, "Wrong guess, {remaining} guesses remaining.")
            }
            Feedback::OutOfGuesses { answer } => {
                write!(f, "Out of guesses! The song was \"{answer}\".")
            }
            Feedback::NoPlayableAudio => write!(f, "No playable audio for this song."),
        }
    }
}

/// What the presenter can ask the game to do
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    StartRound(String),
    TogglePlayback,
    RevealNext,
    SubmitGuess(String),
    SetGuessText(String),
    ResetRound,
    SelectCatalog(String),
    Seek(Duration),
}

#[derive(Debug, Clone)]
pub struct RoundState {
    catalog: Catalog,
    answer: Song,
    revealed: usize,
    attempts: u8,
    playing: bool,
    started_at: DateTime<Local>,
    outcome: Outcome,
    history: Vec<GuessRecord>,
    finished_after: Option<Duration>,
}

impl RoundState {
    /// Picks a song uniformly at random from `catalog`
    fn deal(catalog: Catalog, rng: &mut impl Rng) -> Result<Self, GameError> {
        if catalog.is_empty() {
            return Err(GameError::EmptyCatalog(catalog.id));
        }
        let answer = catalog.songs()[rng.gen_range(0..catalog.len())].clone();

        Ok(Self {
            catalog,
            answer,
            revealed: 1,
            attempts: ATTEMPT_BUDGET,
            playing: false,
            started_at: Local::now(),
            outcome: Outcome::InProgress,
            history: Vec::new(),
            finished_after: None,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn revealed(&self) -> &'static [Stem] {
        Stem::prefix(self.revealed)
    }

    pub fn attempts_remaining(&self) -> u8 {
        self.attempts
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn history(&self) -> &[GuessRecord] {
        &self.history
    }

    /// Listening time at the guess that ended the round
    pub fn finished_after(&self) -> Option<Duration> {
        self.finished_after
    }
}

pub struct GameOptions {
    pub resolver: Box<dyn AssetResolver>,
    pub clock: Box<dyn Clock>,
    pub rng: StdRng,
    pub suggestion_limit: usize,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            resolver: Box::new(StemUrlResolver::new("wav")),
            clock: Box::new(SystemClock),
            rng: StdRng::from_entropy(),
            suggestion_limit: DEFAULT_LIMIT,
        }
    }
}

pub struct Game<B> {
    library: Library,
    player: StemPlayer<B>,
    resolver: Box<dyn AssetResolver>,
    clock: Box<dyn Clock>,
    rng: StdRng,
    timer: ListeningTimer,
    round: RoundState,
    guess_text: String,
    suggestions: Vec<String>,
    suggestion_limit: usize,
    feedback: Option<Feedback>,
}

impl<B: MediaBackend> Game<B> {
    /// Creates the game and starts a round on `playlist`
    pub fn new(
        library: Library,
        player: StemPlayer<B>,
        playlist: &str,
        options: GameOptions,
    ) -> Result<Self, GameError> {
        let GameOptions {
            resolver,
            clock,
            mut rng,
            suggestion_limit,
        } = options;

        let catalog = Self::lookup(&library, playlist)?;
        let round = RoundState::deal(catalog, &mut rng)?;

        let mut game = Self {
            library,
            player,
            resolver,
            clock,
            rng,
            timer: ListeningTimer::default(),
            round,
            guess_text: String::new(),
            suggestions: Vec::new(),
            suggestion_limit,
            feedback: None,
        };
        game.load_stems();
        Ok(game)
    }

    /// Applies one presenter intent
    pub fn dispatch(&mut self, intent: Intent) -> Result<(), GameError> {
        match intent {
            Intent::StartRound(playlist) => {
                let catalog = Self::lookup(&self.library, &playlist)?;
                self.start_round(catalog)?;
            }
            Intent::TogglePlayback => self.toggle_playback(),
            Intent::RevealNext => self.reveal_next(),
            Intent::SubmitGuess(title) => self.submit_guess(&title),
            Intent::SetGuessText(text) => self.set_guess_text(&text),
            Intent::ResetRound => self.reset_round(None)?,
            Intent::SelectCatalog(playlist) => self.select_catalog(&playlist)?,
            Intent::Seek(position) => self.seek(position),
        }
        Ok(())
    }

    /// Deals a new song from `catalog` and binds its stems.
    ///
    /// On an empty catalog the current round is left untouched.
    pub fn start_round(&mut self, catalog: Catalog) -> Result<(), GameError> {
        let round = RoundState::deal(catalog, &mut self.rng)?;

        self.stop_playback();
        self.timer.reset();
        self.round = round;
        self.guess_text.clear();
        self.suggestions.clear();
        self.feedback = None;
        self.load_stems();

        info!(
            "New round on playlist '{}' ({} songs)",
            self.round.catalog.id,
            self.round.catalog.len()
        );
        Ok(())
    }

    /// Restarts the round, on a different catalog if one is given
    pub fn reset_round(&mut self, catalog: Option<Catalog>) -> Result<(), GameError> {
        let catalog = catalog.unwrap_or_else(|| self.round.catalog.clone());
        self.start_round(catalog)
    }

    pub fn select_catalog(&mut self, playlist: &str) -> Result<(), GameError> {
        let catalog = Self::lookup(&self.library, playlist)?;
        self.reset_round(Some(catalog))
    }

    pub fn toggle_playback(&mut self) {
        let now = self.clock.now();
        if self.round.playing {
            self.player.pause();
            self.round.playing = false;
            self.timer.stop(now);
            return;
        }

        match self.player.play(now) {
            Ok(()) => {
                self.round.playing = true;
                self.timer.start(now);
                if self.feedback == Some(Feedback::NoPlayableAudio) {
                    self.feedback = None;
                }
            }
            Err(e) => {
                error!("Cannot play '{}': {e}", self.round.answer.title);
                self.feedback = Some(Feedback::NoPlayableAudio);
            }
        }
    }

    /// Unlocks the next stem. Does nothing at full reveal or after the round ended.
    pub fn reveal_next(&mut self) {
        if self.round.outcome.is_terminal() || self.round.revealed >= NUM_STEMS {
            return;
        }

        self.round.revealed += 1;
        let stem = Stem::ALL[self.round.revealed - 1];
        self.player.reveal_next(stem, self.clock.now());
        info!("Revealed {stem} ({}/{NUM_STEMS})", self.round.revealed);
    }

    /// Evaluates a guess. Titles outside the catalog and guesses after the
    /// round ended are ignored.
    pub fn submit_guess(&mut self, title: &str) {
        if self.round.outcome.is_terminal() {
            debug!("Ignoring guess '{title}', round is over");
            return;
        }
        if !self.round.catalog.contains(title) {
            debug!("Ignoring guess '{title}', not in playlist");
            return;
        }

        let elapsed = self.timer.elapsed(self.clock.now());
        let correct = title == self.round.answer.title;
        self.round.history.push(GuessRecord {
            title: title.to_string(),
            correct,
            stems_revealed: self.round.revealed,
            elapsed,
        });
        self.guess_text.clear();
        self.suggestions.clear();

        if correct {
            info!("Correct guess '{title}' after {elapsed:?}");
            self.finish(Outcome::Won, elapsed);
            self.feedback = Some(Feedback::Correct {
                title: title.to_string(),
            });
            return;
        }

        self.round.attempts = self.round.attempts.saturating_sub(1);
        info!(
            "Wrong guess '{title}', {} attempt(s) left",
            self.round.attempts
        );

        if self.round.attempts == 0 {
            self.finish(Outcome::Lost, elapsed);
            self.feedback = Some(Feedback::OutOfGuesses {
                answer: self.round.answer.title.clone(),
            });
        } else {
            self.feedback = Some(Feedback::Wrong {
                remaining: self.round.attempts,
            });
            self.reveal_next();
        }
    }

    pub fn set_guess_text(&mut self, text: &str) {
        self.guess_text = text.to_string();
        self.suggestions = SuggestionIndex::query(text, &self.round.catalog, self.suggestion_limit);
    }

    pub fn seek(&mut self, position: Duration) {
        self.player.seek(position, self.clock.now());
    }

    /// Periodic work: media events, drift, listening time
    pub fn tick(&mut self) {
        let now = self.clock.now();
        for notice in self.player.tick(now) {
            if notice == PlayerNotice::Silenced {
                error!("Every stem of '{}' failed", self.round.answer.title);
                self.feedback = Some(Feedback::NoPlayableAudio);
            }
            self.round.playing = false;
            self.timer.stop(now);
        }
        self.timer.tick(now);
    }

    /// Stops sound and releases every track
    pub fn shutdown(&mut self) {
        self.stop_playback();
        self.player.release_all();
    }

    pub fn snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        let round = &self.round;
        let position = self.player.position(now);
        let duration = self.player.duration();

        Snapshot {
            playlist: round.catalog.id.clone(),
            playlist_name: round.catalog.name.clone(),
            revealed: round.revealed().to_vec(),
            stems: Stem::ALL
                .into_iter()
                .map(|stem| StemStatus {
                    stem,
                    revealed: round.revealed().contains(&stem),
                    loaded: self.player.load_state(stem) == Some(LoadState::Loaded),
                    errored: self.player.is_errored(stem),
                })
                .collect(),
            playing: round.playing,
            attempts_remaining: round.attempts,
            elapsed: self.timer.elapsed(now),
            position,
            duration,
            position_label: format_clock(position),
            duration_label: duration.map(format_clock).unwrap_or_default(),
            started_at: round.started_at,
            history: round.history.clone(),
            outcome: round.outcome,
            answer: round
                .outcome
                .is_terminal()
                .then(|| round.answer.title.clone()),
            feedback: self.feedback.as_ref().map(ToString::to_string),
            guess_text: self.guess_text.clone(),
            suggestions: self.suggestions.clone(),
        }
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    /// Title of the hidden song
    pub fn answer(&self) -> &str {
        &self.round.answer.title
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn player(&self) -> &StemPlayer<B> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut StemPlayer<B> {
        &mut self.player
    }

    fn lookup(library: &Library, playlist: &str) -> Result<Catalog, GameError> {
        library
            .get(playlist)
            .cloned()
            .map_err(|_| GameError::UnknownPlaylist(playlist.to_string()))
    }

    fn load_stems(&mut self) {
        let generation = self.player.begin_round();
        debug!(
            "Binding stems of '{}' as generation {generation}",
            self.round.answer.title
        );

        for stem in Stem::ALL {
            let url = self
                .resolver
                .resolve(&self.round.catalog.id, &self.round.answer, stem);
            self.player.load(stem, &url);
        }
        self.player.set_active(self.round.revealed());
    }

    fn stop_playback(&mut self) {
        if self.round.playing {
            self.player.pause();
            self.round.playing = false;
        }
        self.timer.stop(self.clock.now());
    }

    fn finish(&mut self, outcome: Outcome, elapsed: Duration) {
        self.round.outcome = outcome;
        self.round.finished_after = Some(elapsed);
    }
}
