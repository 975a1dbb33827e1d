//! Game actor thread
//!
//! The game, its player and the media backend live on one thread. Requests
//! arrive as commands over a channel and are applied one at a time, so the
//! round never sees two intents interleaved. Between commands the thread
//! ticks the game at the configured period.

use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::Context;
use log::{debug, info};
use thiserror::Error;

use crate::{
    game::{Game, Intent, error::GameError, snapshot::Snapshot},
    media::MediaBackend,
};

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("game thread is not running")]
    Stopped,
}

enum Command {
    Apply(Intent, mpsc::Sender<Result<Snapshot, GameError>>),
    Snapshot(mpsc::Sender<Snapshot>),
    Shutdown,
}

pub struct GameHost {
    commands: mpsc::Sender<Command>,
    thread: Option<JoinHandle<()>>,
}

impl GameHost {
    /// Starts the game thread. `factory` runs on that thread, so the backend
    /// it opens never has to leave it.
    pub fn spawn<B, F>(tick: Duration, factory: F) -> anyhow::Result<Self>
    where
        B: MediaBackend + 'static,
        F: FnOnce() -> anyhow::Result<Game<B>> + Send + 'static,
    {
        let (commands, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = thread::Builder::new()
            .name("game".into())
            .spawn(move || {
                let mut game = match factory() {
                    Ok(game) => {
                        let _ = ready_tx.send(Ok(()));
                        game
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                Self::run(&mut game, rx, tick);
                game.shutdown();
                info!("Game thread stopped");
            })
            .context("Failed to spawn game thread")?;

        ready_rx
            .recv()
            .context("Game thread exited during startup")??;

        Ok(Self {
            commands,
            thread: Some(thread),
        })
    }

    /// Applies one intent and returns the resulting snapshot
    pub fn apply(&self, intent: Intent) -> Result<Snapshot, HostError> {
        let (tx, rx) = mpsc::channel();
        self.send(Command::Apply(intent, tx))?;
        Ok(rx.recv().map_err(|_| HostError::Stopped)??)
    }

    pub fn snapshot(&self) -> Result<Snapshot, HostError> {
        let (tx, rx) = mpsc::channel();
        self.send(Command::Snapshot(tx))?;
        rx.recv().map_err(|_| HostError::Stopped)
    }

    fn send(&self, command: Command) -> Result<(), HostError> {
        self.commands.send(command).map_err(|_| HostError::Stopped)
    }

    fn run<B: MediaBackend>(game: &mut Game<B>, rx: mpsc::Receiver<Command>, tick: Duration) {
        loop {
            match rx.recv_timeout(tick) {
                Ok(Command::Apply(intent, reply)) => {
                    debug!("Applying {intent:?}");
                    let result = game.dispatch(intent);
                    game.tick();
                    let _ = reply.send(result.map(|()| game.snapshot()));
                }
                Ok(Command::Snapshot(reply)) => {
                    game.tick();
                    let _ = reply.send(game.snapshot());
                }
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => game.tick(),
            }
        }
    }
}

impl Drop for GameHost {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
