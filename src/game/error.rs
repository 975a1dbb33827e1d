use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("cannot start a round: playlist '{0}' has no songs")]
    EmptyCatalog(String),

    #[error("playlist '{0}' not found")]
    UnknownPlaylist(String),
}
