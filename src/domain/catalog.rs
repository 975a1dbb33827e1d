use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("playlist '{playlist}' lists song '{title}' more than once")]
    DuplicateTitle { playlist: String, title: String },

    #[error("playlist '{0}' has no songs")]
    Empty(String),

    #[error("playlist '{0}' not found")]
    UnknownPlaylist(String),

    #[error("failed to scan playlist directory: {0}")]
    Scan(#[from] anyhow::Error),
}

/// A guessable song: its title and where its stems live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    /// Base locator, stems are found at `<base>/<stem>.<ext>`
    pub base: String,
}

impl Song {
    pub fn new(title: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            base: base.into(),
        }
    }
}

/// A playlist. Titles are unique and keep their configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub id: String,
    pub name: String,
    songs: Vec<Song>,
}

impl Catalog {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        songs: Vec<Song>,
    ) -> Result<Self, CatalogError> {
        let id = id.into();
        let mut seen = HashSet::new();
        for song in &songs {
            if !seen.insert(song.title.as_str()) {
                return Err(CatalogError::DuplicateTitle {
                    playlist: id,
                    title: song.title.clone(),
                });
            }
        }

        Ok(Self {
            id,
            name: name.into(),
            songs,
        })
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.songs.iter().map(|s| s.title.as_str())
    }

    pub fn get(&self, title: &str) -> Option<&Song> {
        self.songs.iter().find(|s| s.title == title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.get(title).is_some()
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

/// Every playlist the game can switch between
#[derive(Debug, Clone, Default)]
pub struct Library {
    catalogs: Vec<Catalog>,
}

impl Library {
    pub fn new(catalogs: Vec<Catalog>) -> Self {
        Self { catalogs }
    }

    pub fn get(&self, id: &str) -> Result<&Catalog, CatalogError> {
        self.catalogs
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CatalogError::UnknownPlaylist(id.to_string()))
    }

    pub fn catalogs(&self) -> &[Catalog] {
        &self.catalogs
    }

    pub fn first(&self) -> Option<&Catalog> {
        self.catalogs.first()
    }
}
