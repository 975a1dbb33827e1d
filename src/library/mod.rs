//! Builds the playlist [`Library`] from configuration

use log::info;

use crate::{
    config::PlaylistConfig,
    domain::catalog::{Catalog, CatalogError, Library},
};

pub mod fs;

/// Builds every configured playlist. Listed songs come first, then the
/// songs found under the playlist's `dir`.
pub fn load(playlists: &[PlaylistConfig], extension: &str) -> Result<Library, CatalogError> {
    let catalogs = playlists
        .iter()
        .map(|playlist| load_playlist(playlist, extension))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Library::new(catalogs))
}

fn load_playlist(playlist: &PlaylistConfig, extension: &str) -> Result<Catalog, CatalogError> {
    let mut songs = playlist.songs.clone();
    if let Some(dir) = &playlist.dir {
        songs.extend(fs::scan_dir(dir, extension)?);
    }
    if songs.is_empty() {
        return Err(CatalogError::Empty(playlist.id.clone()));
    }

    let catalog = Catalog::new(&playlist.id, &playlist.name, songs)?;
    info!("Loaded playlist '{}' with {} songs", catalog.id, catalog.len());
    Ok(catalog)
}
