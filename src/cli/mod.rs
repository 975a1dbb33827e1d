use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::assets::{AssetResolver, StemUrlResolver};
use crate::config::{self, AudioConfig};
use crate::domain::{catalog::Library, stem::Stem};
use crate::game::{Game, GameOptions};
use crate::host::GameHost;
use crate::http::server::HttpServer;
use crate::library;
use crate::media::open_backend;
use crate::player::StemPlayer;

#[derive(Parser)]
#[command(name = "stemguess")]
#[command(version = "0.1")]
#[command(about = "Guess the song from its stems")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the game with its http presenter
    Serve,
    /// List configured playlists
    Playlists,
    /// Print the stem locations of one song
    Stems {
        /// Playlist id
        playlist: String,
        /// Song title, as listed in the playlist
        title: String,
    },
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.to_string_lossy();
    let cfg = config::Config::load(&config_path)?;
    let library = library::load(&cfg.playlists, &cfg.audio.stem_extension)
        .context("Failed to load playlists")?;

    match &cli.command {
        Commands::Serve => {
            let playlist = startup_playlist(cfg.default_playlist.as_deref(), &library)?;
            let host = spawn_game(library.clone(), cfg.audio.clone(), playlist)?;
            let http_server = HttpServer::new(host, library, cfg.http);

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }

        Commands::Playlists => {
            for catalog in library.catalogs() {
                println!("{}: {} ({} songs)", catalog.id, catalog.name, catalog.len());
                for title in catalog.titles() {
                    println!("    - {title}");
                }
            }
        }

        Commands::Stems { playlist, title } => {
            let catalog = library.get(playlist)?;
            let song = catalog
                .get(title)
                .ok_or_else(|| anyhow!("song '{title}' not found in playlist '{playlist}'"))?;

            let resolver = StemUrlResolver::new(cfg.audio.stem_extension.as_str());
            for stem in Stem::ALL {
                println!("{stem}: {}", resolver.resolve(&catalog.id, song, stem));
            }
        }
    }

    Ok(())
}

/// Playlist the first round is dealt from
fn startup_playlist(configured: Option<&str>, library: &Library) -> anyhow::Result<String> {
    match configured {
        Some(id) => Ok(library.get(id)?.id.clone()),
        None => library
            .first()
            .map(|c| c.id.clone())
            .ok_or_else(|| anyhow!("no playlists configured")),
    }
}

fn spawn_game(library: Library, audio: AudioConfig, playlist: String) -> anyhow::Result<GameHost> {
    GameHost::spawn(audio.tick(), move || {
        let backend = open_backend(&audio)?;
        let player = StemPlayer::new(backend).with_drift_tolerance(audio.drift_tolerance());
        let options = GameOptions {
            resolver: Box::new(StemUrlResolver::new(audio.stem_extension.as_str())),
            ..Default::default()
        };

        let game = Game::new(library, player, &playlist, options)?;
        info!("Game ready on playlist '{playlist}'");
        Ok(game)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{Catalog, Song};

    fn library() -> Library {
        Library::new(vec![
            Catalog::new("rock", "Rock", vec![Song::new("Alpha", "/a")]).unwrap(),
            Catalog::new("jazz", "Jazz", vec![Song::new("Beta", "/b")]).unwrap(),
        ])
    }

    #[test]
    fn test_startup_playlist_defaults_to_first() -> anyhow::Result<()> {
        assert_eq!(startup_playlist(None, &library())?, "rock");
        assert_eq!(startup_playlist(Some("jazz"), &library())?, "jazz");
        Ok(())
    }

    #[test]
    fn test_startup_playlist_must_exist() {
        assert!(startup_playlist(Some("metal"), &library()).is_err());
        assert!(startup_playlist(None, &Library::default()).is_err());
    }

    #[test]
    fn test_cli_parses_stems_command() {
        let cli = Cli::parse_from(["stemguess", "-c", "game.toml", "stems", "rock", "Alpha"]);

        assert_eq!(cli.config, PathBuf::from("game.toml"));
        assert!(matches!(
            cli.command,
            Commands::Stems { ref playlist, ref title } if playlist == "rock" && title == "Alpha"
        ));
    }
}
