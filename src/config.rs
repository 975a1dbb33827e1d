use anyhow::Context;
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

use crate::domain::catalog::Song;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub audio: AudioConfig,
    pub http: HttpConfig,
    /// Playlist used at startup, the first one when absent
    pub default_playlist: Option<String>,
    #[serde(default)]
    pub playlists: Vec<PlaylistConfig>,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AudioConfig {
    pub stem_extension: String,
    pub tick_ms: u64,
    pub drift_tolerance_ms: u64,
    /// Use the silent backend even when audio output is compiled in
    pub mute: bool,
}

impl AudioConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn drift_tolerance(&self) -> Duration {
        Duration::from_millis(self.drift_tolerance_ms)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            stem_extension: "wav".to_string(),
            tick_ms: 100,
            drift_tolerance_ms: 120,
            mute: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlaylistConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub songs: Vec<Song>,
    /// Directory of per-song stem folders, appended after `songs`
    pub dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_config_toml() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1
default_playlist = "local"

[audio]
stem_extension = "mp3"
tick_ms = 50
drift_tolerance_ms = 200
mute = true

[http]
bind_addr = "127.0.0.1"
port = 8080

[[playlists]]
id = "rock"
name = "Rock Classics"
songs = [
    { title = "Alpha", base = "https://cdn.example/rock/alpha" },
    { title = "Beta", base = "https://cdn.example/rock/beta" },
]

[[playlists]]
id = "local"
name = "On disk"
dir = "/music/stems"
"#;

        let cfg: Config = toml::from_str(toml_str)?;

        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.default_playlist.as_deref(), Some("local"));

        assert_eq!(cfg.audio.stem_extension, "mp3");
        assert_eq!(cfg.audio.tick(), Duration::from_millis(50));
        assert_eq!(cfg.audio.drift_tolerance(), Duration::from_millis(200));
        assert!(cfg.audio.mute);

        assert_eq!(cfg.playlists.len(), 2);
        assert_eq!(
            cfg.playlists[0].songs[1],
            Song::new("Beta", "https://cdn.example/rock/beta")
        );
        assert_eq!(cfg.playlists[0].dir, None);
        assert!(cfg.playlists[1].songs.is_empty());
        assert_eq!(cfg.playlists[1].dir, Some(PathBuf::from("/music/stems")));

        Ok(())
    }

    #[test]
    fn test_audio_section_is_optional() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[http]
bind_addr = "0.0.0.0"
port = 9000

[[playlists]]
id = "rock"
name = "Rock"
songs = [{ title = "Alpha", base = "/srv/alpha" }]
"#;

        let cfg: Config = toml::from_str(toml_str)?;

        assert_eq!(cfg.audio.stem_extension, "wav");
        assert_eq!(cfg.audio.tick(), Duration::from_millis(100));
        assert_eq!(cfg.audio.drift_tolerance(), Duration::from_millis(120));
        assert!(!cfg.audio.mute);
        assert_eq!(cfg.default_playlist, None);

        Ok(())
    }

    #[test]
    fn test_partial_audio_section_keeps_defaults() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[audio]
mute = true

[http]
bind_addr = "0.0.0.0"
port = 9000
"#;

        let cfg: Config = toml::from_str(toml_str)?;

        assert!(cfg.audio.mute);
        assert_eq!(cfg.audio.tick_ms, 100);
        assert!(cfg.playlists.is_empty());

        Ok(())
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
