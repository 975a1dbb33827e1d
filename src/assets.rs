use crate::domain::{catalog::Song, stem::Stem};

/// Maps a song's stem to a loadable locator
pub trait AssetResolver {
    fn resolve(&self, playlist: &str, song: &Song, stem: Stem) -> String;
}

/// Resolves stems as `<base>/<stem>.<ext>`
#[derive(Debug, Clone)]
pub struct StemUrlResolver {
    pub extension: String,
}

impl StemUrlResolver {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl AssetResolver for StemUrlResolver {
    fn resolve(&self, _playlist: &str, song: &Song, stem: Stem) -> String {
        let base = song.base.trim_end_matches('/');
        let ext = self.extension.trim_start_matches('.');
        format!("{base}/{}.{ext}", stem.name())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        assets::{AssetResolver, StemUrlResolver},
        domain::{catalog::Song, stem::Stem},
    };

    fn song(base: &str) -> Song {
        Song::new("Alpha", base)
    }

    #[test]
    fn test_stem_url() {
        let resolver = StemUrlResolver::new("wav");

        let url = resolver.resolve("rock", &song("https://cdn.example/alpha"), Stem::Drums);

        assert_eq!(url, "https://cdn.example/alpha/drums.wav");
    }

    #[test]
    fn test_stem_url_trailing_slash() {
        let resolver = StemUrlResolver::new("wav");

        let url = resolver.resolve("rock", &song("https://cdn.example/alpha/"), Stem::Bass);

        assert_eq!(url, "https://cdn.example/alpha/bass.wav");
    }

    #[test]
    fn test_stem_url_dotted_extension() {
        let resolver = StemUrlResolver::new(".ogg");

        let url = resolver.resolve("local", &song("/music/stems/alpha"), Stem::Vocals);

        assert_eq!(url, "/music/stems/alpha/vocals.ogg");
    }
}
