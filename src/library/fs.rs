//! Module to discover songs in a directory of stem folders

use anyhow::anyhow;
use log::{debug, warn};
use walkdir::WalkDir;

use std::path::Path;

use crate::domain::{
    catalog::{CatalogError, Song},
    stem::Stem,
};

/// True when `dir` holds a file for every stem, e.g. `bass.wav` .. `vocals.wav`
pub fn is_stem_dir(dir: &Path, extension: &str) -> bool {
    let extension = extension.trim_start_matches('.');
    Stem::ALL
        .iter()
        .all(|stem| dir.join(format!("{stem}.{extension}")).is_file())
}

/// Recursively scans `root` for stem folders. Each one becomes a song titled
/// after the folder, in sorted path order.
pub fn scan_dir(root: &Path, extension: &str) -> Result<Vec<Song>, CatalogError> {
    if !root.is_dir() {
        return Err(CatalogError::Scan(anyhow!(
            "{} is not a directory",
            root.display()
        )));
    }
    let root_str = root.to_string_lossy();

    let songs = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("error while scanning dir {root_str}, skipping an entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_dir() && is_stem_dir(e.path(), extension))
        .map(|e| {
            let title = e.file_name().to_string_lossy().into_owned();
            debug!("Found stems for '{title}' at {}", e.path().display());
            Song::new(title, e.path().to_string_lossy())
        })
        .collect();

    Ok(songs)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn stem_dir(root: &Path, name: &str, ext: &str) -> anyhow::Result<()> {
        let dir = root.join(name);
        fs::create_dir_all(&dir)?;
        for stem in Stem::ALL {
            fs::write(dir.join(format!("{stem}.{ext}")), b"riff")?;
        }
        Ok(())
    }

    #[test]
    fn scan_finds_complete_stem_folders_in_order() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        stem_dir(tmp.path(), "Zulu", "wav")?;
        stem_dir(tmp.path(), "Alpha", "wav")?;
        stem_dir(tmp.path(), "Mike", "wav")?;

        let songs = scan_dir(tmp.path(), "wav")?;

        let titles: Vec<_> = songs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Mike", "Zulu"]);
        assert_eq!(songs[0].base, tmp.path().join("Alpha").to_string_lossy());
        Ok(())
    }

    #[test]
    fn scan_skips_incomplete_folders_and_other_extensions() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        stem_dir(tmp.path(), "Complete", "wav")?;
        stem_dir(tmp.path(), "Mp3Only", "mp3")?;

        let partial = tmp.path().join("Partial");
        fs::create_dir_all(&partial)?;
        fs::write(partial.join("bass.wav"), b"riff")?;
        fs::write(partial.join("drums.wav"), b"riff")?;
        fs::write(tmp.path().join("notes.txt"), b"ignore me")?;

        let songs = scan_dir(tmp.path(), ".wav")?;

        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "Complete");
        Ok(())
    }

    #[test]
    fn scan_descends_into_nested_folders() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        stem_dir(&tmp.path().join("artist"), "Deep Cut", "wav")?;

        let songs = scan_dir(tmp.path(), "wav")?;

        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "Deep Cut");
        Ok(())
    }

    #[test]
    fn scan_of_missing_root_fails() {
        let tmp = TempDir::new().unwrap();
        let result = scan_dir(&tmp.path().join("nope"), "wav");
        assert!(matches!(result, Err(CatalogError::Scan(_))));
    }
}
