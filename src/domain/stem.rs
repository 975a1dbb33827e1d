use std::{
    fmt::Display,
    ops::{Index, IndexMut},
};

use serde::{Deserialize, Serialize};

/// Number of stems every song is split into
pub const NUM_STEMS: usize = 4;

/// One isolated layer of a song's mix.
///
/// The declaration order is the reveal order: bass first, vocals last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stem {
    Bass = 0,
    Drums = 1,
    Other = 2,
    Vocals = 3,
}

impl Stem {
    /// All stems in reveal order
    pub const ALL: [Stem; NUM_STEMS] = [Stem::Bass, Stem::Drums, Stem::Other, Stem::Vocals];

    pub fn index(self) -> usize {
        self as usize
    }

    /// File stem used for the asset of this layer, e.g. `bass` in `bass.wav`
    pub fn name(self) -> &'static str {
        match self {
            Stem::Bass => "bass",
            Stem::Drums => "drums",
            Stem::Other => "other",
            Stem::Vocals => "vocals",
        }
    }

    /// Stems revealed once `count` of them are unlocked
    pub fn prefix(count: usize) -> &'static [Stem] {
        &Self::ALL[..count.min(NUM_STEMS)]
    }
}

impl Display for Stem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One value per stem, stored inline.
///
/// Used instead of name-keyed maps so that every stem always has an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerStem<T>([T; NUM_STEMS]);

impl<T> PerStem<T> {
    pub fn iter(&self) -> impl Iterator<Item = (Stem, &T)> {
        Stem::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<Stem> for PerStem<T> {
    type Output = T;

    fn index(&self, stem: Stem) -> &T {
        &self.0[stem.index()]
    }
}

impl<T> IndexMut<Stem> for PerStem<T> {
    fn index_mut(&mut self, stem: Stem) -> &mut T {
        &mut self.0[stem.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveal_order_is_bass_drums_other_vocals() {
        let names: Vec<_> = Stem::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["bass", "drums", "other", "vocals"]);
        assert_eq!(Stem::ALL.map(Stem::index), [0, 1, 2, 3]);
    }

    #[test]
    fn prefix_is_capped_at_stem_count() {
        assert_eq!(Stem::prefix(1), &[Stem::Bass]);
        assert_eq!(Stem::prefix(9).len(), NUM_STEMS);
    }

    #[test]
    fn per_stem_indexing() {
        let mut flags: PerStem<bool> = PerStem::default();
        flags[Stem::Drums] = true;
        assert!(flags[Stem::Drums]);
        assert!(!flags[Stem::Bass]);

        flags[Stem::Vocals] = true;
        let set: Vec<_> = flags.iter().filter(|(_, f)| **f).map(|(s, _)| s).collect();
        assert_eq!(set, vec![Stem::Drums, Stem::Vocals]);
    }
}
