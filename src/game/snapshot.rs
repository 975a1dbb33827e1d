use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

use crate::{
    domain::stem::Stem,
    game::{GuessRecord, Outcome},
};

/// Per-stem view for the presenter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StemStatus {
    pub stem: Stem,
    pub revealed: bool,
    pub loaded: bool,
    pub errored: bool,
}

/// Everything the presenter needs to render the game
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub playlist: String,
    pub playlist_name: String,
    pub revealed: Vec<Stem>,
    pub stems: Vec<StemStatus>,
    pub playing: bool,
    pub attempts_remaining: u8,
    #[serde(serialize_with = "as_secs")]
    pub elapsed: Duration,
    #[serde(serialize_with = "as_secs")]
    pub position: Duration,
    #[serde(serialize_with = "as_opt_secs")]
    pub duration: Option<Duration>,
    pub position_label: String,
    pub duration_label: String,
    pub started_at: DateTime<Local>,
    pub history: Vec<GuessRecord>,
    pub outcome: Outcome,
    /// Only present once the round is over
    pub answer: Option<String>,
    pub feedback: Option<String>,
    pub guess_text: String,
    pub suggestions: Vec<String>,
}

/// Formats a duration as `m:ss`
pub fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub(crate) fn as_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

pub(crate) fn as_opt_secs<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_some(&d.as_secs_f64()),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::ZERO), "0:00");
        assert_eq!(format_clock(Duration::from_millis(65_900)), "1:05");
        assert_eq!(format_clock(Duration::from_secs(600)), "10:00");
    }
}
