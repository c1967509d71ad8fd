use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The five moods a journal entry can record. Stored and sent over the wire
/// as the lowercase code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MoodCode {
    Happy,
    Neutral,
    Sad,
    Stressed,
    Excited,
}

impl MoodCode {
    /// Display order used by the mood pickers.
    pub const ALL: [MoodCode; 5] = [
        MoodCode::Happy,
        MoodCode::Neutral,
        MoodCode::Sad,
        MoodCode::Stressed,
        MoodCode::Excited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodCode::Happy => "happy",
            MoodCode::Neutral => "neutral",
            MoodCode::Sad => "sad",
            MoodCode::Stressed => "stressed",
            MoodCode::Excited => "excited",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            MoodCode::Happy => "🙂",
            MoodCode::Neutral => "😐",
            MoodCode::Sad => "😞",
            MoodCode::Stressed => "😰",
            MoodCode::Excited => "🤩",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MoodCode::Happy => "Happy",
            MoodCode::Neutral => "Neutral",
            MoodCode::Sad => "Sad",
            MoodCode::Stressed => "Stressed",
            MoodCode::Excited => "Excited",
        }
    }

    pub fn display(&self) -> MoodDisplay {
        MoodDisplay {
            code: *self,
            glyph: self.glyph(),
            label: self.label(),
        }
    }
}

impl fmt::Display for MoodCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown mood: {0}")]
pub struct UnknownMood(pub String);

impl FromStr for MoodCode {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoodCode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

/// Glyph/label pair shown for a mood.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MoodDisplay {
    pub code: MoodCode,
    pub glyph: &'static str,
    pub label: &'static str,
}
