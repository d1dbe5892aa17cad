use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Names the input interpreter bound to a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeTag {
    #[default]
    Freeplay,
    Test,
    SoundSelect,
}

impl ModeTag {
    pub const ALL: [ModeTag; 3] = [ModeTag::Freeplay, ModeTag::Test, ModeTag::SoundSelect];

    pub fn as_str(self) -> &'static str {
        match self {
            ModeTag::Freeplay => "freeplay",
            ModeTag::Test => "test",
            ModeTag::SoundSelect => "soundselect",
        }
    }
}

impl fmt::Display for ModeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a mode name does not match any known mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeTagError {
    pub name: String,
}

impl fmt::Display for ParseModeTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mode '{}'", self.name)
    }
}

impl std::error::Error for ParseModeTagError {}

impl FromStr for ModeTag {
    type Err = ParseModeTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "freeplay" => Ok(ModeTag::Freeplay),
            "test" => Ok(ModeTag::Test),
            "soundselect" | "sound_select" => Ok(ModeTag::SoundSelect),
            _ => Err(ParseModeTagError {
                name: s.to_string(),
            }),
        }
    }
}
