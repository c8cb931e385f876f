//! Per-request student preferences.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// How a student prefers to take in new material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStyle {
    Visual,
    Reading,
    PracticeHeavy,
    #[default]
    Mixed,
}

/// How much effort a student wants packed into one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Slow,
    #[default]
    Standard,
    Fast,
}

impl LearningStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Reading => "reading",
            Self::PracticeHeavy => "practice_heavy",
            Self::Mixed => "mixed",
        }
    }
}

impl Pace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Standard => "standard",
            Self::Fast => "fast",
        }
    }
}

/// Supplied with each pathway request; never persisted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StudentPreferences {
    pub style: LearningStyle,
    pub pace: Pace,
    /// Caps how many skills one learning checkpoint may group, regardless of effort.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_checkpoints_per_session: Option<usize>,
}

impl StudentPreferences {
    pub fn new(style: LearningStyle, pace: Pace) -> Self {
        Self {
            style,
            pace,
            max_checkpoints_per_session: None,
        }
    }

    #[must_use]
    pub fn with_session_cap(mut self, cap: usize) -> Self {
        self.max_checkpoints_per_session = Some(cap);
        self
    }

    /// Stable across processes, unlike `Hash`; used in cache keys.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.style.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(self.pace.as_str().as_bytes());
        hasher.update(b"|");
        if let Some(cap) = self.max_checkpoints_per_session {
            hasher.update(cap.to_le_bytes());
        }
        format!("{:x}", hasher.finalize())[..16].to_string()
    }
}
