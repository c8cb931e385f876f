//! Learning pathway value types.
//!
//! A pathway never mutates after generation; a new request produces a new value.

use crate::preferences::StudentPreferences;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Presentation hint for a checkpoint. Never affects skill order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Video,
    Reading,
    Exercise,
    Assessment,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Reading => "reading",
            Self::Exercise => "exercise",
            Self::Assessment => "assessment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    /// Introduces new skills.
    Learning,
    /// Verifies mastery of the skills learned since the previous assessment.
    Assessment,
}

/// A grouped unit of pathway work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Position within the pathway, starting at 0.
    pub index: usize,
    pub kind: CheckpointKind,
    /// Skills taught (learning) or verified (assessment), in pathway order.
    pub skills: Vec<String>,
    pub activity: ActivityType,
    /// Estimated duration in effort units.
    pub estimated_duration: f64,
    /// Highest dependency tier among `skills`.
    pub tier: usize,
}

impl Checkpoint {
    pub fn is_assessment(&self) -> bool {
        self.kind == CheckpointKind::Assessment
    }
}

/// Non-fatal conditions reported alongside a pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathwayNotice {
    /// Every required skill is already mastered; the pathway is empty.
    TargetAlreadyMastered,
}

/// Ordered, checkpointed curriculum towards one or more target skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPathway {
    /// Target skill IDs, ascending.
    pub targets: Vec<String>,
    pub preferences: StudentPreferences,
    pub checkpoints: Vec<Checkpoint>,
    /// Sum of effort over learning checkpoints.
    pub total_effort: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<PathwayNotice>,
}

/// Coarse structural summary used to look up completion history for similar pathways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PathwayShape {
    pub learning_checkpoints: usize,
    pub assessments: usize,
    pub skills: usize,
    /// `ceil(total_effort)`, so pathways of similar size share a bucket.
    pub effort_bucket: u64,
}

impl PathwayShape {
    /// Compact key, e.g. `cp3-as2-sk5-ef6`.
    pub fn signature(&self) -> String {
        format!(
            "cp{}-as{}-sk{}-ef{}",
            self.learning_checkpoints, self.assessments, self.skills, self.effort_bucket
        )
    }
}

impl LearningPathway {
    /// The empty pathway returned when the targets need no further work.
    pub fn already_mastered(targets: Vec<String>, preferences: StudentPreferences) -> Self {
        Self {
            targets,
            preferences,
            checkpoints: Vec::new(),
            total_effort: 0.0,
            notice: Some(PathwayNotice::TargetAlreadyMastered),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn learning_checkpoints(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter().filter(|c| !c.is_assessment())
    }

    pub fn assessments(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter().filter(|c| c.is_assessment())
    }

    /// Skills in the order they are taught.
    pub fn skill_order(&self) -> Vec<&str> {
        self.learning_checkpoints()
            .flat_map(|c| c.skills.iter().map(String::as_str))
            .collect()
    }

    /// Position of `skill` in the taught order, if it is part of the pathway.
    pub fn position_of(&self, skill: &str) -> Option<usize> {
        self.skill_order().iter().position(|s| *s == skill)
    }

    pub fn shape(&self) -> PathwayShape {
        PathwayShape {
            learning_checkpoints: self.learning_checkpoints().count(),
            assessments: self.assessments().count(),
            skills: self.learning_checkpoints().map(|c| c.skills.len()).sum(),
            effort_bucket: self.total_effort.max(0.0).ceil() as u64,
        }
    }

    /// SHA-256 over the full pathway content. Equal pathways have equal fingerprints.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for target in &self.targets {
            hasher.update(target.as_bytes());
            hasher.update([0]);
        }
        hasher.update(self.preferences.fingerprint().as_bytes());
        for checkpoint in &self.checkpoints {
            hasher.update(checkpoint.index.to_le_bytes());
            hasher.update(checkpoint.activity.as_str().as_bytes());
            hasher.update(checkpoint.tier.to_le_bytes());
            hasher.update(checkpoint.estimated_duration.to_bits().to_le_bytes());
            for skill in &checkpoint.skills {
                hasher.update(skill.as_bytes());
                hasher.update([0]);
            }
            hasher.update([1]);
        }
        hasher.update(self.total_effort.to_bits().to_le_bytes());
        format!("{:x}", hasher.finalize())
    }
}
