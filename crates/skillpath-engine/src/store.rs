//! Collaborator interfaces: mastery, preference and completion-history stores.
//!
//! The engine reads these; it never writes mastery or preferences back. An in-memory
//! implementation backs tests and embedded use.

use dashmap::DashMap;
use skillpath_gen::StudentPreferences;
use std::collections::{BTreeSet, HashMap};

/// Failure reported by a collaborator store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown student: {0}")]
    UnknownStudent(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Progress tracking owned by another service.
pub trait MasteryStore: Send + Sync {
    /// Skills the student has achieved.
    fn get_mastered_skills(&self, student_id: &str) -> Result<BTreeSet<String>, StoreError>;

    /// Mastery score in [0, 1] for one skill; 0.0 when never attempted.
    fn get_mastery_score(&self, student_id: &str, skill_id: &str) -> Result<f64, StoreError>;
}

pub trait PreferenceStore: Send + Sync {
    fn get_preferences(&self, student_id: &str) -> Result<StudentPreferences, StoreError>;
}

/// Optional source of completion rates for previously assigned pathway shapes.
pub trait HistoryStore: Send + Sync {
    /// Completion rate in [0, 1] for pathways with this shape signature, if any is known.
    fn get_completion_history(
        &self,
        student_id: &str,
        shape_signature: &str,
    ) -> Result<Option<f64>, StoreError>;
}

/// Thread-safe in-memory store implementing all three collaborator traits.
///
/// Students without recorded mastery have mastered nothing; students without
/// recorded preferences get the defaults.
#[derive(Debug, Default)]
pub struct MemoryStore {
    mastery: DashMap<String, HashMap<String, f64>>,
    preferences: DashMap<String, StudentPreferences>,
    history: DashMap<(String, String), f64>,
}

impl MemoryStore {
    /// Skills scoring at or above this are reported as mastered.
    pub const MASTERY_THRESHOLD: f64 = 0.8;

    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mastery score, replacing any previous one.
    pub fn set_mastery(&self, student_id: &str, skill_id: &str, score: f64) {
        self.mastery
            .entry(student_id.to_string())
            .or_default()
            .insert(skill_id.to_string(), score.clamp(0.0, 1.0));
    }

    /// Mark a skill fully mastered.
    pub fn master(&self, student_id: &str, skill_id: &str) {
        self.set_mastery(student_id, skill_id, 1.0);
    }

    /// Forget a student's progress on one skill. Returns whether anything was recorded.
    pub fn forget(&self, student_id: &str, skill_id: &str) -> bool {
        self.mastery
            .get_mut(student_id)
            .is_some_and(|mut scores| scores.remove(skill_id).is_some())
    }

    pub fn set_preferences(&self, student_id: &str, preferences: StudentPreferences) {
        self.preferences.insert(student_id.to_string(), preferences);
    }

    pub fn set_completion_rate(&self, student_id: &str, shape_signature: &str, rate: f64) {
        self.history.insert(
            (student_id.to_string(), shape_signature.to_string()),
            rate.clamp(0.0, 1.0),
        );
    }
}

impl MasteryStore for MemoryStore {
    fn get_mastered_skills(&self, student_id: &str) -> Result<BTreeSet<String>, StoreError> {
        Ok(self
            .mastery
            .get(student_id)
            .map(|scores| {
                scores
                    .iter()
                    .filter(|&(_, &score)| score >= Self::MASTERY_THRESHOLD)
                    .map(|(skill, _)| skill.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_mastery_score(&self, student_id: &str, skill_id: &str) -> Result<f64, StoreError> {
        Ok(self
            .mastery
            .get(student_id)
            .and_then(|scores| scores.get(skill_id).copied())
            .unwrap_or(0.0))
    }
}

impl PreferenceStore for MemoryStore {
    fn get_preferences(&self, student_id: &str) -> Result<StudentPreferences, StoreError> {
        Ok(self
            .preferences
            .get(student_id)
            .map(|p| *p)
            .unwrap_or_default())
    }
}

impl HistoryStore for MemoryStore {
    fn get_completion_history(
        &self,
        student_id: &str,
        shape_signature: &str,
    ) -> Result<Option<f64>, StoreError> {
        let key = (student_id.to_string(), shape_signature.to_string());
        Ok(self.history.get(&key).map(|rate| *rate))
    }
}
