//! In-process facade for the surrounding course or dashboard service.

use crate::cache::ScoredPathway;
use crate::engine::PersonalizationEngine;
use crate::error::EngineError;
use skillpath_core::{SkillCorrection, SkillGraphError, SkillNode};
use skillpath_nav::shortest_path;
use std::collections::BTreeSet;

/// Administrative graph operations plus pathway and path queries.
///
/// Graph changes bump the graph revision, which makes every cached pathway stale on
/// its next access.
pub struct LearningService {
    engine: PersonalizationEngine,
}

impl LearningService {
    pub fn new(engine: PersonalizationEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &PersonalizationEngine {
        &self.engine
    }

    pub fn add_skill(&self, node: SkillNode) -> Result<(), SkillGraphError> {
        self.engine.graph().add_skill(node)
    }

    /// Fails with `SkillInUse` while any prerequisite edge references the skill.
    pub fn remove_skill(&self, id: &str) -> Result<SkillNode, SkillGraphError> {
        self.engine.graph().remove_skill(id)
    }

    pub fn correct_skill(
        &self,
        id: &str,
        correction: SkillCorrection,
    ) -> Result<(), SkillGraphError> {
        self.engine.graph().correct_skill(id, correction)
    }

    /// `to` will require `from`.
    pub fn add_prerequisite(&self, from: &str, to: &str) -> Result<(), SkillGraphError> {
        self.engine.graph().add_prerequisite(from, to)
    }

    /// Idempotent; returns whether an edge was removed.
    pub fn remove_prerequisite(&self, from: &str, to: &str) -> bool {
        self.engine.graph().remove_prerequisite(from, to)
    }

    pub fn get_prerequisites(&self, id: &str) -> Result<BTreeSet<String>, SkillGraphError> {
        self.engine.graph().read(|g| g.get_prerequisites(id))
    }

    pub fn get_learning_pathway(
        &self,
        student_id: &str,
        target_skill_id: &str,
        force_refresh: bool,
    ) -> Result<ScoredPathway, EngineError> {
        self.engine
            .get_learning_pathway(student_id, target_skill_id, force_refresh)
    }

    /// One shortest dependency chain from `from` to `to`, both ends included.
    pub fn get_skill_path(&self, from: &str, to: &str) -> Result<Vec<String>, SkillGraphError> {
        self.engine
            .graph()
            .read(|g| shortest_path(g, from, to))
            .map(|path| path.skills)
    }
}
