//! Engine-level failures.

use crate::store::StoreError;
use skillpath_core::SkillGraphError;
use skillpath_gen::PathwayError;

/// Errors surfaced by [`crate::PersonalizationEngine`] and [`crate::LearningService`].
///
/// Scoring problems never appear here; they are reported as
/// [`crate::ScoringWarning`]s on an otherwise successful result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Pathway(#[from] PathwayError),
    #[error(transparent)]
    Graph(#[from] SkillGraphError),
    #[error("collaborator store failed: {0}")]
    Store(#[from] StoreError),
}
