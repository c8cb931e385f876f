//! Pathway request failures.

use skillpath_core::SkillGraphError;

/// Errors from pathway generation.
///
/// `EmptyTargetSet` and `UnknownTargetSkill` are request-validation failures raised before
/// any graph work. `InvalidSkillGraph` means the graph violated its own invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathwayError {
    #[error("no target skills given")]
    EmptyTargetSet,
    #[error("unknown target skill: {0}")]
    UnknownTargetSkill(String),
    #[error("skill graph integrity failure: {0}")]
    InvalidSkillGraph(#[source] SkillGraphError),
}
