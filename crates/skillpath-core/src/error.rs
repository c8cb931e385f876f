//! Structural errors raised by skill graph operations.

/// Errors from skill graph mutations and queries.
///
/// Every variant is a caller error: the graph is left untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkillGraphError {
    #[error("unknown skill: {0}")]
    UnknownSkill(String),
    #[error("skill already exists: {0}")]
    DuplicateSkill(String),
    #[error("prerequisite cycle detected: {}", skills.join(" -> "))]
    CycleDetected { skills: Vec<String> },
    #[error("skill {skill} is referenced by {edges} prerequisite edge(s)")]
    SkillInUse { skill: String, edges: usize },
    #[error("no dependency path from {from} to {to}")]
    NoPathExists { from: String, to: String },
    #[error("invalid skill {id}: {reason}")]
    InvalidSkill { id: String, reason: String },
}
