//! # skillpath-gen
//!
//! Turns "current mastery → target skills" into an ordered, checkpointed
//! [`LearningPathway`].
//!
//! Generation is a pure function of the graph snapshot, the mastered-skill set, the
//! targets and the student's preferences:
//!
//! 1. Required set: prerequisite closure of the targets minus mastered skills
//! 2. Deterministic topological order of the required set (ascending-id ties)
//! 3. Effort-budgeted grouping into learning checkpoints, paced by preference
//! 4. Activity assignment from learning style (presentation only, never reorders)
//! 5. Assessment checkpoints at dependency-tier boundaries

pub mod error;
pub mod generator;
pub mod pathway;
pub mod preferences;

pub use error::PathwayError;
pub use generator::PathwayGenerator;
pub use pathway::{
    ActivityType, Checkpoint, CheckpointKind, LearningPathway, PathwayNotice, PathwayShape,
};
pub use preferences::{LearningStyle, Pace, StudentPreferences};
