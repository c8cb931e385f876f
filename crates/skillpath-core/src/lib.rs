//! Core types for the skillpath learning-pathway engine.
//!
//! Provides the prerequisite DAG ([`graph::SkillGraph`]), the error taxonomy shared by
//! every layer, the copy-on-write handle used for concurrent access
//! ([`shared::SharedSkillGraph`]) and workspace configuration.

pub mod config;
pub mod error;
pub mod graph;
pub mod shared;

pub use error::SkillGraphError;
pub use graph::{PrerequisiteEdge, SkillCorrection, SkillGraph, SkillNode};
pub use shared::SharedSkillGraph;
