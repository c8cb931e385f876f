//! # skillpath-engine
//!
//! Personalized learning pathways: wraps [`skillpath_gen::PathwayGenerator`] with
//! scoring, a per-student cache and single-flight generation, and exposes the whole
//! system to an embedding application through [`LearningService`].
//!
//! Mastery, preferences and completion history come from collaborator stores
//! ([`MasteryStore`], [`PreferenceStore`], [`HistoryStore`]); this crate only reads them.

pub mod cache;
pub mod engine;
pub mod error;
pub mod scoring;
pub mod service;
pub mod store;

pub use cache::{CacheKey, CacheStats, PathwayCache, ScoredPathway, mastery_hash};
pub use engine::PersonalizationEngine;
pub use error::EngineError;
pub use scoring::{HeuristicScorer, PathwayScorer, ScoringContext, ScoringError, ScoringWarning};
pub use service::LearningService;
pub use store::{HistoryStore, MasteryStore, MemoryStore, PreferenceStore, StoreError};
