//! Structural queries over a skill graph snapshot.
//!
//! Provides shortest dependency chains ([`paths`]), deterministic topological
//! ordering of skill subsets ([`topo`]) and prerequisite closure with tiering
//! ([`closure`]). Every function here is read-only and takes `&SkillGraph`, so callers
//! decide which snapshot a multi-step query runs against.

pub mod closure;
pub mod paths;
pub mod topo;

pub use closure::{prerequisite_closure, tiers};
pub use paths::{SkillPath, shortest_path};
pub use topo::topological_order;
