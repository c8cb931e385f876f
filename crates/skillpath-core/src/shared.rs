//! Copy-on-write handle for sharing one skill graph between threads.
//!
//! Readers take an `Arc<SkillGraph>` snapshot and keep it for as long as a
//! multi-call read needs a consistent view. Writers are serialized by the lock and
//! swap in the mutated graph in one step, so a snapshot never observes a partial edit.

use crate::error::SkillGraphError;
use crate::graph::{SkillCorrection, SkillGraph, SkillNode};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct SharedSkillGraph {
    current: RwLock<Arc<SkillGraph>>,
}

impl SharedSkillGraph {
    pub fn new(graph: SkillGraph) -> Self {
        Self {
            current: RwLock::new(Arc::new(graph)),
        }
    }

    /// A consistent, immutable view of the graph as of now.
    pub fn snapshot(&self) -> Arc<SkillGraph> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Run a read-only closure against the current graph.
    pub fn read<T>(&self, f: impl FnOnce(&SkillGraph) -> T) -> T {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run a mutation under the write lock.
    ///
    /// The graph is cloned only if a snapshot is still held elsewhere. Graph mutations
    /// validate before writing, so an error leaves the published graph unchanged and a
    /// poisoned lock can be recovered safely.
    pub fn mutate<T>(
        &self,
        f: impl FnOnce(&mut SkillGraph) -> Result<T, SkillGraphError>,
    ) -> Result<T, SkillGraphError> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let graph = Arc::make_mut(&mut guard);
        f(graph)
    }

    pub fn revision(&self) -> u64 {
        self.read(|g| g.revision)
    }

    pub fn add_skill(&self, node: SkillNode) -> Result<(), SkillGraphError> {
        let id = node.id.clone();
        self.mutate(|g| g.add_skill(node))?;
        info!(skill = %id, "skill added");
        Ok(())
    }

    pub fn remove_skill(&self, id: &str) -> Result<SkillNode, SkillGraphError> {
        let node = self.mutate(|g| g.remove_skill(id))?;
        info!(skill = %id, "skill removed");
        Ok(node)
    }

    pub fn correct_skill(
        &self,
        id: &str,
        correction: SkillCorrection,
    ) -> Result<(), SkillGraphError> {
        self.mutate(|g| g.correct_skill(id, correction))?;
        info!(
            skill = %id,
            level = ?correction.level,
            effort = ?correction.effort,
            "skill corrected"
        );
        Ok(())
    }

    pub fn add_prerequisite(&self, from: &str, to: &str) -> Result<(), SkillGraphError> {
        self.mutate(|g| g.add_prerequisite(from, to))
            .inspect_err(|e| debug!(from, to, error = %e, "prerequisite rejected"))?;
        info!(from, to, "prerequisite added");
        Ok(())
    }

    /// Idempotent; returns whether an edge was removed.
    pub fn remove_prerequisite(&self, from: &str, to: &str) -> bool {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if !guard.has_edge(from, to) {
            return false;
        }
        let removed = Arc::make_mut(&mut guard).remove_prerequisite(from, to);
        info!(from, to, "prerequisite removed");
        removed
    }
}

impl From<SkillGraph> for SharedSkillGraph {
    fn from(graph: SkillGraph) -> Self {
        Self::new(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_chain() -> SharedSkillGraph {
        let shared = SharedSkillGraph::default();
        for id in ["A", "B", "C"] {
            shared.add_skill(SkillNode::new(id, id, 0, 1.0)).unwrap();
        }
        shared.add_prerequisite("A", "B").unwrap();
        shared.add_prerequisite("B", "C").unwrap();
        shared
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let shared = shared_chain();
        let before = shared.snapshot();
        shared.remove_prerequisite("B", "C");

        assert!(before.has_edge("B", "C"));
        assert!(!shared.snapshot().has_edge("B", "C"));
        assert!(shared.revision() > before.revision);
    }

    #[test]
    fn test_failed_write_publishes_nothing() {
        let shared = shared_chain();
        let revision = shared.revision();
        assert!(shared.add_prerequisite("C", "A").is_err());
        assert_eq!(shared.revision(), revision);
        assert!(shared.snapshot().get_prerequisites("A").unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let shared = shared_chain();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        let snap = shared.snapshot();
                        // Every published graph holds the A -> B edge.
                        assert!(snap.has_edge("A", "B"));
                    }
                });
            }
            scope.spawn(|| {
                for i in 0..50 {
                    let id = format!("X{i}");
                    shared.add_skill(SkillNode::new(&id, &id, 0, 1.0)).unwrap();
                    shared.add_prerequisite("C", &id).unwrap();
                }
            });
        });
        assert_eq!(shared.snapshot().skill_count(), 53);
    }
}
