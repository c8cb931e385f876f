//! Skill graph data model: skills (V) and prerequisite edges (E) forming a DAG.

use crate::error::SkillGraphError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const GRAPH_VERSION: &str = "1.0.0";

/// The prerequisite graph. Invariant: `edges` together with `skills` is acyclic.
///
/// Mutations validate first and write second, so a failed call never leaves a
/// partial edit behind.
#[derive(Debug, Clone, Serialize)]
pub struct SkillGraph {
    pub version: String,
    /// Bumped on every effective mutation. Snapshots compare revisions to detect change.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub metadata: GraphMetadata,
    pub skills: BTreeMap<String, SkillNode>,
    pub edges: Vec<PrerequisiteEdge>,
    /// skill → its direct prerequisites. Maintained by every edge mutation.
    #[serde(skip)]
    prerequisite_index: BTreeMap<String, BTreeSet<String>>,
    /// skill → skills that directly require it.
    #[serde(skip)]
    dependent_index: BTreeMap<String, BTreeSet<String>>,
}

/// Aggregate counts, recomputed after each mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub total_skills: usize,
    pub total_edges: usize,
    /// Skills with no prerequisites.
    pub root_skills: usize,
}

/// A learnable unit of competency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillNode {
    pub id: String,
    pub name: String,
    /// Difficulty ordinal (0 = introductory).
    pub level: u8,
    /// Estimated effort in abstract time units.
    pub effort: f64,
}

impl SkillNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: u8, effort: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            effort,
        }
    }
}

/// `to` requires `from`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrerequisiteEdge {
    pub from: String,
    pub to: String,
}

/// Correction of the fields that may change after a skill is referenced by an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SkillCorrection {
    pub level: Option<u8>,
    pub effort: Option<f64>,
}

fn validate_effort(id: &str, effort: f64) -> Result<(), SkillGraphError> {
    if !effort.is_finite() || effort < 0.0 {
        return Err(SkillGraphError::InvalidSkill {
            id: id.to_string(),
            reason: format!("effort must be a finite non-negative number, got {effort}"),
        });
    }
    Ok(())
}

impl Default for SkillGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: GRAPH_VERSION.to_string(),
            revision: 0,
            created_at: now,
            updated_at: now,
            metadata: GraphMetadata::default(),
            skills: BTreeMap::new(),
            edges: Vec::new(),
            prerequisite_index: BTreeMap::new(),
            dependent_index: BTreeMap::new(),
        }
    }

    /// Build a graph from bulk-loaded skills and edges, validating every insertion.
    ///
    /// Edges are added in the given order, so a cycle is reported on the edge that closes it.
    pub fn from_parts(
        skills: impl IntoIterator<Item = SkillNode>,
        edges: impl IntoIterator<Item = PrerequisiteEdge>,
    ) -> Result<Self, SkillGraphError> {
        let mut graph = Self::new();
        for skill in skills {
            graph.add_skill(skill)?;
        }
        for edge in edges {
            graph.add_prerequisite(&edge.from, &edge.to)?;
        }
        Ok(graph)
    }

    /// Recompute metadata and mark the graph as changed.
    fn touch(&mut self) {
        self.metadata.total_skills = self.skills.len();
        self.metadata.total_edges = self.edges.len();
        self.metadata.root_skills = self
            .skills
            .keys()
            .filter(|id| {
                self.prerequisite_index
                    .get(id.as_str())
                    .is_none_or(BTreeSet::is_empty)
            })
            .count();
        self.revision += 1;
        self.updated_at = Utc::now();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.skills.contains_key(id)
    }

    pub fn get_skill(&self, id: &str) -> Option<&SkillNode> {
        self.skills.get(id)
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.prerequisite_index
            .get(to)
            .is_some_and(|prereqs| prereqs.contains(from))
    }

    /// Direct prerequisites of `id`, ascending. Empty for unknown skills.
    pub fn prerequisites(&self, id: &str) -> impl Iterator<Item = &str> {
        self.prerequisite_index
            .get(id)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Skills that directly require `id`, ascending. Empty for unknown skills.
    pub fn dependents(&self, id: &str) -> impl Iterator<Item = &str> {
        self.dependent_index
            .get(id)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Number of edges touching `id` in either direction.
    pub fn degree(&self, id: &str) -> usize {
        self.prerequisites(id).count() + self.dependents(id).count()
    }

    /// Insert a new skill.
    pub fn add_skill(&mut self, node: SkillNode) -> Result<(), SkillGraphError> {
        if node.id.trim().is_empty() {
            return Err(SkillGraphError::InvalidSkill {
                id: node.id,
                reason: "id must not be empty".to_string(),
            });
        }
        validate_effort(&node.id, node.effort)?;
        if self.skills.contains_key(&node.id) {
            return Err(SkillGraphError::DuplicateSkill(node.id));
        }
        self.skills.insert(node.id.clone(), node);
        self.touch();
        Ok(())
    }

    /// Remove a skill that no edge references. Edges must be removed first.
    pub fn remove_skill(&mut self, id: &str) -> Result<SkillNode, SkillGraphError> {
        if !self.skills.contains_key(id) {
            return Err(SkillGraphError::UnknownSkill(id.to_string()));
        }
        let edges = self.degree(id);
        if edges > 0 {
            return Err(SkillGraphError::SkillInUse {
                skill: id.to_string(),
                edges,
            });
        }
        let node = self
            .skills
            .remove(id)
            .ok_or_else(|| SkillGraphError::UnknownSkill(id.to_string()))?;
        self.prerequisite_index.remove(id);
        self.dependent_index.remove(id);
        self.touch();
        Ok(node)
    }

    /// Apply an effort/level correction. Name and id stay fixed.
    pub fn correct_skill(
        &mut self,
        id: &str,
        correction: SkillCorrection,
    ) -> Result<(), SkillGraphError> {
        if let Some(effort) = correction.effort {
            validate_effort(id, effort)?;
        }
        let node = self
            .skills
            .get_mut(id)
            .ok_or_else(|| SkillGraphError::UnknownSkill(id.to_string()))?;
        if let Some(level) = correction.level {
            node.level = level;
        }
        if let Some(effort) = correction.effort {
            node.effort = effort;
        }
        self.touch();
        Ok(())
    }

    /// Record that `to` requires `from`.
    ///
    /// Before inserting, searches from `to` along dependent edges; reaching `from`
    /// means the new edge would close a cycle. Re-adding an existing edge is a no-op.
    pub fn add_prerequisite(&mut self, from: &str, to: &str) -> Result<(), SkillGraphError> {
        for id in [from, to] {
            if !self.skills.contains_key(id) {
                return Err(SkillGraphError::UnknownSkill(id.to_string()));
            }
        }
        if from == to {
            return Err(SkillGraphError::CycleDetected {
                skills: vec![from.to_string(), to.to_string()],
            });
        }
        if self.has_edge(from, to) {
            return Ok(());
        }
        if let Some(chain) = self.dependent_chain(to, from) {
            let mut skills = Vec::with_capacity(chain.len() + 1);
            skills.push(from.to_string());
            skills.extend(chain);
            return Err(SkillGraphError::CycleDetected { skills });
        }

        self.edges.push(PrerequisiteEdge {
            from: from.to_string(),
            to: to.to_string(),
        });
        self.prerequisite_index
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());
        self.dependent_index
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        self.touch();
        Ok(())
    }

    /// Remove the edge if present. Returns whether anything changed.
    pub fn remove_prerequisite(&mut self, from: &str, to: &str) -> bool {
        if !self.has_edge(from, to) {
            return false;
        }
        self.edges.retain(|e| !(e.from == from && e.to == to));
        if let Some(prereqs) = self.prerequisite_index.get_mut(to) {
            prereqs.remove(from);
            if prereqs.is_empty() {
                self.prerequisite_index.remove(to);
            }
        }
        if let Some(deps) = self.dependent_index.get_mut(from) {
            deps.remove(to);
            if deps.is_empty() {
                self.dependent_index.remove(from);
            }
        }
        self.touch();
        true
    }

    /// Direct prerequisites of a known skill (not the transitive closure).
    pub fn get_prerequisites(&self, id: &str) -> Result<BTreeSet<String>, SkillGraphError> {
        if !self.skills.contains_key(id) {
            return Err(SkillGraphError::UnknownSkill(id.to_string()));
        }
        Ok(self.prerequisites(id).map(str::to_string).collect())
    }

    /// Direct dependents of a known skill.
    pub fn get_dependents(&self, id: &str) -> Result<BTreeSet<String>, SkillGraphError> {
        if !self.skills.contains_key(id) {
            return Err(SkillGraphError::UnknownSkill(id.to_string()));
        }
        Ok(self.dependents(id).map(str::to_string).collect())
    }

    /// Depth-first search from `start` along dependent edges, returning the chain
    /// `start .. goal` if `goal` is reachable.
    fn dependent_chain(&self, start: &str, goal: &str) -> Option<Vec<String>> {
        let mut parent: BTreeMap<&str, &str> = BTreeMap::new();
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut stack = vec![start];
        visited.insert(start);

        while let Some(current) = stack.pop() {
            if current == goal {
                let mut chain = vec![goal.to_string()];
                let mut cursor = goal;
                while let Some(&prev) = parent.get(cursor) {
                    chain.push(prev.to_string());
                    cursor = prev;
                }
                chain.reverse();
                return Some(chain);
            }
            for next in self.dependents(current) {
                if visited.insert(next) {
                    parent.insert(next, current);
                    stack.push(next);
                }
            }
        }
        None
    }

    /// Whether `to` depends, directly or transitively, on `from`.
    pub fn depends_on(&self, to: &str, from: &str) -> bool {
        from != to && self.dependent_chain(from, to).is_some()
    }
}
