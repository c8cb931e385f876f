//! Shortest dependency chains between two skills.

use serde::Serialize;
use skillpath_core::{SkillGraph, SkillGraphError};
use std::collections::{HashMap, VecDeque};

/// A dependency chain: each skill is a direct prerequisite of the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillPath {
    /// Skill IDs from the prerequisite end to the dependent end.
    pub skills: Vec<String>,
}

impl SkillPath {
    /// Returns the length of the path (number of edges).
    pub fn len(&self) -> usize {
        self.skills.len().saturating_sub(1)
    }

    /// Returns true if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

/// Find one shortest chain (by edge count) leading from `from` to `to`.
///
/// BFS along dependent edges, visiting neighbours in ascending id order. The first
/// parent recorded for a node is kept, so among equally short chains the result is
/// the one whose next skill has the lowest id at every step.
pub fn shortest_path(
    graph: &SkillGraph,
    from: &str,
    to: &str,
) -> Result<SkillPath, SkillGraphError> {
    for id in [from, to] {
        if !graph.contains(id) {
            return Err(SkillGraphError::UnknownSkill(id.to_string()));
        }
    }

    if from == to {
        return Ok(SkillPath {
            skills: vec![from.to_string()],
        });
    }

    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(from);
    parent.insert(from, from);

    while let Some(current) = queue.pop_front() {
        for next in graph.dependents(current) {
            if parent.contains_key(next) {
                continue;
            }
            parent.insert(next, current);
            if next == to {
                return Ok(SkillPath {
                    skills: unwind(&parent, from, to),
                });
            }
            queue.push_back(next);
        }
    }

    Err(SkillGraphError::NoPathExists {
        from: from.to_string(),
        to: to.to_string(),
    })
}

fn unwind(parent: &HashMap<&str, &str>, from: &str, to: &str) -> Vec<String> {
    let mut skills = vec![to.to_string()];
    let mut cursor = to;
    while cursor != from {
        match parent.get(cursor) {
            Some(&prev) => {
                skills.push(prev.to_string());
                cursor = prev;
            }
            None => break,
        }
    }
    skills.reverse();
    skills
}
