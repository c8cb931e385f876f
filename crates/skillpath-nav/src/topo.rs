//! Deterministic topological ordering of skill subsets.

use skillpath_core::{SkillGraph, SkillGraphError};
use std::collections::{BTreeMap, BTreeSet};

/// Order `subset` so every skill follows its prerequisites within the subset.
///
/// Kahn's algorithm over the induced subgraph; prerequisites outside the subset are
/// ignored. Among skills whose constraints are all satisfied the lowest id goes first.
/// A leftover skill means the subset is inconsistent and yields `CycleDetected`.
pub fn topological_order<'a, I>(
    graph: &SkillGraph,
    subset: I,
) -> Result<Vec<String>, SkillGraphError>
where
    I: IntoIterator<Item = &'a str>,
{
    let members: BTreeSet<&str> = subset.into_iter().collect();
    for id in &members {
        if !graph.contains(id) {
            return Err(SkillGraphError::UnknownSkill((*id).to_string()));
        }
    }

    // in_degree[s] = number of s's prerequisites inside the subset.
    let mut in_degree: BTreeMap<&str, usize> = members
        .iter()
        .map(|&id| {
            let count = graph
                .prerequisites(id)
                .filter(|p| members.contains(p))
                .count();
            (id, count)
        })
        .collect();

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|&(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut order = Vec::with_capacity(members.len());
    while let Some(id) = ready.pop_first() {
        order.push(id.to_string());
        for dependent in graph.dependents(id) {
            if let Some(deg) = in_degree.get_mut(dependent) {
                *deg = deg.saturating_sub(1);
                if *deg == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }

    if order.len() != members.len() {
        let emitted: BTreeSet<&str> = order.iter().map(String::as_str).collect();
        let skills = members
            .iter()
            .filter(|id| !emitted.contains(*id))
            .map(|id| (*id).to_string())
            .collect();
        return Err(SkillGraphError::CycleDetected { skills });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillpath_core::SkillNode;

    fn graph_with(ids: &[&str], edges: &[(&str, &str)]) -> SkillGraph {
        let mut graph = SkillGraph::new();
        for id in ids {
            graph.add_skill(SkillNode::new(*id, *id, 0, 1.0)).unwrap();
        }
        for (from, to) in edges {
            graph.add_prerequisite(from, to).unwrap();
        }
        graph
    }

    #[test]
    fn test_chain_order() {
        let graph = graph_with(&["C", "B", "A"], &[("A", "B"), ("B", "C")]);
        let order = topological_order(&graph, ["C", "A", "B"]).unwrap();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        // Z and M are independent roots; both feed Q.
        let graph = graph_with(&["Z", "M", "Q", "A"], &[("Z", "Q"), ("M", "Q")]);
        let order = topological_order(&graph, ["Q", "Z", "M", "A"]).unwrap();
        assert_eq!(order, vec!["A", "M", "Z", "Q"]);
    }

    #[test]
    fn test_constraints_outside_subset_ignored() {
        let graph = graph_with(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let order = topological_order(&graph, ["C", "A"]).unwrap();
        // B is not in the subset, so A and C are unconstrained relative to each other.
        assert_eq!(order, vec!["A", "C"]);
    }

    #[test]
    fn test_unknown_member() {
        let graph = graph_with(&["A"], &[]);
        assert_eq!(
            topological_order(&graph, ["A", "nope"]).unwrap_err(),
            SkillGraphError::UnknownSkill("nope".into())
        );
    }

    #[test]
    fn test_empty_subset() {
        let graph = graph_with(&["A"], &[]);
        assert!(topological_order(&graph, []).unwrap().is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let graph = graph_with(&["A", "B"], &[("A", "B")]);
        let order = topological_order(&graph, ["B", "B", "A"]).unwrap();
        assert_eq!(order, vec!["A", "B"]);
    }
}
