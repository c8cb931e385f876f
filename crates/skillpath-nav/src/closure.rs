//! Transitive prerequisite closure and dependency tiers.

use skillpath_core::{SkillGraph, SkillGraphError};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Every skill needed to learn `targets`: the targets plus all transitive prerequisites.
pub fn prerequisite_closure<'a, I>(
    graph: &SkillGraph,
    targets: I,
) -> Result<BTreeSet<String>, SkillGraphError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut closure: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for target in targets {
        if !graph.contains(target) {
            return Err(SkillGraphError::UnknownSkill(target.to_string()));
        }
        if closure.insert(target.to_string()) {
            queue.push_back(target);
        }
    }

    while let Some(current) = queue.pop_front() {
        for prereq in graph.prerequisites(current) {
            if closure.insert(prereq.to_string()) {
                queue.push_back(prereq);
            }
        }
    }

    Ok(closure)
}

/// Assign each skill in `order` a tier: 0 when none of its direct prerequisites is in
/// `order`, otherwise one more than the highest tier among those prerequisites.
///
/// `order` must already be topological; a prerequisite seen after its dependent is
/// treated as absent.
pub fn tiers(graph: &SkillGraph, order: &[String]) -> HashMap<String, usize> {
    let mut tier_of: HashMap<String, usize> = HashMap::with_capacity(order.len());
    for skill in order {
        let tier = graph
            .prerequisites(skill)
            .filter_map(|p| tier_of.get(p))
            .max()
            .map_or(0, |t| t + 1);
        tier_of.insert(skill.clone(), tier);
    }
    tier_of
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillpath_core::SkillNode;

    /// A -> B -> D, A -> C -> D, E standalone
    fn diamond() -> SkillGraph {
        let mut graph = SkillGraph::new();
        for id in ["A", "B", "C", "D", "E"] {
            graph.add_skill(SkillNode::new(id, id, 0, 1.0)).unwrap();
        }
        for (from, to) in [("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")] {
            graph.add_prerequisite(from, to).unwrap();
        }
        graph
    }

    #[test]
    fn test_closure_includes_target_and_ancestors() {
        let graph = diamond();
        let closure = prerequisite_closure(&graph, ["D"]).unwrap();
        assert_eq!(
            closure.into_iter().collect::<Vec<_>>(),
            vec!["A", "B", "C", "D"]
        );
    }

    #[test]
    fn test_closure_union_of_targets() {
        let graph = diamond();
        let closure = prerequisite_closure(&graph, ["B", "E"]).unwrap();
        assert_eq!(closure.into_iter().collect::<Vec<_>>(), vec!["A", "B", "E"]);
    }

    #[test]
    fn test_closure_unknown_target() {
        let graph = diamond();
        assert_eq!(
            prerequisite_closure(&graph, ["Q"]).unwrap_err(),
            SkillGraphError::UnknownSkill("Q".into())
        );
    }

    #[test]
    fn test_tiers_follow_longest_chain() {
        let graph = diamond();
        let order: Vec<String> = ["A", "B", "C", "D", "E"].map(String::from).to_vec();
        let tier_of = tiers(&graph, &order);
        assert_eq!(tier_of["A"], 0);
        assert_eq!(tier_of["B"], 1);
        assert_eq!(tier_of["C"], 1);
        assert_eq!(tier_of["D"], 2);
        assert_eq!(tier_of["E"], 0);
    }

    #[test]
    fn test_tiers_ignore_prerequisites_outside_order() {
        let graph = diamond();
        let order: Vec<String> = vec!["C".into(), "D".into()];
        let tier_of = tiers(&graph, &order);
        assert_eq!(tier_of["C"], 0);
        assert_eq!(tier_of["D"], 1);
    }
}
