// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::datamodel::{CausalNode, CauseIndex, NodeId};

/// Centre of a node card, in diagram units.
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Maps nodes to positions.
pub type Layout = BTreeMap<NodeId, Position>;

fn by_numero<'a>(nodes: &'a [CausalNode]) -> Vec<&'a CausalNode> {
    let mut sorted: Vec<&CausalNode> = nodes.iter().collect();
    sorted.sort_by(|a, b| a.numero.cmp(&b.numero).then_with(|| a.id.cmp(&b.id)));
    sorted
}

/// Traversal roots: the final event, or when there is none, every node that
/// is not the cause of anything.
pub fn traversal_roots<'a>(nodes: &'a [CausalNode], index: &CauseIndex) -> Vec<&'a str> {
    if let Some(fe) = nodes.iter().find(|n| n.is_final_event()) {
        return vec![fe.id.as_str()];
    }
    let causes = index.all_causes();
    by_numero(nodes)
        .into_iter()
        .filter(|n| !causes.contains(n.id.as_str()))
        .map(|n| n.id.as_str())
        .collect()
}

/// Breadth-first depth assignment from the traversal roots, following cause
/// edges.  Nodes the traversal never reaches get depth 0.
pub fn assign_depths(nodes: &[CausalNode], index: &CauseIndex) -> BTreeMap<NodeId, usize> {
    let mut depths: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

    for root in traversal_roots(nodes, index) {
        if !depths.contains_key(root) {
            depths.insert(root.to_string(), 0);
            queue.push_back((root, 0));
        }
    }

    while let Some((id, depth)) = queue.pop_front() {
        for cause in index.causes_of(id) {
            if depths.contains_key(cause.as_str()) {
                continue;
            }
            depths.insert(cause.clone(), depth + 1);
            queue.push_back((cause.as_str(), depth + 1));
        }
    }

    for node in nodes {
        depths.entry(node.id.clone()).or_insert(0);
    }

    depths
}

/// Nodes not reachable from the final event (or fallback roots).
pub fn unreachable_nodes(nodes: &[CausalNode], index: &CauseIndex) -> Vec<NodeId> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for root in traversal_roots(nodes, index) {
        if seen.insert(root) {
            queue.push_back(root);
        }
    }
    while let Some(id) = queue.pop_front() {
        for cause in index.causes_of(id) {
            if seen.insert(cause.as_str()) {
                queue.push_back(cause.as_str());
            }
        }
    }
    by_numero(nodes)
        .into_iter()
        .filter(|n| !seen.contains(n.id.as_str()))
        .map(|n| n.id.clone())
        .collect()
}

/// Detect cycles in the effect -> cause graph.
///
/// Depth-first with an explicit stack, so arbitrarily long chains are fine.
pub fn find_cycles(nodes: &[CausalNode], index: &CauseIndex) -> Vec<Vec<NodeId>> {
    let mut cycles = Vec::new();
    let mut visited: BTreeSet<&str> = BTreeSet::new();

    for node in by_numero(nodes) {
        let root = node.id.as_str();
        if !visited.insert(root) {
            continue;
        }
        // (node, index of the next cause to visit)
        let mut path: Vec<(&str, usize)> = vec![(root, 0)];
        let mut on_path: BTreeSet<&str> = BTreeSet::from([root]);

        while let Some(frame) = path.last_mut() {
            let (id, next) = *frame;
            let causes = index.causes_of(id);
            if next == causes.len() {
                path.pop();
                on_path.remove(id);
                continue;
            }
            frame.1 += 1;

            let cause = causes[next].as_str();
            if visited.insert(cause) {
                on_path.insert(cause);
                path.push((cause, 0));
            } else if on_path.contains(cause)
                && let Some(start) = path.iter().position(|(n, _)| *n == cause)
            {
                cycles.push(path[start..].iter().map(|(n, _)| n.to_string()).collect());
            }
        }
    }
    cycles
}

/// True when adding `cause -> effect` would close a cycle, i.e. `effect` is
/// already an (indirect) cause of `cause`.
pub fn would_create_cycle(index: &CauseIndex, cause: &str, effect: &str) -> bool {
    if cause == effect {
        return true;
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut queue: VecDeque<&str> = VecDeque::from([cause]);
    while let Some(id) = queue.pop_front() {
        for c in index.causes_of(id) {
            if c == effect {
                return true;
            }
            if seen.insert(c.as_str()) {
                queue.push_back(c.as_str());
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::{LinkType, NodeRelation, NodeType};

    fn node(id: &str, numero: u32, node_type: NodeType) -> CausalNode {
        CausalNode::new(id, numero, id, node_type)
    }

    fn rel(cause: &str, effect: &str) -> NodeRelation {
        NodeRelation::new(cause, effect, LinkType::Confirmada)
    }

    #[test]
    fn test_position_debug() {
        let a = Position::new(1.0, 2.5);
        assert_eq!(format!("{a:?}"), "(1.00, 2.50)");
    }

    #[test]
    fn test_assign_depths_shortest_path() {
        // fe <- a <- b, and fe <- b directly: b is at depth 1
        let nodes = vec![
            node("fe", 1, NodeType::FinalEvent),
            node("a", 2, NodeType::Intermediate),
            node("b", 3, NodeType::Intermediate),
        ];
        let relations = vec![rel("a", "fe"), rel("b", "a"), rel("b", "fe")];
        let index = CauseIndex::build(&nodes, &relations);
        let depths = assign_depths(&nodes, &index);
        assert_eq!(depths["fe"], 0);
        assert_eq!(depths["a"], 1);
        assert_eq!(depths["b"], 1);
    }

    #[test]
    fn test_assign_depths_tolerates_cycles() {
        let nodes = vec![
            node("fe", 1, NodeType::FinalEvent),
            node("a", 2, NodeType::Intermediate),
            node("b", 3, NodeType::Intermediate),
        ];
        let relations = vec![rel("a", "fe"), rel("b", "a"), rel("a", "b")];
        let index = CauseIndex::build(&nodes, &relations);
        let depths = assign_depths(&nodes, &index);
        assert_eq!(depths.len(), 3);
        assert_eq!(depths["b"], 2);

        let cycles = find_cycles(&nodes, &index);
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].contains(&"a".to_string()));
        assert!(cycles[0].contains(&"b".to_string()));
    }

    #[test]
    fn test_find_cycles_on_deep_chain() {
        let n = 20_000;
        let mut nodes = vec![node("n0", 1, NodeType::FinalEvent)];
        let mut relations = Vec::new();
        for i in 1..n {
            let id = format!("n{i}");
            nodes.push(CausalNode::new(&id, i as u32 + 1, &id, NodeType::Intermediate));
            relations.push(rel(&id, &format!("n{}", i - 1)));
        }
        let index = CauseIndex::build(&nodes, &relations);
        assert!(find_cycles(&nodes, &index).is_empty());

        // closing the chain back onto n1 yields one cycle of n - 1 nodes
        relations.push(rel("n1", &format!("n{}", n - 1)));
        let index = CauseIndex::build(&nodes, &relations);
        let cycles = find_cycles(&nodes, &index);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), n - 1);
        assert_eq!(cycles[0][0], "n1");
    }

    #[test]
    fn test_fallback_roots_without_final_event() {
        let nodes = vec![
            node("x", 4, NodeType::Intermediate),
            node("y", 2, NodeType::Intermediate),
            node("z", 3, NodeType::RootCause),
        ];
        let relations = vec![rel("z", "y")];
        let index = CauseIndex::build(&nodes, &relations);
        assert_eq!(traversal_roots(&nodes, &index), vec!["y", "x"]);

        let depths = assign_depths(&nodes, &index);
        assert_eq!(depths["y"], 0);
        assert_eq!(depths["x"], 0);
        assert_eq!(depths["z"], 1);
    }

    #[test]
    fn test_unreachable_nodes() {
        let nodes = vec![
            node("fe", 1, NodeType::FinalEvent),
            node("a", 2, NodeType::Intermediate),
            node("orphan", 3, NodeType::Intermediate),
        ];
        let relations = vec![rel("a", "fe")];
        let index = CauseIndex::build(&nodes, &relations);
        assert_eq!(unreachable_nodes(&nodes, &index), vec!["orphan".to_string()]);
        assert_eq!(assign_depths(&nodes, &index)["orphan"], 0);
    }

    #[test]
    fn test_would_create_cycle() {
        let nodes = vec![
            node("fe", 1, NodeType::FinalEvent),
            node("a", 2, NodeType::Intermediate),
            node("b", 3, NodeType::Intermediate),
        ];
        let relations = vec![rel("a", "fe"), rel("b", "a")];
        let index = CauseIndex::build(&nodes, &relations);
        assert!(would_create_cycle(&index, "fe", "b"));
        assert!(would_create_cycle(&index, "a", "a"));
        assert!(!would_create_cycle(&index, "b", "fe"));
    }
}
