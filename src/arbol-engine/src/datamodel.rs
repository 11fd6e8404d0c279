// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! In-memory model of a causal tree analysis.
//!
//! The relation list is the authoritative description of which fact causes
//! which; `CausalNode::parent_nodes` is a projection of it that the store
//! refreshes after every command (see [`CausalTreeAnalysis::sync_parent_nodes`]).

use std::collections::{BTreeMap, BTreeSet};

pub use crate::layout::graph::Position;

pub type NodeId = String;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NodeType {
    FinalEvent,
    Intermediate,
    RootCause,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum FactType {
    /// A deviation from the usual way things happen.
    #[default]
    Variacion,
    /// A condition that was already present before the incident.
    Permanente,
}

/// How the causes of a node combine to produce it.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum RelationType {
    #[default]
    Chain,
    Conjunctive,
    Disjunctive,
}

impl RelationType {
    pub fn symbol(self) -> Option<char> {
        match self {
            RelationType::Chain => None,
            RelationType::Conjunctive => Some('∧'),
            RelationType::Disjunctive => Some('∨'),
        }
    }
}

/// The relation type a node must have given how many causes feed it.
///
/// Nodes with at most one cause are always chains.  Nodes with several
/// causes keep an explicit AND/OR choice and default to AND.
pub fn derive_relation_type(cause_count: usize, current: RelationType) -> RelationType {
    if cause_count <= 1 {
        return RelationType::Chain;
    }
    match current {
        RelationType::Chain => RelationType::Conjunctive,
        other => other,
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum LinkType {
    #[default]
    Confirmada,
    Aparente,
}

#[derive(Clone, PartialEq, Debug)]
pub struct CausalNode {
    pub id: NodeId,
    pub numero: u32,
    pub fact: String,
    pub node_type: NodeType,
    pub fact_type: FactType,
    pub relation_type: RelationType,
    pub parent_nodes: Vec<NodeId>,
    pub is_root_cause: bool,
    pub level: u32,
    pub evidence: Vec<String>,
    pub position: Position,
}

impl CausalNode {
    pub fn new(id: &str, numero: u32, fact: &str, node_type: NodeType) -> Self {
        CausalNode {
            id: id.to_string(),
            numero,
            fact: fact.to_string(),
            node_type,
            fact_type: FactType::default(),
            relation_type: RelationType::default(),
            parent_nodes: Vec::new(),
            is_root_cause: false,
            level: 0,
            evidence: Vec::new(),
            position: Position::default(),
        }
    }

    pub fn is_final_event(&self) -> bool {
        self.node_type == NodeType::FinalEvent
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NodeRelation {
    /// The cause.
    pub parent_node_id: NodeId,
    /// The effect.
    pub child_node_id: NodeId,
    pub link_type: LinkType,
}

impl NodeRelation {
    pub fn new(cause: &str, effect: &str, link_type: LinkType) -> Self {
        NodeRelation {
            parent_node_id: cause.to_string(),
            child_node_id: effect.to_string(),
            link_type,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum MeasureType {
    #[default]
    Preventive,
    Corrective,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum MeasureStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PreventiveMeasure {
    pub id: String,
    pub description: String,
    pub priority: Priority,
    pub measure_type: MeasureType,
    pub status: MeasureStatus,
    pub node_id: NodeId,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum AnalysisStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
    Reviewed,
    Archived,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct CausalTreeAnalysis {
    pub id: String,
    pub title: String,
    pub problem_statement: String,
    pub status: AnalysisStatus,
    pub nodes: Vec<CausalNode>,
    pub relations: Vec<NodeRelation>,
    pub root_causes: Vec<NodeId>,
    pub preventive_measures: Vec<PreventiveMeasure>,
}

impl CausalTreeAnalysis {
    pub fn final_event(&self) -> Option<&CausalNode> {
        self.nodes.iter().find(|n| n.is_final_event())
    }

    pub fn get_node(&self, id: &str) -> Option<&CausalNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut CausalNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn cause_index(&self) -> CauseIndex {
        CauseIndex::build(&self.nodes, &self.relations)
    }

    /// Rewrites every node's `parent_nodes` from the relation list.
    pub fn sync_parent_nodes(&mut self) {
        let index = CauseIndex::from_relations(&self.nodes, &self.relations);
        for node in self.nodes.iter_mut() {
            node.parent_nodes = index.causes_of(&node.id).to_vec();
        }
    }

    /// Gives an analysis that only carries `parent_nodes` an equivalent
    /// relation list of confirmed links.  Does nothing once any relation
    /// exists.  Returns true when relations were added.
    pub fn relations_from_parent_nodes(&mut self) -> bool {
        if !self.relations.is_empty() {
            return false;
        }
        let index = CauseIndex::from_parent_nodes(&self.nodes);
        for node in &self.nodes {
            for cause in index.causes_of(&node.id) {
                self.relations
                    .push(NodeRelation::new(cause, &node.id, LinkType::Confirmada));
            }
        }
        !self.relations.is_empty()
    }

    /// Nodes whose `parent_nodes` disagree with the relation list.
    pub fn parent_node_drift(&self) -> Vec<NodeId> {
        let index = CauseIndex::from_relations(&self.nodes, &self.relations);
        self.nodes
            .iter()
            .filter(|n| {
                let stored: BTreeSet<&str> = n.parent_nodes.iter().map(String::as_str).collect();
                let derived: BTreeSet<&str> =
                    index.causes_of(&n.id).iter().map(String::as_str).collect();
                stored != derived
            })
            .map(|n| n.id.clone())
            .collect()
    }
}

/// Cause lookup: for each effect, its direct causes in first-seen order.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct CauseIndex {
    causes: BTreeMap<NodeId, Vec<NodeId>>,
}

impl CauseIndex {
    /// Prefers the relation list; falls back to `parent_nodes` only when no
    /// relations are present at all.
    pub fn build(nodes: &[CausalNode], relations: &[NodeRelation]) -> Self {
        if relations.is_empty() {
            Self::from_parent_nodes(nodes)
        } else {
            Self::from_relations(nodes, relations)
        }
    }

    pub fn from_relations(nodes: &[CausalNode], relations: &[NodeRelation]) -> Self {
        let known: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let mut index = CauseIndex::default();
        for rel in relations {
            if !known.contains(rel.parent_node_id.as_str())
                || !known.contains(rel.child_node_id.as_str())
            {
                continue;
            }
            index.insert(&rel.child_node_id, &rel.parent_node_id);
        }
        index
    }

    pub fn from_parent_nodes(nodes: &[CausalNode]) -> Self {
        let known: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let mut index = CauseIndex::default();
        for node in nodes {
            for cause in &node.parent_nodes {
                if known.contains(cause.as_str()) {
                    index.insert(&node.id, cause);
                }
            }
        }
        index
    }

    fn insert(&mut self, effect: &str, cause: &str) {
        let causes = self.causes.entry(effect.to_string()).or_default();
        if !causes.iter().any(|c| c == cause) {
            causes.push(cause.to_string());
        }
    }

    pub fn causes_of(&self, effect: &str) -> &[NodeId] {
        self.causes.get(effect).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cause_count(&self, effect: &str) -> usize {
        self.causes_of(effect).len()
    }

    /// Every node that appears as the cause of some effect.
    pub fn all_causes(&self) -> BTreeSet<&str> {
        self.causes
            .values()
            .flat_map(|c| c.iter().map(String::as_str))
            .collect()
    }

    /// Effects directly caused by `cause`.
    pub fn effects_of(&self, cause: &str) -> Vec<&str> {
        self.causes
            .iter()
            .filter(|(_, causes)| causes.iter().any(|c| c == cause))
            .map(|(effect, _)| effect.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, numero: u32, node_type: NodeType) -> CausalNode {
        CausalNode::new(id, numero, id, node_type)
    }

    #[test]
    fn test_derive_relation_type() {
        use RelationType::*;
        assert_eq!(derive_relation_type(0, Conjunctive), Chain);
        assert_eq!(derive_relation_type(1, Disjunctive), Chain);
        assert_eq!(derive_relation_type(1, Chain), Chain);
        assert_eq!(derive_relation_type(2, Chain), Conjunctive);
        assert_eq!(derive_relation_type(2, Disjunctive), Disjunctive);
        assert_eq!(derive_relation_type(5, Conjunctive), Conjunctive);
    }

    #[test]
    fn test_relation_symbols() {
        assert_eq!(RelationType::Chain.symbol(), None);
        assert_eq!(RelationType::Conjunctive.symbol(), Some('∧'));
        assert_eq!(RelationType::Disjunctive.symbol(), Some('∨'));
    }

    #[test]
    fn test_cause_index_prefers_relations() {
        let mut fe = node("fe", 1, NodeType::FinalEvent);
        fe.parent_nodes = vec!["b".to_string()];
        let nodes = vec![
            fe,
            node("a", 2, NodeType::Intermediate),
            node("b", 3, NodeType::Intermediate),
        ];
        let relations = vec![NodeRelation::new("a", "fe", LinkType::Confirmada)];

        let index = CauseIndex::build(&nodes, &relations);
        assert_eq!(index.causes_of("fe"), &["a".to_string()]);

        let fallback = CauseIndex::build(&nodes, &[]);
        assert_eq!(fallback.causes_of("fe"), &["b".to_string()]);
    }

    #[test]
    fn test_cause_index_skips_duplicates_and_unknown_nodes() {
        let nodes = vec![
            node("fe", 1, NodeType::FinalEvent),
            node("a", 2, NodeType::Intermediate),
        ];
        let relations = vec![
            NodeRelation::new("a", "fe", LinkType::Confirmada),
            NodeRelation::new("a", "fe", LinkType::Aparente),
            NodeRelation::new("ghost", "fe", LinkType::Confirmada),
        ];
        let index = CauseIndex::build(&nodes, &relations);
        assert_eq!(index.cause_count("fe"), 1);
        assert_eq!(index.effects_of("a"), vec!["fe"]);
        assert!(index.all_causes().contains("a"));
    }

    #[test]
    fn test_sync_parent_nodes_and_drift() {
        let mut analysis = CausalTreeAnalysis {
            nodes: vec![
                node("fe", 1, NodeType::FinalEvent),
                node("a", 2, NodeType::Intermediate),
                node("b", 3, NodeType::Intermediate),
            ],
            relations: vec![
                NodeRelation::new("a", "fe", LinkType::Confirmada),
                NodeRelation::new("b", "a", LinkType::Confirmada),
            ],
            ..Default::default()
        };
        assert_eq!(analysis.parent_node_drift(), vec!["fe", "a"]);

        analysis.sync_parent_nodes();
        assert!(analysis.parent_node_drift().is_empty());
        assert_eq!(
            analysis.get_node("fe").unwrap().parent_nodes,
            vec!["a".to_string()]
        );
        assert!(analysis.get_node("b").unwrap().parent_nodes.is_empty());
    }

    #[test]
    fn test_relations_from_parent_nodes() {
        let mut fe = node("fe", 1, NodeType::FinalEvent);
        fe.parent_nodes = vec!["a".to_string(), "ghost".to_string()];
        let mut a = node("a", 2, NodeType::Intermediate);
        a.parent_nodes = vec!["b".to_string(), "b".to_string()];
        let mut analysis = CausalTreeAnalysis {
            nodes: vec![fe, a, node("b", 3, NodeType::Intermediate)],
            ..Default::default()
        };

        assert!(analysis.relations_from_parent_nodes());
        assert_eq!(
            analysis.relations,
            vec![
                NodeRelation::new("a", "fe", LinkType::Confirmada),
                NodeRelation::new("b", "a", LinkType::Confirmada),
            ]
        );

        // an existing relation list is left alone
        analysis.nodes[0].parent_nodes.push("b".to_string());
        assert!(!analysis.relations_from_parent_nodes());
        assert_eq!(analysis.relations.len(), 2);
    }

    #[test]
    fn test_final_event_lookup() {
        let analysis = CausalTreeAnalysis {
            nodes: vec![
                node("a", 2, NodeType::Intermediate),
                node("fe", 1, NodeType::FinalEvent),
            ],
            ..Default::default()
        };
        assert_eq!(analysis.final_event().map(|n| n.id.as_str()), Some("fe"));
        assert!(CausalTreeAnalysis::default().final_event().is_none());
    }
}
