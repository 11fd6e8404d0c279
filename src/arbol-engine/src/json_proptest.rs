// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Property-based tests for the JSON wire format.
//!
//! Analyses generated here mirror what the host store emits: an arbitrary
//! number of facts with free text, relations between them (not necessarily
//! acyclic), measures, and positions that survive a JSON round trip.

use proptest::prelude::*;

use crate::datamodel;
use crate::json::*;

fn finite_f64() -> impl Strategy<Value = f64> {
    // values that round trip exactly through JSON
    prop_oneof![
        Just(0.0),
        (-2000i32..2000).prop_map(|x| x as f64),
        (-100i32..100).prop_map(|x| x as f64 / 4.0),
    ]
}

fn fact_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[A-Za-z0-9 áéíóúñ]{1,60}".prop_map(|s| s.to_string()),
    ]
}

fn node_type_strategy() -> impl Strategy<Value = NodeType> {
    prop_oneof![
        Just(NodeType::FinalEvent),
        Just(NodeType::Intermediate),
        Just(NodeType::RootCause),
    ]
}

fn relation_type_strategy() -> impl Strategy<Value = RelationType> {
    prop_oneof![
        Just(RelationType::Chain),
        Just(RelationType::Conjunctive),
        Just(RelationType::Disjunctive),
    ]
}

fn link_type_strategy() -> impl Strategy<Value = LinkType> {
    prop_oneof![Just(LinkType::Confirmada), Just(LinkType::Aparente)]
}

fn node_strategy(i: usize, n: usize) -> impl Strategy<Value = CausalNode> {
    (
        fact_strategy(),
        node_type_strategy(),
        prop_oneof![Just(FactType::Variacion), Just(FactType::Permanente)],
        relation_type_strategy(),
        prop::collection::vec(0..n.max(1), 0..3),
        any::<bool>(),
        0u32..6,
        prop::collection::vec("[a-z ]{1,12}", 0..3),
        (finite_f64(), finite_f64()),
    )
        .prop_map(
            move |(fact, node_type, fact_type, relation_type, parents, is_root_cause, level, evidence, (x, y))| {
                CausalNode {
                    id: format!("node-{}", i + 1),
                    numero: i as u32 + 1,
                    fact,
                    node_type,
                    fact_type,
                    relation_type,
                    parent_nodes: parents.iter().map(|p| format!("node-{}", p + 1)).collect(),
                    is_root_cause,
                    level,
                    evidence,
                    position: Position { x, y },
                }
            },
        )
}

fn analysis_strategy() -> impl Strategy<Value = CausalTreeAnalysis> {
    (0usize..8)
        .prop_flat_map(|n| {
            let nodes: Vec<_> = (0..n).map(|i| node_strategy(i, n)).collect();
            let relations = prop::collection::vec(
                (0..n.max(1), 0..n.max(1), link_type_strategy()),
                0..n * 2 + 1,
            );
            (nodes, relations, fact_strategy())
        })
        .prop_map(|(nodes, relations, title)| {
            let relations = relations
                .into_iter()
                .map(|(cause, effect, link_type)| NodeRelation {
                    parent_node_id: format!("node-{}", cause + 1),
                    child_node_id: format!("node-{}", effect + 1),
                    link_type,
                })
                .collect();
            CausalTreeAnalysis {
                id: "analysis-1".to_string(),
                title,
                problem_statement: String::new(),
                status: AnalysisStatus::InProgress,
                nodes,
                relations,
                root_causes: vec![],
                preventive_measures: vec![],
            }
        })
}

proptest! {
    #[test]
    fn wire_roundtrip(analysis in analysis_strategy()) {
        let json = serde_json::to_string(&analysis).unwrap();
        let decoded: CausalTreeAnalysis = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(analysis, decoded);
    }

    #[test]
    fn datamodel_roundtrip(analysis in analysis_strategy()) {
        let dm: datamodel::CausalTreeAnalysis = analysis.clone().into();
        let back: CausalTreeAnalysis = dm.clone().into();
        prop_assert_eq!(&analysis, &back);

        let reparsed = from_str(&to_string(&dm).unwrap()).unwrap();
        prop_assert_eq!(dm, reparsed);
    }
}
