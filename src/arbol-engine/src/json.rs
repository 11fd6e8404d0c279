// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! JSON representation of a causal tree analysis.
//!
//! Field names and enum values follow the shapes exchanged with the host
//! analysis store (camelCase fields, snake_case enum values).  Conversions
//! to and from [`crate::datamodel`] are lossless.
//!
//! # Example
//! ```no_run
//! use arbol_engine::json;
//!
//! let json_str = r#"{"id": "42", "title": "Caída de altura", "nodes": []}"#;
//! let analysis = json::from_str(json_str)?;
//! assert!(analysis.final_event().is_none());
//! # Ok::<(), arbol_engine::Error>(())
//! ```

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::Result;
use crate::datamodel;

// Helper functions for serde skip_serializing_if

fn is_false(val: &bool) -> bool {
    !*val
}

fn is_zero_u32(val: &u32) -> bool {
    *val == 0
}

fn is_empty_vec<T>(val: &[T]) -> bool {
    val.is_empty()
}

fn deserialize_null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    T: Default + serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    let opt = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    FinalEvent,
    Intermediate,
    RootCause,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum FactType {
    #[default]
    Variacion,
    Permanente,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    #[default]
    Chain,
    Conjunctive,
    Disjunctive,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    #[default]
    Confirmada,
    Aparente,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum MeasureType {
    #[default]
    Preventive,
    Corrective,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum MeasureStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
    Reviewed,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct CausalNode {
    pub id: String,
    pub numero: u32,
    pub fact: String,
    pub node_type: NodeType,
    #[serde(default)]
    pub fact_type: FactType,
    #[serde(default)]
    pub relation_type: RelationType,
    #[serde(
        skip_serializing_if = "is_empty_vec",
        default,
        deserialize_with = "deserialize_null_default"
    )]
    pub parent_nodes: Vec<String>,
    #[serde(skip_serializing_if = "is_false", default)]
    pub is_root_cause: bool,
    #[serde(skip_serializing_if = "is_zero_u32", default)]
    pub level: u32,
    #[serde(
        skip_serializing_if = "is_empty_vec",
        default,
        deserialize_with = "deserialize_null_default"
    )]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct NodeRelation {
    pub parent_node_id: String,
    pub child_node_id: String,
    #[serde(default)]
    pub link_type: LinkType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct PreventiveMeasure {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub measure_type: MeasureType,
    #[serde(default)]
    pub status: MeasureStatus,
    pub node_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct CausalTreeAnalysis {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub problem_statement: String,
    #[serde(default)]
    pub status: AnalysisStatus,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub nodes: Vec<CausalNode>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub relations: Vec<NodeRelation>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub root_causes: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub preventive_measures: Vec<PreventiveMeasure>,
}

pub fn from_str(s: &str) -> Result<datamodel::CausalTreeAnalysis> {
    let analysis: CausalTreeAnalysis = serde_json::from_str(s)?;
    Ok(analysis.into())
}

pub fn to_string(analysis: &datamodel::CausalTreeAnalysis) -> Result<String> {
    let analysis = CausalTreeAnalysis::from(analysis.clone());
    Ok(serde_json::to_string_pretty(&analysis)?)
}

// Conversions between the wire enums and the datamodel enums

macro_rules! mirror_enum {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$name> for datamodel::$name {
            fn from(v: $name) -> Self {
                match v {
                    $($name::$variant => datamodel::$name::$variant,)+
                }
            }
        }

        impl From<datamodel::$name> for $name {
            fn from(v: datamodel::$name) -> Self {
                match v {
                    $(datamodel::$name::$variant => $name::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(NodeType {
    FinalEvent,
    Intermediate,
    RootCause
});
mirror_enum!(FactType {
    Variacion,
    Permanente
});
mirror_enum!(RelationType {
    Chain,
    Conjunctive,
    Disjunctive
});
mirror_enum!(LinkType {
    Confirmada,
    Aparente
});
mirror_enum!(Priority { Low, Medium, High });
mirror_enum!(MeasureType {
    Preventive,
    Corrective
});
mirror_enum!(MeasureStatus {
    Pending,
    InProgress,
    Completed
});
mirror_enum!(AnalysisStatus {
    Draft,
    InProgress,
    Completed,
    Reviewed,
    Archived
});

impl From<CausalNode> for datamodel::CausalNode {
    fn from(node: CausalNode) -> Self {
        datamodel::CausalNode {
            id: node.id,
            numero: node.numero,
            fact: node.fact,
            node_type: node.node_type.into(),
            fact_type: node.fact_type.into(),
            relation_type: node.relation_type.into(),
            parent_nodes: node.parent_nodes,
            is_root_cause: node.is_root_cause,
            level: node.level,
            evidence: node.evidence,
            position: datamodel::Position::new(node.position.x, node.position.y),
        }
    }
}

impl From<datamodel::CausalNode> for CausalNode {
    fn from(node: datamodel::CausalNode) -> Self {
        CausalNode {
            id: node.id,
            numero: node.numero,
            fact: node.fact,
            node_type: node.node_type.into(),
            fact_type: node.fact_type.into(),
            relation_type: node.relation_type.into(),
            parent_nodes: node.parent_nodes,
            is_root_cause: node.is_root_cause,
            level: node.level,
            evidence: node.evidence,
            position: Position {
                x: node.position.x,
                y: node.position.y,
            },
        }
    }
}

impl From<NodeRelation> for datamodel::NodeRelation {
    fn from(rel: NodeRelation) -> Self {
        datamodel::NodeRelation {
            parent_node_id: rel.parent_node_id,
            child_node_id: rel.child_node_id,
            link_type: rel.link_type.into(),
        }
    }
}

impl From<datamodel::NodeRelation> for NodeRelation {
    fn from(rel: datamodel::NodeRelation) -> Self {
        NodeRelation {
            parent_node_id: rel.parent_node_id,
            child_node_id: rel.child_node_id,
            link_type: rel.link_type.into(),
        }
    }
}

impl From<PreventiveMeasure> for datamodel::PreventiveMeasure {
    fn from(m: PreventiveMeasure) -> Self {
        datamodel::PreventiveMeasure {
            id: m.id,
            description: m.description,
            priority: m.priority.into(),
            measure_type: m.measure_type.into(),
            status: m.status.into(),
            node_id: m.node_id,
        }
    }
}

impl From<datamodel::PreventiveMeasure> for PreventiveMeasure {
    fn from(m: datamodel::PreventiveMeasure) -> Self {
        PreventiveMeasure {
            id: m.id,
            description: m.description,
            priority: m.priority.into(),
            measure_type: m.measure_type.into(),
            status: m.status.into(),
            node_id: m.node_id,
        }
    }
}

impl From<CausalTreeAnalysis> for datamodel::CausalTreeAnalysis {
    fn from(a: CausalTreeAnalysis) -> Self {
        datamodel::CausalTreeAnalysis {
            id: a.id,
            title: a.title,
            problem_statement: a.problem_statement,
            status: a.status.into(),
            nodes: a.nodes.into_iter().map(Into::into).collect(),
            relations: a.relations.into_iter().map(Into::into).collect(),
            root_causes: a.root_causes,
            preventive_measures: a.preventive_measures.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<datamodel::CausalTreeAnalysis> for CausalTreeAnalysis {
    fn from(a: datamodel::CausalTreeAnalysis) -> Self {
        CausalTreeAnalysis {
            id: a.id,
            title: a.title,
            problem_statement: a.problem_statement,
            status: a.status.into(),
            nodes: a.nodes.into_iter().map(Into::into).collect(),
            relations: a.relations.into_iter().map(Into::into).collect(),
            root_causes: a.root_causes,
            preventive_measures: a.preventive_measures.into_iter().map(Into::into).collect(),
        }
    }
}
