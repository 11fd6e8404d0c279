// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Analysis validation.
//!
//! The full validation service lives outside this crate and is reached
//! through [`ValidationService`].  The structural ("logic") check is
//! implemented here because it shares the cause index and traversal with the
//! layout engine; the objectivity and measures checks are simple reference
//! rules used by the in-memory store.

use std::collections::{BTreeMap, BTreeSet};

use crate::common::Result;
use crate::datamodel::{CausalTreeAnalysis, NodeId, RelationType, derive_relation_type};
use crate::layout::graph::{find_cycles, unreachable_nodes};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub enum ValidationCheck {
    Objectivity,
    Logic,
    Measures,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum IssueKind {
    MissingFinalEvent,
    MultipleFinalEvents,
    FinalEventIsCause,
    Cycle,
    Disconnected,
    RelationTypeMismatch,
    DuplicateNumero,
    DanglingRelation,
    ParentNodesDrift,
    SubjectiveFact,
    NoRootCauses,
    RootCauseWithoutMeasure,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ValidationIssue {
    pub check: ValidationCheck,
    pub kind: IssueKind,
    pub severity: Severity,
    pub node_id: Option<NodeId>,
    pub message: String,
}

impl ValidationIssue {
    fn logic(kind: IssueKind, severity: Severity, node_id: Option<&str>, message: String) -> Self {
        ValidationIssue {
            check: ValidationCheck::Logic,
            kind,
            severity,
            node_id: node_id.map(str::to_string),
            message,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Valid when no issue has error severity.
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let is_valid = !issues.iter().any(|i| i.severity == Severity::Error);
        ValidationResult { is_valid, issues }
    }

    pub fn issues_for(&self, check: ValidationCheck) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.check == check)
    }

    pub fn disconnected_nodes(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter(|i| i.kind == IssueKind::Disconnected)
            .filter_map(|i| i.node_id.as_deref())
            .collect()
    }
}

/// Boundary to the external validation service.
pub trait ValidationService {
    fn validate(&self, analysis_id: &str, checks: &[ValidationCheck]) -> Result<ValidationResult>;
}

/// Structural checks over the cause graph.
pub fn validate_structure(analysis: &CausalTreeAnalysis) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let nodes = &analysis.nodes;

    let final_events: Vec<&str> = nodes
        .iter()
        .filter(|n| n.is_final_event())
        .map(|n| n.id.as_str())
        .collect();
    match final_events.len() {
        0 => issues.push(ValidationIssue::logic(
            IssueKind::MissingFinalEvent,
            Severity::Error,
            None,
            "the analysis has no final event".to_string(),
        )),
        1 => {}
        n => issues.push(ValidationIssue::logic(
            IssueKind::MultipleFinalEvents,
            Severity::Error,
            None,
            format!("the analysis has {n} final events"),
        )),
    }

    let known: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    for rel in &analysis.relations {
        if !known.contains(rel.parent_node_id.as_str()) || !known.contains(rel.child_node_id.as_str())
        {
            issues.push(ValidationIssue::logic(
                IssueKind::DanglingRelation,
                Severity::Warning,
                None,
                format!(
                    "relation {} -> {} references a missing node",
                    rel.parent_node_id, rel.child_node_id
                ),
            ));
        }
    }

    let index = analysis.cause_index();

    for &fe in &final_events {
        if !index.effects_of(fe).is_empty() {
            issues.push(ValidationIssue::logic(
                IssueKind::FinalEventIsCause,
                Severity::Error,
                Some(fe),
                "the final event cannot be the cause of another fact".to_string(),
            ));
        }
    }

    for cycle in find_cycles(nodes, &index) {
        issues.push(ValidationIssue::logic(
            IssueKind::Cycle,
            Severity::Error,
            cycle.first().map(String::as_str),
            format!("circular causation: {}", cycle.join(" -> ")),
        ));
    }

    if !final_events.is_empty() {
        for id in unreachable_nodes(nodes, &index) {
            issues.push(ValidationIssue::logic(
                IssueKind::Disconnected,
                Severity::Warning,
                Some(id.as_str()),
                format!("fact {id} is not connected to the final event"),
            ));
        }
    }

    for node in nodes {
        let count = index.cause_count(&node.id);
        let expected = derive_relation_type(count, node.relation_type);
        if expected != node.relation_type {
            let message = if node.relation_type == RelationType::Chain {
                format!("fact {} has {count} causes but is marked as a chain", node.id)
            } else {
                format!(
                    "fact {} has {count} cause(s) and cannot be an AND/OR junction",
                    node.id
                )
            };
            issues.push(ValidationIssue::logic(
                IssueKind::RelationTypeMismatch,
                Severity::Error,
                Some(node.id.as_str()),
                message,
            ));
        }
    }

    let mut numeros: BTreeMap<u32, &str> = BTreeMap::new();
    for node in nodes {
        if let Some(first) = numeros.insert(node.numero, node.id.as_str()) {
            issues.push(ValidationIssue::logic(
                IssueKind::DuplicateNumero,
                Severity::Error,
                Some(node.id.as_str()),
                format!("numero {} is shared by {first} and {}", node.numero, node.id),
            ));
        }
    }

    for id in analysis.parent_node_drift() {
        issues.push(ValidationIssue::logic(
            IssueKind::ParentNodesDrift,
            Severity::Warning,
            Some(id.as_str()),
            format!("cached causes of {id} disagree with the relation list"),
        ));
    }

    issues
}

/// Judgment vocabulary that signals an opinion rather than an observed fact.
const JUDGMENT_TERMS: &[&str] = &[
    "negligencia",
    "negligente",
    "descuido",
    "culpa",
    "irresponsable",
    "imprudente",
    "debería",
    "deberia",
    "mal hecho",
    "careless",
    "negligence",
    "fault",
    "should have",
];

/// True when the words of `phrase` appear consecutively in `words`.
fn contains_phrase(words: &[&str], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    !needle.is_empty() && words.windows(needle.len()).any(|w| w == needle.as_slice())
}

pub fn check_objectivity(analysis: &CausalTreeAnalysis) -> Vec<ValidationIssue> {
    analysis
        .nodes
        .iter()
        .filter_map(|node| {
            let fact = node.fact.to_lowercase();
            let words: Vec<&str> = fact
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .collect();
            JUDGMENT_TERMS
                .iter()
                .find(|term| contains_phrase(&words, term))
                .map(|term| ValidationIssue {
                    check: ValidationCheck::Objectivity,
                    kind: IssueKind::SubjectiveFact,
                    severity: Severity::Warning,
                    node_id: Some(node.id.clone()),
                    message: format!(
                        "fact {} contains the judgment \"{term}\"; state what was observed",
                        node.id
                    ),
                })
        })
        .collect()
}

pub fn check_measures(analysis: &CausalTreeAnalysis) -> Vec<ValidationIssue> {
    let root_causes: Vec<&str> = analysis
        .nodes
        .iter()
        .filter(|n| n.is_root_cause)
        .map(|n| n.id.as_str())
        .collect();

    if root_causes.is_empty() {
        return vec![ValidationIssue {
            check: ValidationCheck::Measures,
            kind: IssueKind::NoRootCauses,
            severity: Severity::Warning,
            node_id: None,
            message: "no fact has been marked as a root cause".to_string(),
        }];
    }

    let covered: BTreeSet<&str> = analysis
        .preventive_measures
        .iter()
        .map(|m| m.node_id.as_str())
        .collect();

    root_causes
        .into_iter()
        .filter(|id| !covered.contains(id))
        .map(|id| ValidationIssue {
            check: ValidationCheck::Measures,
            kind: IssueKind::RootCauseWithoutMeasure,
            severity: Severity::Error,
            node_id: Some(id.to_string()),
            message: format!("root cause {id} has no preventive or corrective measure"),
        })
        .collect()
}

/// Runs the requested checks locally.
pub fn run_checks(analysis: &CausalTreeAnalysis, checks: &[ValidationCheck]) -> ValidationResult {
    let checks: BTreeSet<ValidationCheck> = checks.iter().copied().collect();
    let mut issues = Vec::new();
    for check in checks {
        match check {
            ValidationCheck::Objectivity => issues.extend(check_objectivity(analysis)),
            ValidationCheck::Logic => issues.extend(validate_structure(analysis)),
            ValidationCheck::Measures => issues.extend(check_measures(analysis)),
        }
    }
    ValidationResult::from_issues(issues)
}
