// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Capturing a single new fact.
//!
//! A [`NodeDraft`] holds what the user has entered so far.  The relation
//! type of the affected effect is re-derived after every selection change,
//! so a draft can never describe a chain with several causes or an AND/OR
//! junction with a single one.

use std::collections::BTreeSet;

use crate::common::Result;
use crate::datamodel::{
    CausalTreeAnalysis, FactType, LinkType, NodeId, NodeType, RelationType, derive_relation_type,
};
use crate::tree_err;

/// Whether the new fact can still be asked "why?".
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Classification {
    #[default]
    CanAskWhy,
    IsRootCause,
}

impl Classification {
    pub fn node_type(self) -> NodeType {
        match self {
            Classification::CanAskWhy => NodeType::Intermediate,
            Classification::IsRootCause => NodeType::RootCause,
        }
    }
}

/// An existing node linked to the effect alongside the new fact.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CoCause {
    pub node_id: NodeId,
    pub link_type: LinkType,
}

/// The normalized request sent to the analysis store.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CreateNodeCommand {
    pub fact: String,
    pub node_type: NodeType,
    pub fact_type: FactType,
    /// Relation type the effect must have once the new fact is attached.
    pub relation_type: RelationType,
    pub effect_node_id: Option<NodeId>,
    /// Link type of the new fact -> effect connection.
    pub link_type: LinkType,
    pub co_causes: Vec<CoCause>,
    pub evidence: Vec<String>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct NodeDraft {
    pub fact: String,
    pub fact_type: FactType,
    pub classification: Classification,
    pub evidence: Vec<String>,
    pub link_type: LinkType,
    target: Option<NodeId>,
    checklist: Vec<NodeId>,
    co_causes: Vec<CoCause>,
    existing_causes: Vec<NodeId>,
    relation_type: RelationType,
}

impl NodeDraft {
    /// A blank draft, used when adding from an empty canvas.
    pub fn new() -> Self {
        NodeDraft {
            fact: String::new(),
            fact_type: FactType::default(),
            classification: Classification::default(),
            evidence: Vec::new(),
            link_type: LinkType::default(),
            target: None,
            checklist: Vec::new(),
            co_causes: Vec::new(),
            existing_causes: Vec::new(),
            relation_type: RelationType::Chain,
        }
    }

    /// A draft that adds a cause under `target`.
    pub fn for_effect(analysis: &CausalTreeAnalysis, target: &str) -> Result<Self> {
        if analysis.get_node(target).is_none() {
            return tree_err!(Authoring, UnknownNode, target.to_string());
        }
        let mut draft = NodeDraft::new();
        draft.target = Some(target.to_string());
        draft.load_effect(analysis);
        Ok(draft)
    }

    /// The effect the new fact will be a cause of.
    pub fn effect_node_id(&self) -> Option<&str> {
        self.target
            .as_deref()
            .or_else(|| self.checklist.first().map(String::as_str))
    }

    pub fn checklist(&self) -> &[NodeId] {
        &self.checklist
    }

    pub fn co_causes(&self) -> &[CoCause] {
        &self.co_causes
    }

    pub fn relation_type(&self) -> RelationType {
        self.relation_type
    }

    /// Toggles a node in the "this fact is a cause of…" checklist.  Only
    /// meaningful without an explicit target; the first selected node
    /// becomes the effect.
    pub fn toggle_effect(&mut self, analysis: &CausalTreeAnalysis, node_id: &str) -> Result<()> {
        if analysis.get_node(node_id).is_none() {
            return tree_err!(Authoring, UnknownNode, node_id.to_string());
        }
        if let Some(pos) = self.checklist.iter().position(|id| id == node_id) {
            self.checklist.remove(pos);
        } else {
            self.checklist.push(node_id.to_string());
        }
        self.load_effect(analysis);
        Ok(())
    }

    /// Adds an existing node as a joint cause of the effect.
    pub fn add_co_cause(&mut self, analysis: &CausalTreeAnalysis, node_id: &str) -> Result<()> {
        let Some(node) = analysis.get_node(node_id) else {
            return tree_err!(Authoring, UnknownNode, node_id.to_string());
        };
        if self.effect_node_id().is_none() {
            return tree_err!(
                Authoring,
                MissingEffect,
                "choose the effect before adding co-causes".to_string()
            );
        }
        if node.is_final_event() || self.effect_node_id() == Some(node_id) {
            return tree_err!(
                Authoring,
                SelfReference,
                format!("{node_id} cannot be a cause of the effect")
            );
        }
        if !self.co_causes.iter().any(|c| c.node_id == node_id) {
            self.co_causes.push(CoCause {
                node_id: node_id.to_string(),
                link_type: LinkType::default(),
            });
        }
        self.rederive();
        Ok(())
    }

    pub fn remove_co_cause(&mut self, node_id: &str) {
        self.co_causes.retain(|c| c.node_id != node_id);
        self.rederive();
    }

    /// Sets the link type of a co-cause connection; returns false when the
    /// node is not a co-cause.
    pub fn set_co_cause_link(&mut self, node_id: &str, link_type: LinkType) -> bool {
        match self.co_causes.iter_mut().find(|c| c.node_id == node_id) {
            Some(c) => {
                c.link_type = link_type;
                true
            }
            None => false,
        }
    }

    /// Number of causes the effect will have once the fact is submitted.
    pub fn cause_count(&self) -> usize {
        if self.effect_node_id().is_none() {
            return 0;
        }
        let mut causes: BTreeSet<&str> = self.existing_causes.iter().map(String::as_str).collect();
        causes.extend(self.co_causes.iter().map(|c| c.node_id.as_str()));
        causes.len() + 1
    }

    /// Picks AND or OR for the effect.  Ignored while the effect has a
    /// single cause.
    pub fn choose_relation(&mut self, relation_type: RelationType) {
        if relation_type != RelationType::Chain {
            self.relation_type = relation_type;
        }
        self.rederive();
    }

    pub fn add_evidence(&mut self, evidence: &str) {
        self.evidence.push(evidence.to_string());
    }

    pub fn submit(&self) -> Result<CreateNodeCommand> {
        let fact = self.fact.trim();
        if fact.is_empty() {
            return tree_err!(Authoring, EmptyFact, "a fact must be described".to_string());
        }

        Ok(CreateNodeCommand {
            fact: fact.to_string(),
            node_type: self.classification.node_type(),
            fact_type: self.fact_type,
            relation_type: derive_relation_type(self.cause_count(), self.relation_type),
            effect_node_id: self.effect_node_id().map(str::to_string),
            link_type: self.link_type,
            co_causes: self.co_causes.clone(),
            evidence: self.evidence.clone(),
        })
    }

    fn load_effect(&mut self, analysis: &CausalTreeAnalysis) {
        let effect = self.effect_node_id().and_then(|id| analysis.get_node(id));
        match effect {
            Some(effect) => {
                self.existing_causes = analysis.cause_index().causes_of(&effect.id).to_vec();
                self.relation_type = effect.relation_type;
                let effect_id = effect.id.clone();
                self.co_causes.retain(|c| c.node_id != effect_id);
            }
            None => {
                self.existing_causes.clear();
                self.co_causes.clear();
                self.relation_type = RelationType::Chain;
            }
        }
        self.rederive();
    }

    fn rederive(&mut self) {
        self.relation_type = derive_relation_type(self.cause_count(), self.relation_type);
    }
}

impl Default for NodeDraft {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;
    use crate::datamodel::{CausalNode, NodeRelation};

    fn analysis() -> CausalTreeAnalysis {
        let mut analysis = CausalTreeAnalysis {
            id: "t".to_string(),
            nodes: vec![
                CausalNode::new("fe", 1, "Caída del operario", NodeType::FinalEvent),
                CausalNode::new("a", 2, "Escalera inestable", NodeType::Intermediate),
                CausalNode::new("b", 3, "Suelo mojado", NodeType::Intermediate),
            ],
            relations: vec![NodeRelation::new("a", "fe", LinkType::Confirmada)],
            ..Default::default()
        };
        analysis.sync_parent_nodes();
        analysis
    }

    #[test]
    fn test_empty_fact_rejected() {
        let mut draft = NodeDraft::new();
        draft.fact = "   ".to_string();
        let err = draft.submit().unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyFact);
    }

    #[test]
    fn test_blank_canvas_without_selection() {
        let mut draft = NodeDraft::new();
        draft.fact = "  Iluminación insuficiente ".to_string();
        let cmd = draft.submit().unwrap();
        assert_eq!(cmd.fact, "Iluminación insuficiente");
        assert_eq!(cmd.effect_node_id, None);
        assert_eq!(cmd.node_type, NodeType::Intermediate);
        assert_eq!(cmd.fact_type, FactType::Variacion);
        assert_eq!(cmd.relation_type, RelationType::Chain);
        assert_eq!(cmd.link_type, LinkType::Confirmada);
    }

    #[test]
    fn test_co_causes_need_an_effect() {
        let analysis = analysis();
        let mut draft = NodeDraft::new();
        let err = draft.add_co_cause(&analysis, "b").unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingEffect);
        assert!(draft.co_causes().is_empty());

        // unchecking the only effect drops the co-causes picked for it
        draft.toggle_effect(&analysis, "a").unwrap();
        draft.add_co_cause(&analysis, "b").unwrap();
        assert_eq!(draft.co_causes().len(), 1);
        draft.toggle_effect(&analysis, "a").unwrap();
        assert_eq!(draft.effect_node_id(), None);
        assert!(draft.co_causes().is_empty());

        draft.fact = "Iluminación insuficiente".to_string();
        assert!(draft.submit().unwrap().co_causes.is_empty());
    }

    #[test]
    fn test_second_cause_switches_effect_to_conjunctive() {
        let analysis = analysis();
        let mut draft = NodeDraft::for_effect(&analysis, "fe").unwrap();
        assert_eq!(draft.cause_count(), 2);
        assert_eq!(draft.relation_type(), RelationType::Conjunctive);

        draft.choose_relation(RelationType::Disjunctive);
        draft.fact = "Calzado inadecuado".to_string();
        draft.classification = Classification::IsRootCause;
        let cmd = draft.submit().unwrap();
        assert_eq!(cmd.effect_node_id.as_deref(), Some("fe"));
        assert_eq!(cmd.relation_type, RelationType::Disjunctive);
        assert_eq!(cmd.node_type, NodeType::RootCause);
    }

    #[test]
    fn test_single_link_forces_chain() {
        let analysis = analysis();
        let mut draft = NodeDraft::for_effect(&analysis, "a").unwrap();
        draft.choose_relation(RelationType::Conjunctive);
        assert_eq!(draft.relation_type(), RelationType::Chain);

        draft.add_co_cause(&analysis, "b").unwrap();
        assert_eq!(draft.cause_count(), 2);
        assert_eq!(draft.relation_type(), RelationType::Conjunctive);

        draft.choose_relation(RelationType::Disjunctive);
        draft.remove_co_cause("b");
        assert_eq!(draft.relation_type(), RelationType::Chain);
    }

    #[test]
    fn test_checklist_first_selection_is_effect() {
        let analysis = analysis();
        let mut draft = NodeDraft::new();
        draft.toggle_effect(&analysis, "b").unwrap();
        draft.toggle_effect(&analysis, "a").unwrap();
        assert_eq!(draft.effect_node_id(), Some("b"));
        assert_eq!(draft.relation_type(), RelationType::Chain);

        draft.toggle_effect(&analysis, "b").unwrap();
        assert_eq!(draft.effect_node_id(), Some("a"));

        let err = draft.toggle_effect(&analysis, "zz").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownNode);
    }

    #[test]
    fn test_co_cause_validation_and_links() {
        let analysis = analysis();
        let mut draft = NodeDraft::for_effect(&analysis, "a").unwrap();
        assert_eq!(
            draft.add_co_cause(&analysis, "fe").unwrap_err().code,
            ErrorCode::SelfReference
        );
        assert_eq!(
            draft.add_co_cause(&analysis, "a").unwrap_err().code,
            ErrorCode::SelfReference
        );

        draft.add_co_cause(&analysis, "b").unwrap();
        draft.add_co_cause(&analysis, "b").unwrap();
        assert_eq!(draft.co_causes().len(), 1);
        assert!(draft.set_co_cause_link("b", LinkType::Aparente));
        assert!(!draft.set_co_cause_link("fe", LinkType::Aparente));

        draft.fact = "Falta de mantenimiento".to_string();
        draft.add_evidence("informe 12");
        draft.add_evidence("informe 12");
        let cmd = draft.submit().unwrap();
        assert_eq!(cmd.co_causes[0].link_type, LinkType::Aparente);
        assert_eq!(cmd.evidence, vec!["informe 12", "informe 12"]);
    }

    #[test]
    fn test_unknown_target() {
        let err = NodeDraft::for_effect(&analysis(), "missing").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownNode);
    }
}
