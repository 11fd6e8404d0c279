// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The analysis store boundary.
//!
//! The store owns the persisted analysis; the diagram only ever forwards
//! [`Command`]s and adopts the analysis the store hands back.  [`MemoryStore`]
//! is the in-process reference implementation: every command is applied to
//! a staged copy and committed only when it succeeds, so a rejected command
//! leaves the stored analysis untouched.

use std::collections::{BTreeMap, BTreeSet};

use crate::authoring::CreateNodeCommand;
use crate::capture::CapturedImage;
use crate::common::Result;
use crate::datamodel::{
    AnalysisStatus, CausalNode, CausalTreeAnalysis, FactType, LinkType, MeasureStatus,
    MeasureType, NodeId, NodeRelation, NodeType, Position, PreventiveMeasure, Priority,
    RelationType, derive_relation_type,
};
use crate::layout::compute_depths;
use crate::layout::graph::would_create_cycle;
use crate::tree_err;
use crate::validation::{ValidationCheck, ValidationResult, ValidationService, run_checks};

/// Partial update of a node; `None` fields are left as they are.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct UpdateNodeCommand {
    pub node_id: NodeId,
    pub fact: Option<String>,
    pub node_type: Option<NodeType>,
    pub fact_type: Option<FactType>,
    pub relation_type: Option<RelationType>,
    pub evidence: Option<Vec<String>>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AddMeasureCommand {
    pub node_id: NodeId,
    pub description: String,
    pub priority: Priority,
    pub measure_type: MeasureType,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct UpdateMeasureCommand {
    pub measure_id: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub measure_type: Option<MeasureType>,
    pub status: Option<MeasureStatus>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Command {
    CreateNode(CreateNodeCommand),
    UpdateNode(UpdateNodeCommand),
    DeleteNode {
        node_id: NodeId,
    },
    MarkRootCause {
        node_id: NodeId,
        is_root_cause: bool,
    },
    UpdateNodePosition {
        node_id: NodeId,
        position: Position,
    },
    SetLinkType {
        cause: NodeId,
        effect: NodeId,
        link_type: LinkType,
    },
    AddMeasure(AddMeasureCommand),
    UpdateMeasure(UpdateMeasureCommand),
    DeleteMeasure {
        measure_id: String,
    },
    Complete,
    Review,
    Archive,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateNode(_) => "create_node",
            Command::UpdateNode(_) => "update_node",
            Command::DeleteNode { .. } => "delete_node",
            Command::MarkRootCause { .. } => "mark_root_cause",
            Command::UpdateNodePosition { .. } => "update_node_position",
            Command::SetLinkType { .. } => "set_link_type",
            Command::AddMeasure(_) => "add_measure",
            Command::UpdateMeasure(_) => "update_measure",
            Command::DeleteMeasure { .. } => "delete_measure",
            Command::Complete => "complete",
            Command::Review => "review",
            Command::Archive => "archive",
        }
    }
}

/// Persistence of causal tree analyses.
///
/// `apply` returns the full analysis as it stands after the command, which
/// callers adopt as their new snapshot.  Validation comes from the
/// [`ValidationService`] supertrait.
pub trait AnalysisStore: ValidationService {
    fn analysis(&self, id: &str) -> Result<CausalTreeAnalysis>;
    fn apply(&mut self, id: &str, command: Command) -> Result<CausalTreeAnalysis>;
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AttachmentMetadata {
    pub analysis_id: String,
    pub filename: String,
    pub mime: String,
    pub description: String,
}

impl AttachmentMetadata {
    pub fn for_capture(analysis_id: &str, image: &CapturedImage) -> Self {
        AttachmentMetadata {
            analysis_id: analysis_id.to_string(),
            filename: image.filename.clone(),
            mime: image.mime.to_string(),
            description: "Causal tree diagram".to_string(),
        }
    }
}

/// Destination for exported diagram images.  Returns the attachment id.
pub trait AttachmentSink {
    fn upload(&mut self, image: &CapturedImage, metadata: &AttachmentMetadata) -> Result<String>;
}

#[derive(Clone, Debug)]
struct Entry {
    analysis: CausalTreeAnalysis,
    next_numero: u32,
    next_node: u64,
    next_measure: u64,
}

impl Entry {
    fn new(mut analysis: CausalTreeAnalysis) -> Self {
        if analysis.relations_from_parent_nodes() {
            tracing::debug!(
                analysis = %analysis.id,
                relations = analysis.relations.len(),
                "rebuilt relations from parent_nodes"
            );
        }
        let next_numero = analysis.nodes.iter().map(|n| n.numero).max().unwrap_or(0) + 1;
        Entry {
            next_numero,
            next_node: analysis.nodes.len() as u64 + 1,
            next_measure: analysis.preventive_measures.len() as u64 + 1,
            analysis,
        }
    }

    fn fresh_node_id(&mut self) -> NodeId {
        loop {
            let id = format!("node-{}", self.next_node);
            self.next_node += 1;
            if self.analysis.get_node(&id).is_none() {
                return id;
            }
        }
    }

    fn fresh_measure_id(&mut self) -> String {
        loop {
            let id = format!("measure-{}", self.next_measure);
            self.next_measure += 1;
            if !self.analysis.preventive_measures.iter().any(|m| m.id == id) {
                return id;
            }
        }
    }

    fn take_numero(&mut self) -> u32 {
        let numero = self.next_numero;
        self.next_numero += 1;
        numero
    }
}

/// In-memory [`AnalysisStore`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Entry>,
    next_analysis: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a draft analysis holding only its final event.
    pub fn create_analysis(
        &mut self,
        title: &str,
        problem_statement: &str,
        final_event_fact: &str,
    ) -> Result<CausalTreeAnalysis> {
        let final_event_fact = final_event_fact.trim();
        if final_event_fact.is_empty() {
            return tree_err!(
                Authoring,
                EmptyFact,
                "the final event must be described".to_string()
            );
        }

        let id = loop {
            self.next_analysis += 1;
            let id = format!("analysis-{}", self.next_analysis);
            if !self.entries.contains_key(&id) {
                break id;
            }
        };

        let mut entry = Entry::new(CausalTreeAnalysis {
            id: id.clone(),
            title: title.to_string(),
            problem_statement: problem_statement.to_string(),
            ..Default::default()
        });
        let node_id = entry.fresh_node_id();
        let numero = entry.take_numero();
        entry.analysis.nodes.push(CausalNode::new(
            &node_id,
            numero,
            final_event_fact,
            NodeType::FinalEvent,
        ));

        let analysis = entry.analysis.clone();
        self.entries.insert(id, entry);
        tracing::info!(analysis = %analysis.id, "created causal tree analysis");
        Ok(analysis)
    }

    /// Stores an existing analysis (for example one decoded from JSON),
    /// replacing any analysis with the same id.
    pub fn insert(&mut self, analysis: CausalTreeAnalysis) {
        self.entries
            .insert(analysis.id.clone(), Entry::new(analysis));
    }

    fn entry(&self, id: &str) -> Result<&Entry> {
        match self.entries.get(id) {
            Some(entry) => Ok(entry),
            None => tree_err!(Command, UnknownAnalysis, id.to_string()),
        }
    }
}

impl ValidationService for MemoryStore {
    fn validate(&self, analysis_id: &str, checks: &[ValidationCheck]) -> Result<ValidationResult> {
        let entry = self.entry(analysis_id)?;
        Ok(run_checks(&entry.analysis, checks))
    }
}

impl AnalysisStore for MemoryStore {
    fn analysis(&self, id: &str) -> Result<CausalTreeAnalysis> {
        Ok(self.entry(id)?.analysis.clone())
    }

    fn apply(&mut self, id: &str, command: Command) -> Result<CausalTreeAnalysis> {
        let name = command.name();
        let mut staged = self.entry(id)?.clone();

        if let Err(err) = apply_command(&mut staged, command) {
            tracing::warn!(analysis = id, command = name, error = %err, "rejected command");
            return Err(err);
        }
        normalize(&mut staged.analysis);

        let analysis = staged.analysis.clone();
        self.entries.insert(id.to_string(), staged);
        tracing::info!(analysis = id, command = name, "applied command");
        Ok(analysis)
    }
}

fn apply_command(entry: &mut Entry, command: Command) -> Result<()> {
    match command {
        Command::CreateNode(cmd) => apply_create_node(entry, cmd),
        Command::UpdateNode(cmd) => apply_update_node(&mut entry.analysis, cmd),
        Command::DeleteNode { node_id } => apply_delete_node(&mut entry.analysis, &node_id),
        Command::MarkRootCause {
            node_id,
            is_root_cause,
        } => apply_mark_root_cause(&mut entry.analysis, &node_id, is_root_cause),
        Command::UpdateNodePosition { node_id, position } => {
            let Some(node) = entry.analysis.get_node_mut(&node_id) else {
                return tree_err!(Command, UnknownNode, node_id);
            };
            node.position = position;
            Ok(())
        }
        Command::SetLinkType {
            cause,
            effect,
            link_type,
        } => {
            let mut found = false;
            for rel in entry.analysis.relations.iter_mut() {
                if rel.parent_node_id == cause && rel.child_node_id == effect {
                    rel.link_type = link_type;
                    found = true;
                }
            }
            if !found {
                return tree_err!(Command, DoesNotExist, format!("relation {cause} -> {effect}"));
            }
            Ok(())
        }
        Command::AddMeasure(cmd) => apply_add_measure(entry, cmd),
        Command::UpdateMeasure(cmd) => apply_update_measure(&mut entry.analysis, cmd),
        Command::DeleteMeasure { measure_id } => {
            let measures = &mut entry.analysis.preventive_measures;
            let before = measures.len();
            measures.retain(|m| m.id != measure_id);
            if measures.len() == before {
                return tree_err!(Command, UnknownMeasure, measure_id);
            }
            Ok(())
        }
        Command::Complete => transition(
            &mut entry.analysis,
            &[AnalysisStatus::Draft, AnalysisStatus::InProgress],
            AnalysisStatus::Completed,
        ),
        Command::Review => transition(
            &mut entry.analysis,
            &[AnalysisStatus::Completed],
            AnalysisStatus::Reviewed,
        ),
        Command::Archive => transition(
            &mut entry.analysis,
            &[AnalysisStatus::Completed, AnalysisStatus::Reviewed],
            AnalysisStatus::Archived,
        ),
    }
}

fn transition(
    analysis: &mut CausalTreeAnalysis,
    from: &[AnalysisStatus],
    to: AnalysisStatus,
) -> Result<()> {
    if !from.contains(&analysis.status) {
        return tree_err!(
            Command,
            InvalidStatusTransition,
            format!("{:?} -> {:?}", analysis.status, to)
        );
    }
    analysis.status = to;
    Ok(())
}

fn apply_create_node(entry: &mut Entry, cmd: CreateNodeCommand) -> Result<()> {
    let fact = cmd.fact.trim();
    if fact.is_empty() {
        return tree_err!(Authoring, EmptyFact, "a fact must be described".to_string());
    }
    if cmd.node_type == NodeType::FinalEvent {
        return tree_err!(
            Command,
            FinalEventImmutable,
            "an analysis has exactly one final event".to_string()
        );
    }
    if cmd.effect_node_id.is_none() && !cmd.co_causes.is_empty() {
        return tree_err!(
            Command,
            MissingEffect,
            "co-causes need an effect to be linked to".to_string()
        );
    }

    let node_id = entry.fresh_node_id();
    let analysis = &mut entry.analysis;

    if let Some(effect_id) = &cmd.effect_node_id {
        if analysis.get_node(effect_id).is_none() {
            return tree_err!(Command, UnknownNode, effect_id.clone());
        }
        let index = analysis.cause_index();
        let existing: BTreeSet<&str> =
            index.causes_of(effect_id).iter().map(String::as_str).collect();
        let mut additions = Vec::new();
        for co in &cmd.co_causes {
            let Some(co_node) = analysis.get_node(&co.node_id) else {
                return tree_err!(Command, UnknownNode, co.node_id.clone());
            };
            if co_node.is_final_event() {
                return tree_err!(
                    Command,
                    FinalEventImmutable,
                    "the final event cannot be a cause".to_string()
                );
            }
            if co.node_id == *effect_id {
                return tree_err!(Command, SelfReference, co.node_id.clone());
            }
            if would_create_cycle(&index, &co.node_id, effect_id) {
                return tree_err!(
                    Command,
                    CircularDependency,
                    format!("{} -> {}", co.node_id, effect_id)
                );
            }
            if !existing.contains(co.node_id.as_str()) {
                additions.push(NodeRelation::new(&co.node_id, effect_id, co.link_type));
            }
        }

        analysis.relations.extend(additions);
        analysis
            .relations
            .push(NodeRelation::new(&node_id, effect_id, cmd.link_type));
        if let Some(effect) = analysis.get_node_mut(effect_id) {
            effect.relation_type = cmd.relation_type;
        }
        if analysis.status == AnalysisStatus::Draft {
            analysis.status = AnalysisStatus::InProgress;
        }
    }

    let numero = entry.take_numero();
    let mut node = CausalNode::new(&node_id, numero, fact, cmd.node_type);
    node.fact_type = cmd.fact_type;
    node.evidence = cmd.evidence;
    node.is_root_cause = cmd.node_type == NodeType::RootCause;
    if node.is_root_cause {
        entry.analysis.root_causes.push(node_id.clone());
    }
    entry.analysis.nodes.push(node);
    Ok(())
}

fn apply_update_node(analysis: &mut CausalTreeAnalysis, cmd: UpdateNodeCommand) -> Result<()> {
    let Some(node) = analysis.get_node_mut(&cmd.node_id) else {
        return tree_err!(Command, UnknownNode, cmd.node_id);
    };

    if let Some(node_type) = cmd.node_type {
        if node.is_final_event() != (node_type == NodeType::FinalEvent) {
            return tree_err!(
                Command,
                FinalEventImmutable,
                format!("cannot change the type of {} to {:?}", cmd.node_id, node_type)
            );
        }
        node.node_type = node_type;
    }
    if let Some(fact) = cmd.fact {
        let fact = fact.trim();
        if fact.is_empty() {
            return tree_err!(Authoring, EmptyFact, cmd.node_id);
        }
        node.fact = fact.to_string();
    }
    if let Some(fact_type) = cmd.fact_type {
        node.fact_type = fact_type;
    }
    if let Some(relation_type) = cmd.relation_type {
        node.relation_type = relation_type;
    }
    if let Some(evidence) = cmd.evidence {
        node.evidence = evidence;
    }
    Ok(())
}

fn apply_delete_node(analysis: &mut CausalTreeAnalysis, node_id: &str) -> Result<()> {
    let Some(node) = analysis.get_node(node_id) else {
        return tree_err!(Command, UnknownNode, node_id.to_string());
    };
    if node.is_final_event() {
        return tree_err!(
            Command,
            FinalEventImmutable,
            "the final event cannot be deleted".to_string()
        );
    }

    analysis.nodes.retain(|n| n.id != node_id);
    analysis
        .relations
        .retain(|r| r.parent_node_id != node_id && r.child_node_id != node_id);
    analysis.root_causes.retain(|id| id != node_id);
    analysis.preventive_measures.retain(|m| m.node_id != node_id);
    Ok(())
}

fn apply_mark_root_cause(
    analysis: &mut CausalTreeAnalysis,
    node_id: &str,
    is_root_cause: bool,
) -> Result<()> {
    let Some(node) = analysis.get_node_mut(node_id) else {
        return tree_err!(Command, UnknownNode, node_id.to_string());
    };
    if node.is_final_event() {
        return tree_err!(
            Command,
            FinalEventImmutable,
            "the final event cannot be a root cause".to_string()
        );
    }
    node.is_root_cause = is_root_cause;

    let listed = analysis.root_causes.iter().any(|id| id == node_id);
    if is_root_cause && !listed {
        analysis.root_causes.push(node_id.to_string());
    } else if !is_root_cause {
        analysis.root_causes.retain(|id| id != node_id);
    }
    Ok(())
}

fn apply_add_measure(entry: &mut Entry, cmd: AddMeasureCommand) -> Result<()> {
    if entry.analysis.get_node(&cmd.node_id).is_none() {
        return tree_err!(Command, UnknownNode, cmd.node_id);
    }
    let description = cmd.description.trim();
    if description.is_empty() {
        return tree_err!(
            Authoring,
            EmptyFact,
            "a measure must be described".to_string()
        );
    }
    let id = entry.fresh_measure_id();
    entry.analysis.preventive_measures.push(PreventiveMeasure {
        id,
        description: description.to_string(),
        priority: cmd.priority,
        measure_type: cmd.measure_type,
        status: MeasureStatus::default(),
        node_id: cmd.node_id,
    });
    Ok(())
}

fn apply_update_measure(analysis: &mut CausalTreeAnalysis, cmd: UpdateMeasureCommand) -> Result<()> {
    let Some(measure) = analysis
        .preventive_measures
        .iter_mut()
        .find(|m| m.id == cmd.measure_id)
    else {
        return tree_err!(Command, UnknownMeasure, cmd.measure_id);
    };
    if let Some(description) = cmd.description {
        let description = description.trim();
        if description.is_empty() {
            return tree_err!(Authoring, EmptyFact, cmd.measure_id);
        }
        measure.description = description.to_string();
    }
    if let Some(priority) = cmd.priority {
        measure.priority = priority;
    }
    if let Some(measure_type) = cmd.measure_type {
        measure.measure_type = measure_type;
    }
    if let Some(status) = cmd.status {
        measure.status = status;
    }
    Ok(())
}

/// Refreshes everything derived from the relation list.
fn normalize(analysis: &mut CausalTreeAnalysis) {
    analysis.sync_parent_nodes();
    let depths = compute_depths(&analysis.nodes, &analysis.relations);
    for node in analysis.nodes.iter_mut() {
        node.relation_type = derive_relation_type(node.parent_nodes.len(), node.relation_type);
        node.level = depths.get(&node.id).copied().unwrap_or(0) as u32;
    }
}
