// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Interactive diagram state.
//!
//! The controller keeps the last analysis the store confirmed plus a side
//! table of positions the user dragged nodes to.  Every presentation merges
//! that table over a freshly computed layout, so the layout engine stays a
//! pure function and a reset is just clearing the table.

use std::collections::BTreeMap;

use crate::authoring::NodeDraft;
use crate::capture::{CaptureConfig, CapturedImage, Rasterizer, capture_diagram};
use crate::common::Result;
use crate::datamodel::{
    CausalTreeAnalysis, FactType, LinkType, NodeId, NodeType, Position, RelationType,
    derive_relation_type,
};
use crate::diagram::common::union_bounds;
use crate::diagram::constants::{
    CHAIN_COLOR, CONJUNCTIVE_COLOR, DISJUNCTIVE_COLOR, FIT_VIEW_PADDING, MAX_ZOOM, MIN_ZOOM,
};
use crate::diagram::{RenderSurface, Viewport, node_bounds, render_svg};
use crate::layout::compute_layout;
use crate::layout::config::LayoutConfig;
use crate::store::{
    AddMeasureCommand, AnalysisStore, AttachmentMetadata, AttachmentSink, Command,
    UpdateMeasureCommand, UpdateNodeCommand,
};
use crate::tree_err;
use crate::validation::{ValidationCheck, ValidationResult};

/// Which per-node actions the view offers.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct NodeActions {
    pub add_cause: bool,
    pub edit: bool,
    pub delete: bool,
    pub mark_root_cause: bool,
}

#[derive(Clone, PartialEq, Debug)]
pub struct DiagramNode {
    pub id: NodeId,
    pub numero: u32,
    pub fact: String,
    pub node_type: NodeType,
    pub fact_type: FactType,
    /// The relation type implied by the node's actual causes.
    pub relation_type: RelationType,
    pub is_root_cause: bool,
    pub evidence_count: usize,
    pub position: Position,
    /// True when the position comes from a user drag.
    pub dragged: bool,
    pub actions: Option<NodeActions>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct DiagramEdge {
    pub id: String,
    /// The effect.
    pub source: NodeId,
    /// The cause.
    pub target: NodeId,
    pub link_type: LinkType,
    pub dashed: bool,
    pub animated: bool,
    pub label: Option<char>,
    pub color: &'static str,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct DiagramModel {
    pub analysis_id: String,
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
    pub read_only: bool,
    pub layout_version: u64,
}

impl DiagramModel {
    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

pub fn relation_color(relation_type: RelationType) -> &'static str {
    match relation_type {
        RelationType::Chain => CHAIN_COLOR,
        RelationType::Conjunctive => CONJUNCTIVE_COLOR,
        RelationType::Disjunctive => DISJUNCTIVE_COLOR,
    }
}

/// One edge per (effect, direct cause) pair, in node order.
pub fn build_edges(analysis: &CausalTreeAnalysis, read_only: bool) -> Vec<DiagramEdge> {
    let index = analysis.cause_index();
    // first relation wins for duplicated pairs
    let mut link_types: BTreeMap<(&str, &str), LinkType> = BTreeMap::new();
    for r in &analysis.relations {
        link_types
            .entry((r.parent_node_id.as_str(), r.child_node_id.as_str()))
            .or_insert(r.link_type);
    }
    let mut edges = Vec::new();

    for node in &analysis.nodes {
        let causes = index.causes_of(&node.id);
        let relation_type = derive_relation_type(causes.len(), node.relation_type);
        for cause in causes {
            let link_type = link_types
                .get(&(cause.as_str(), node.id.as_str()))
                .copied()
                .unwrap_or_default();
            let aparente = link_type == LinkType::Aparente;
            edges.push(DiagramEdge {
                id: format!("{}->{}", cause, node.id),
                source: node.id.clone(),
                target: cause.clone(),
                link_type,
                dashed: aparente,
                animated: aparente && !read_only,
                label: relation_type.symbol(),
                color: relation_color(relation_type),
            });
        }
    }

    edges
}

pub struct DiagramController {
    analysis: CausalTreeAnalysis,
    user_positions: BTreeMap<NodeId, Position>,
    layout_version: u64,
    read_only: bool,
    config: LayoutConfig,
    surface: RenderSurface,
}

impl DiagramController {
    pub fn new(analysis: CausalTreeAnalysis, read_only: bool) -> Self {
        Self::with_config(analysis, read_only, LayoutConfig::default())
    }

    pub fn with_config(analysis: CausalTreeAnalysis, read_only: bool, config: LayoutConfig) -> Self {
        DiagramController {
            analysis,
            user_positions: BTreeMap::new(),
            layout_version: 0,
            read_only,
            config,
            surface: RenderSurface::default(),
        }
    }

    pub fn analysis(&self) -> &CausalTreeAnalysis {
        &self.analysis
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn user_positions(&self) -> &BTreeMap<NodeId, Position> {
        &self.user_positions
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut RenderSurface {
        &mut self.surface
    }

    pub fn presentation(&self) -> DiagramModel {
        let layout = compute_layout(&self.analysis.nodes, &self.analysis.relations, &self.config);
        let index = self.analysis.cause_index();

        let nodes = self
            .analysis
            .nodes
            .iter()
            .map(|node| {
                let dragged = self.user_positions.get(&node.id).copied();
                let position = dragged
                    .or_else(|| layout.get(&node.id).copied())
                    .unwrap_or_default();
                let actions = (!self.read_only).then(|| NodeActions {
                    add_cause: true,
                    edit: true,
                    delete: !node.is_final_event(),
                    mark_root_cause: !node.is_final_event(),
                });
                DiagramNode {
                    id: node.id.clone(),
                    numero: node.numero,
                    fact: node.fact.clone(),
                    node_type: node.node_type,
                    fact_type: node.fact_type,
                    relation_type: derive_relation_type(
                        index.cause_count(&node.id),
                        node.relation_type,
                    ),
                    is_root_cause: node.is_root_cause,
                    evidence_count: node.evidence.len(),
                    position,
                    dragged: dragged.is_some(),
                    actions,
                }
            })
            .collect();

        tracing::debug!(
            analysis = %self.analysis.id,
            dragged = self.user_positions.len(),
            layout_version = self.layout_version,
            "rebuilt diagram presentation"
        );

        DiagramModel {
            analysis_id: self.analysis.id.clone(),
            nodes,
            edges: build_edges(&self.analysis, self.read_only),
            read_only: self.read_only,
            layout_version: self.layout_version,
        }
    }

    pub fn render_svg(&self) -> String {
        render_svg(&self.presentation(), &self.surface, &self.config)
    }

    /// Adopts a new analysis snapshot, forgetting dragged positions of
    /// nodes that no longer exist.
    pub fn set_analysis(&mut self, analysis: CausalTreeAnalysis) {
        self.user_positions
            .retain(|id, _| analysis.get_node(id).is_some());
        self.analysis = analysis;
    }

    /// Records where the user dropped a node and persists it.
    ///
    /// The dropped position is kept even when the store rejects the update.
    pub fn drag_end<S: AnalysisStore + ?Sized>(
        &mut self,
        store: &mut S,
        node_id: &str,
        position: Position,
    ) -> Result<()> {
        self.ensure_editable()?;
        if self.analysis.get_node(node_id).is_none() {
            return tree_err!(Command, UnknownNode, node_id.to_string());
        }
        self.user_positions.insert(node_id.to_string(), position);
        self.forward(
            store,
            Command::UpdateNodePosition {
                node_id: node_id.to_string(),
                position,
            },
        )
    }

    pub fn reset_layout(&mut self) {
        self.user_positions.clear();
        self.layout_version += 1;
    }

    /// Centres the content in the surface, zooming out if it does not fit.
    pub fn fit_view(&mut self) {
        let model = self.presentation();
        let Some(bounds) = union_bounds(model.nodes.iter().map(|n| node_bounds(n, &self.config)))
        else {
            self.surface.viewport = Viewport::default();
            return;
        };

        let available_w = self.surface.width * (1.0 - 2.0 * FIT_VIEW_PADDING);
        let available_h = self.surface.height * (1.0 - 2.0 * FIT_VIEW_PADDING);
        let zoom = (available_w / bounds.width())
            .min(available_h / bounds.height())
            .clamp(MIN_ZOOM, MAX_ZOOM);
        let cx = (bounds.left + bounds.right) / 2.0;
        let cy = (bounds.top + bounds.bottom) / 2.0;
        self.surface.viewport = Viewport {
            x: self.surface.width / 2.0 - cx * zoom,
            y: self.surface.height / 2.0 - cy * zoom,
            zoom,
        };
    }

    /// Opens a draft for a new cause of `target`, or for a free-standing
    /// fact when `target` is `None`.
    pub fn begin_add_cause(&self, target: Option<&str>) -> Result<NodeDraft> {
        self.ensure_editable()?;
        match target {
            Some(target) => NodeDraft::for_effect(&self.analysis, target),
            None => Ok(NodeDraft::new()),
        }
    }

    pub fn begin_add_node(&self) -> Result<NodeDraft> {
        self.begin_add_cause(None)
    }

    pub fn submit_draft<S: AnalysisStore + ?Sized>(
        &mut self,
        store: &mut S,
        draft: &NodeDraft,
    ) -> Result<()> {
        self.ensure_editable()?;
        let command = draft.submit()?;
        self.forward(store, Command::CreateNode(command))
    }

    pub fn edit_node<S: AnalysisStore + ?Sized>(
        &mut self,
        store: &mut S,
        update: UpdateNodeCommand,
    ) -> Result<()> {
        self.ensure_editable()?;
        self.forward(store, Command::UpdateNode(update))
    }

    pub fn delete_node<S: AnalysisStore + ?Sized>(&mut self, store: &mut S, node_id: &str) -> Result<()> {
        self.ensure_editable()?;
        self.forward(
            store,
            Command::DeleteNode {
                node_id: node_id.to_string(),
            },
        )
    }

    pub fn mark_root_cause<S: AnalysisStore + ?Sized>(
        &mut self,
        store: &mut S,
        node_id: &str,
        is_root_cause: bool,
    ) -> Result<()> {
        self.ensure_editable()?;
        self.forward(
            store,
            Command::MarkRootCause {
                node_id: node_id.to_string(),
                is_root_cause,
            },
        )
    }

    pub fn set_link_type<S: AnalysisStore + ?Sized>(
        &mut self,
        store: &mut S,
        cause: &str,
        effect: &str,
        link_type: LinkType,
    ) -> Result<()> {
        self.ensure_editable()?;
        self.forward(
            store,
            Command::SetLinkType {
                cause: cause.to_string(),
                effect: effect.to_string(),
                link_type,
            },
        )
    }

    pub fn add_measure<S: AnalysisStore + ?Sized>(
        &mut self,
        store: &mut S,
        measure: AddMeasureCommand,
    ) -> Result<()> {
        self.ensure_editable()?;
        self.forward(store, Command::AddMeasure(measure))
    }

    pub fn update_measure<S: AnalysisStore + ?Sized>(
        &mut self,
        store: &mut S,
        update: UpdateMeasureCommand,
    ) -> Result<()> {
        self.ensure_editable()?;
        self.forward(store, Command::UpdateMeasure(update))
    }

    pub fn delete_measure<S: AnalysisStore + ?Sized>(
        &mut self,
        store: &mut S,
        measure_id: &str,
    ) -> Result<()> {
        self.ensure_editable()?;
        self.forward(
            store,
            Command::DeleteMeasure {
                measure_id: measure_id.to_string(),
            },
        )
    }

    /// Asks the store to validate the current analysis.  Allowed on
    /// read-only views.
    pub fn validate<S: AnalysisStore + ?Sized>(
        &self,
        store: &S,
        checks: &[ValidationCheck],
    ) -> Result<ValidationResult> {
        store.validate(&self.analysis.id, checks)
    }

    pub fn complete<S: AnalysisStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        self.ensure_editable()?;
        self.forward(store, Command::Complete)
    }

    /// Renders the whole tree to an image; `None` when there is nothing to
    /// capture or rasterization fails.
    pub fn capture_image<R: Rasterizer + ?Sized>(
        &mut self,
        rasterizer: &R,
        config: &CaptureConfig,
    ) -> Option<CapturedImage> {
        let model = self.presentation();
        capture_diagram(&model, &mut self.surface, &self.config, rasterizer, config)
    }

    /// Captures the diagram and uploads it as an attachment of the
    /// analysis.  `Ok(None)` when there was nothing to capture.
    pub fn attach_capture<R: Rasterizer + ?Sized, A: AttachmentSink + ?Sized>(
        &mut self,
        rasterizer: &R,
        sink: &mut A,
        config: &CaptureConfig,
    ) -> Result<Option<String>> {
        let Some(image) = self.capture_image(rasterizer, config) else {
            return Ok(None);
        };
        let metadata = AttachmentMetadata::for_capture(&self.analysis.id, &image);
        sink.upload(&image, &metadata).map(Some)
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.read_only {
            return tree_err!(Command, ReadOnly, self.analysis.id.clone());
        }
        Ok(())
    }

    fn forward<S: AnalysisStore + ?Sized>(&mut self, store: &mut S, command: Command) -> Result<()> {
        let analysis = store.apply(&self.analysis.id, command)?;
        self.set_analysis(analysis);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;
    use crate::datamodel::{CausalNode, NodeRelation};
    use crate::store::MemoryStore;

    fn analysis_with_duplicates() -> CausalTreeAnalysis {
        CausalTreeAnalysis {
            id: "a1".to_string(),
            nodes: vec![
                CausalNode::new("fe", 1, "Corte en la mano", NodeType::FinalEvent),
                CausalNode::new("a", 2, "Guante roto", NodeType::Intermediate),
                CausalNode::new("b", 3, "Cuchilla sin protección", NodeType::Intermediate),
            ],
            relations: vec![
                NodeRelation::new("a", "fe", LinkType::Confirmada),
                NodeRelation::new("a", "fe", LinkType::Confirmada),
                NodeRelation::new("b", "fe", LinkType::Aparente),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_edges_are_unique_and_labelled() {
        let edges = build_edges(&analysis_with_duplicates(), false);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].source, "fe");
        assert_eq!(edges[0].target, "a");
        assert_eq!(edges[0].label, Some('∧'));
        assert_eq!(edges[0].color, CONJUNCTIVE_COLOR);
        assert!(!edges[0].dashed);
        assert!(edges[1].dashed);
        assert!(edges[1].animated);

        let read_only = build_edges(&analysis_with_duplicates(), true);
        assert!(read_only[1].dashed);
        assert!(!read_only[1].animated);
    }

    #[test]
    fn test_edge_link_type_from_first_relation() {
        let mut analysis = analysis_with_duplicates();
        analysis.relations[0].link_type = LinkType::Aparente;
        let edges = build_edges(&analysis, false);
        assert_eq!(edges[0].link_type, LinkType::Aparente);
        assert!(edges[0].dashed);
        assert_eq!(edges[1].link_type, LinkType::Aparente);

        // parent_nodes fallback has no relation to read a link type from
        analysis.relations.clear();
        analysis.nodes[0].parent_nodes = vec!["a".to_string(), "b".to_string()];
        let edges = build_edges(&analysis, false);
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.link_type == LinkType::default()));
    }

    #[test]
    fn test_presentation_effective_relation_type() {
        let mut analysis = analysis_with_duplicates();
        analysis.nodes[0].relation_type = RelationType::Chain;
        analysis.nodes[1].relation_type = RelationType::Disjunctive;
        let controller = DiagramController::new(analysis, false);
        let model = controller.presentation();
        assert_eq!(model.node("fe").unwrap().relation_type, RelationType::Conjunctive);
        assert_eq!(model.node("a").unwrap().relation_type, RelationType::Chain);
    }

    #[test]
    fn test_actions() {
        let controller = DiagramController::new(analysis_with_duplicates(), false);
        let model = controller.presentation();
        let fe = model.node("fe").unwrap().actions.unwrap();
        assert!(fe.add_cause && fe.edit);
        assert!(!fe.delete && !fe.mark_root_cause);
        assert!(model.node("a").unwrap().actions.unwrap().delete);

        let controller = DiagramController::new(analysis_with_duplicates(), true);
        assert!(controller.presentation().nodes.iter().all(|n| n.actions.is_none()));
    }

    #[test]
    fn test_set_analysis_drops_stale_positions() {
        let mut controller = DiagramController::new(analysis_with_duplicates(), false);
        controller
            .user_positions
            .insert("a".to_string(), Position::new(1.0, 2.0));
        controller
            .user_positions
            .insert("b".to_string(), Position::new(3.0, 4.0));

        let mut next = analysis_with_duplicates();
        next.nodes.retain(|n| n.id != "b");
        next.relations.retain(|r| r.parent_node_id != "b");
        controller.set_analysis(next);

        assert_eq!(controller.user_positions().len(), 1);
        assert!(controller.presentation().node("a").unwrap().dragged);
    }

    #[test]
    fn test_read_only_rejects_mutations() {
        let mut store = MemoryStore::new();
        let analysis = store.create_analysis("t", "p", "Evento").unwrap();
        let fe = analysis.nodes[0].id.clone();
        let mut controller = DiagramController::new(analysis, true);

        assert_eq!(
            controller.begin_add_node().unwrap_err().code,
            ErrorCode::ReadOnly
        );
        assert_eq!(
            controller
                .drag_end(&mut store, &fe, Position::new(1.0, 1.0))
                .unwrap_err()
                .code,
            ErrorCode::ReadOnly
        );
        assert_eq!(
            controller.complete(&mut store).unwrap_err().code,
            ErrorCode::ReadOnly
        );
        assert!(controller.user_positions().is_empty());
        assert!(controller.validate(&store, &[ValidationCheck::Logic]).is_ok());
    }

    #[test]
    fn test_failed_command_keeps_snapshot() {
        let mut store = MemoryStore::new();
        let analysis = store.create_analysis("t", "p", "Evento").unwrap();
        let fe = analysis.nodes[0].id.clone();
        let mut controller = DiagramController::new(analysis.clone(), false);

        let err = controller.delete_node(&mut store, &fe).unwrap_err();
        assert_eq!(err.code, ErrorCode::FinalEventImmutable);
        assert_eq!(controller.analysis(), &analysis);
    }

    #[test]
    fn test_fit_view_centres_content() {
        let mut controller = DiagramController::new(analysis_with_duplicates(), false);
        controller.fit_view();
        let viewport = controller.surface().viewport;
        assert!(viewport.zoom > 0.0 && viewport.zoom <= MAX_ZOOM);

        // the final event sits at x = 0, which lands on the horizontal centre
        let centre = controller.surface().width / 2.0;
        assert!((viewport.x - centre).abs() < 1e-9);
    }
}
