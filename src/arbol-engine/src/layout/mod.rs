// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Top-down causal tree layout.
//!
//! The final event sits at depth 0 and each "why?" step moves one row down.
//! Depths come from a breadth-first walk over cause edges; each row is
//! packed left to right by `numero` and centred on x = 0.  The layout is a
//! pure function of its inputs and is cheap enough to recompute on every
//! structural change.

pub mod config;
pub mod graph;

use std::collections::BTreeMap;

use crate::datamodel::{CausalNode, CauseIndex, NodeId, NodeRelation};

use self::config::LayoutConfig;
use self::graph::{Layout, Position, assign_depths};

/// Depth of every node, keyed by id.
pub fn compute_depths(nodes: &[CausalNode], relations: &[NodeRelation]) -> BTreeMap<NodeId, usize> {
    let index = CauseIndex::build(nodes, relations);
    assign_depths(nodes, &index)
}

/// Computes a position for every node in `nodes`.
pub fn compute_layout(
    nodes: &[CausalNode],
    relations: &[NodeRelation],
    config: &LayoutConfig,
) -> Layout {
    let depths = compute_depths(nodes, relations);

    let mut rows: BTreeMap<usize, Vec<&CausalNode>> = BTreeMap::new();
    for node in nodes {
        let depth = depths.get(&node.id).copied().unwrap_or(0);
        rows.entry(depth).or_default().push(node);
    }

    let mut layout = Layout::new();
    for (depth, row) in rows.iter_mut() {
        row.sort_by(|a, b| a.numero.cmp(&b.numero).then_with(|| a.id.cmp(&b.id)));

        let total_width = config.row_width(row.len());
        let row_start = -total_width / 2.0;
        let stride = config.node_width + config.horizontal_gap;
        let y = *depth as f64 * config.vertical_spacing;

        for (i, node) in row.iter().enumerate() {
            let x = row_start + i as f64 * stride + config.node_width / 2.0;
            layout.insert(node.id.clone(), Position::new(x, y));
        }
    }

    tracing::debug!(
        nodes = nodes.len(),
        relations = relations.len(),
        rows = rows.len(),
        "computed causal tree layout"
    );

    layout
}
