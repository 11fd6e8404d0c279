// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::controller::{DiagramEdge, DiagramNode};
use crate::datamodel::{FactType, NodeType, Position};
use crate::diagram::arrowhead::render_arrowhead;
use crate::diagram::common::{Rect, escape_xml_attr, escape_xml_text, format_number};
use crate::diagram::constants::*;
use crate::layout::config::LayoutConfig;

// --- Node card ---

pub fn node_bounds(node: &DiagramNode, config: &LayoutConfig) -> Rect {
    Rect::centered(node.position, config.node_width, config.node_height)
}

/// Greedy word wrap.  Words longer than a line are hard-split and the
/// last line gets an ellipsis when the text does not fit.
pub fn wrap_text(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let mut chars: Vec<char> = last.chars().collect();
            chars.truncate(max_chars.saturating_sub(1));
            *last = chars.into_iter().collect::<String>().trim_end().to_string() + "…";
        }
    }
    lines
}

fn node_class(node: &DiagramNode) -> &'static str {
    match node.node_type {
        NodeType::FinalEvent => "arbol-node arbol-final-event",
        NodeType::Intermediate if node.is_root_cause => "arbol-node arbol-root-cause",
        NodeType::Intermediate => "arbol-node arbol-intermediate",
        NodeType::RootCause => "arbol-node arbol-root-cause",
    }
}

pub fn render_node(node: &DiagramNode, config: &LayoutConfig) -> String {
    let b = node_bounds(node, config);
    let mut svg = String::new();

    svg.push_str(&format!(
        "<g class=\"{}\" data-id=\"{}\">",
        node_class(node),
        escape_xml_attr(&node.id)
    ));
    svg.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" ry=\"{}\"></rect>",
        format_number(b.left),
        format_number(b.top),
        format_number(b.width()),
        format_number(b.height()),
        format_number(NODE_CORNER_RADIUS),
        format_number(NODE_CORNER_RADIUS)
    ));

    // header: number on the left, fact type on the right
    let header_y = b.top + NODE_PADDING + 10.0;
    svg.push_str(&format!(
        "<text class=\"arbol-numero\" x=\"{}\" y=\"{}\">#{}</text>",
        format_number(b.left + NODE_PADDING),
        format_number(header_y),
        node.numero
    ));
    let badge = match node.fact_type {
        FactType::Variacion => "V",
        FactType::Permanente => "P",
    };
    svg.push_str(&format!(
        "<text class=\"arbol-fact-type\" x=\"{}\" y=\"{}\">{}</text>",
        format_number(b.right - NODE_PADDING),
        format_number(header_y),
        badge
    ));
    if node.is_root_cause || node.node_type == NodeType::RootCause {
        svg.push_str(&format!(
            "<text class=\"arbol-root-badge\" x=\"{}\" y=\"{}\">causa raíz</text>",
            format_number(b.left + b.width() / 2.0),
            format_number(header_y)
        ));
    }

    let lines = wrap_text(&node.fact, FACT_LINE_CHARS, FACT_MAX_LINES);
    let text_top = b.top + HEADER_HEIGHT + NODE_PADDING;
    svg.push_str(&format!(
        "<text class=\"arbol-fact\" x=\"{}\" y=\"{}\">",
        format_number(node.position.x),
        format_number(text_top)
    ));
    for (i, line) in lines.iter().enumerate() {
        let dy = if i == 0 {
            "1em".to_string()
        } else {
            format!("{}px", LINE_SPACING as i64)
        };
        svg.push_str(&format!(
            "<tspan x=\"{}\" dy=\"{}\">",
            format_number(node.position.x),
            dy
        ));
        svg.push_str(&escape_xml_text(line));
        svg.push_str("</tspan>");
    }
    svg.push_str("</text>");

    if node.evidence_count > 0 {
        svg.push_str(&format!(
            "<text class=\"arbol-evidence\" x=\"{}\" y=\"{}\">{} ev.</text>",
            format_number(b.right - NODE_PADDING),
            format_number(b.bottom - NODE_PADDING),
            node.evidence_count
        ));
    }

    if let Some(symbol) = node.relation_type.symbol() {
        svg.push_str(&render_junction(
            Position::new(node.position.x, b.bottom),
            symbol,
            crate::controller::relation_color(node.relation_type),
        ));
    }

    svg.push_str("</g>");
    svg
}

fn render_junction(center: Position, symbol: char, color: &str) -> String {
    format!(
        "<g class=\"arbol-junction\"><circle cx=\"{}\" cy=\"{}\" r=\"{}\" stroke=\"{}\"></circle><text x=\"{}\" y=\"{}\" fill=\"{}\">{}</text></g>",
        format_number(center.x),
        format_number(center.y),
        format_number(JUNCTION_RADIUS),
        escape_xml_attr(color),
        format_number(center.x),
        format_number(center.y + 4.0),
        escape_xml_attr(color),
        symbol
    )
}

// --- Edge ---

/// Draws an edge from the cause card up to the bottom of its effect, with
/// the arrowhead at the effect.
pub fn render_edge(edge: &DiagramEdge, effect: Position, cause: Position, config: &LayoutConfig) -> String {
    let half_h = config.node_height / 2.0;
    let (sx, sy) = (cause.x, cause.y - half_h);
    let (ex, ey) = (effect.x, effect.y + half_h);
    let my = (sy + ey) / 2.0;

    let path = format!(
        "M{},{}C{},{} {},{} {},{}",
        format_number(sx),
        format_number(sy),
        format_number(sx),
        format_number(my),
        format_number(ex),
        format_number(my),
        format_number(ex),
        format_number(ey)
    );

    let mut class = String::from("arbol-edge");
    if edge.dashed {
        class.push_str(" arbol-edge-dashed");
    }
    if edge.animated {
        class.push_str(" arbol-edge-animated");
    }

    let mut svg = String::new();
    svg.push_str(&format!(
        "<g class=\"{}\" data-id=\"{}\">",
        class,
        escape_xml_attr(&edge.id)
    ));
    svg.push_str(&format!(
        "<path d=\"{}\" stroke=\"{}\"></path>",
        escape_xml_attr(&path),
        escape_xml_attr(edge.color)
    ));
    svg.push_str(&render_arrowhead(ex, ey, 270.0, ARROWHEAD_RADIUS, edge.color));
    if let Some(label) = edge.label {
        svg.push_str(&format!(
            "<text class=\"arbol-edge-label\" x=\"{}\" y=\"{}\" fill=\"{}\">{}</text>",
            format_number((sx + ex) / 2.0),
            format_number(my),
            escape_xml_attr(edge.color),
            label
        ));
    }
    svg.push_str("</g>");
    svg
}
