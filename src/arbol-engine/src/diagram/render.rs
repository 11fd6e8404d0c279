// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeMap;

use crate::controller::DiagramModel;
use crate::datamodel::Position;
use crate::diagram::common::{escape_xml_attr, format_number};
use crate::diagram::constants::{
    CHAIN_COLOR, CONJUNCTIVE_COLOR, DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH,
    DISJUNCTIVE_COLOR,
};
use crate::diagram::elements::{render_edge, render_node};
use crate::layout::config::LayoutConfig;

const RENDER_STYLES: &str = r#"
/* Canvas */
.arbol-canvas text {
  fill: #1e293b;
  font-size: 12px;
  font-family: "Roboto", "Open Sans", "Arial", sans-serif;
  text-anchor: middle;
}

/* Nodes */
.arbol-node rect {
  stroke-width: 1.5px;
  stroke: #94a3b8;
  fill: #ffffff;
}

.arbol-final-event rect {
  stroke-width: 2px;
  stroke: #dc2626;
  fill: #fef2f2;
}

.arbol-root-cause rect {
  stroke-width: 2px;
  stroke: #16a34a;
  fill: #f0fdf4;
}

.arbol-node .arbol-numero {
  font-weight: 700;
  text-anchor: start;
}

.arbol-node .arbol-fact-type,
.arbol-node .arbol-evidence {
  font-size: 10px;
  fill: #64748b;
  text-anchor: end;
}

.arbol-node .arbol-root-badge {
  font-size: 10px;
  fill: #16a34a;
}

.arbol-junction circle {
  stroke-width: 1.5px;
  fill: #ffffff;
}

.arbol-junction text {
  font-weight: 700;
}

/* Edges */
.arbol-edge path {
  stroke-width: 1.5px;
  fill: none;
}

.arbol-edge-dashed path {
  stroke-dasharray: 5px;
}

.arbol-edge-animated path {
  animation: arbol-dash 0.5s linear infinite;
}

@keyframes arbol-dash {
  from { stroke-dashoffset: 10; }
  to { stroke-dashoffset: 0; }
}

.arbol-edge-label {
  font-weight: 700;
}

path.arbol-arrowhead {
  stroke-width: 1px;
  stroke-linejoin: round;
}

/* Chrome */
.arbol-controls rect,
.arbol-legend rect {
  stroke-width: 1px;
  stroke: #cbd5e1;
  fill: #ffffff;
}

.arbol-legend text,
.arbol-attribution text {
  font-size: 10px;
  text-anchor: start;
}
"#;

const Z_MAX: usize = 2;

/// Pan and zoom applied to the diagram content.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Visibility of the interactive overlays drawn on top of the diagram.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Chrome {
    pub controls: bool,
    pub legend: bool,
    pub attribution: bool,
}

impl Chrome {
    pub fn visible() -> Self {
        Chrome {
            controls: true,
            legend: true,
            attribution: true,
        }
    }

    pub fn hidden() -> Self {
        Chrome {
            controls: false,
            legend: false,
            attribution: false,
        }
    }
}

/// State of the surface the diagram is drawn on.
#[derive(Clone, PartialEq, Debug)]
pub struct RenderSurface {
    pub width: f64,
    pub height: f64,
    pub viewport: Viewport,
    pub chrome: Chrome,
    /// Fill painted behind the content; transparent when `None`.
    pub background: Option<String>,
}

impl Default for RenderSurface {
    fn default() -> Self {
        RenderSurface {
            width: DEFAULT_SURFACE_WIDTH,
            height: DEFAULT_SURFACE_HEIGHT,
            viewport: Viewport::default(),
            chrome: Chrome::visible(),
            background: None,
        }
    }
}

pub fn render_svg(model: &DiagramModel, surface: &RenderSurface, config: &LayoutConfig) -> String {
    let positions: BTreeMap<&str, Position> = model
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.position))
        .collect();

    // edges below nodes
    let mut z_layers: Vec<Vec<String>> = vec![Vec::new(); Z_MAX];
    for edge in &model.edges {
        let (Some(effect), Some(cause)) = (
            positions.get(edge.source.as_str()),
            positions.get(edge.target.as_str()),
        ) else {
            continue;
        };
        z_layers[0].push(render_edge(edge, *effect, *cause, config));
    }
    for node in &model.nodes {
        z_layers[1].push(render_node(node, config));
    }

    let width = format_number(surface.width.ceil());
    let height = format_number(surface.height.ceil());

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg width=\"{width}\" height=\"{height}\" xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {width} {height}\" class=\"arbol-canvas\">"
    ));
    svg.push_str("<style>\n");
    svg.push_str(RENDER_STYLES);
    svg.push_str("\n</style>\n");

    if let Some(background) = &surface.background {
        svg.push_str(&format!(
            "<rect class=\"arbol-background\" x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"{}\"></rect>",
            escape_xml_attr(background)
        ));
    }

    let vp = surface.viewport;
    svg.push_str(&format!(
        "<g class=\"arbol-viewport\" transform=\"translate({},{}) scale({})\">",
        format_number(vp.x),
        format_number(vp.y),
        format_number(vp.zoom)
    ));
    for layer in &z_layers {
        for fragment in layer {
            svg.push_str(fragment);
        }
    }
    svg.push_str("</g>");

    svg.push_str(&render_chrome(surface, model.read_only));
    svg.push_str("</svg>");
    svg
}

fn render_chrome(surface: &RenderSurface, read_only: bool) -> String {
    let mut svg = String::new();
    let chrome = surface.chrome;

    if chrome.controls {
        let x = 12.0;
        let buttons: &[&str] = if read_only {
            &["+", "−", "⤢"]
        } else {
            &["+", "−", "⤢", "↺"]
        };
        let y = surface.height - 12.0 - 26.0 * buttons.len() as f64;
        svg.push_str("<g class=\"arbol-controls\">");
        for (i, label) in buttons.iter().enumerate() {
            let by = y + 26.0 * i as f64;
            svg.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"24\" height=\"24\" rx=\"4\"></rect><text x=\"{}\" y=\"{}\">{}</text>",
                format_number(x),
                format_number(by),
                format_number(x + 12.0),
                format_number(by + 16.0),
                label
            ));
        }
        svg.push_str("</g>");
    }

    if chrome.legend {
        let x = surface.width - 172.0;
        let entries = [
            (CHAIN_COLOR, "Cadena"),
            (CONJUNCTIVE_COLOR, "Conjunción (∧)"),
            (DISJUNCTIVE_COLOR, "Disyunción (∨)"),
        ];
        svg.push_str("<g class=\"arbol-legend\">");
        svg.push_str(&format!(
            "<rect x=\"{}\" y=\"12\" width=\"160\" height=\"{}\" rx=\"4\"></rect>",
            format_number(x),
            format_number(12.0 + 18.0 * (entries.len() + 1) as f64)
        ));
        for (i, (color, label)) in entries.iter().enumerate() {
            let y = 32.0 + 18.0 * i as f64;
            svg.push_str(&format!(
                "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"2\"></line><text x=\"{}\" y=\"{}\">{}</text>",
                format_number(x + 10.0),
                format_number(y - 4.0),
                format_number(x + 30.0),
                format_number(y - 4.0),
                color,
                format_number(x + 38.0),
                format_number(y),
                label
            ));
        }
        let y = 32.0 + 18.0 * entries.len() as f64;
        svg.push_str(&format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"2\" stroke-dasharray=\"5\"></line><text x=\"{}\" y=\"{}\">Aparente</text>",
            format_number(x + 10.0),
            format_number(y - 4.0),
            format_number(x + 30.0),
            format_number(y - 4.0),
            CHAIN_COLOR,
            format_number(x + 38.0),
            format_number(y)
        ));
        svg.push_str("</g>");
    }

    if chrome.attribution {
        svg.push_str(&format!(
            "<g class=\"arbol-attribution\"><text x=\"{}\" y=\"{}\">Árbol causal</text></g>",
            format_number(surface.width - 80.0),
            format_number(surface.height - 6.0)
        ));
    }

    svg
}
