// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

pub const NODE_CORNER_RADIUS: f64 = 8.0;
pub const NODE_PADDING: f64 = 10.0;
pub const HEADER_HEIGHT: f64 = 22.0;
pub const LINE_SPACING: f64 = 16.0;
pub const FACT_LINE_CHARS: usize = 34;
pub const FACT_MAX_LINES: usize = 3;
pub const ARROWHEAD_RADIUS: f64 = 6.0;
pub const JUNCTION_RADIUS: f64 = 10.0;

pub const CHAIN_COLOR: &str = "#64748b"; // slate
pub const CONJUNCTIVE_COLOR: &str = "#3b82f6"; // blue
pub const DISJUNCTIVE_COLOR: &str = "#f59e0b"; // amber

pub const DEFAULT_SURFACE_WIDTH: f64 = 1200.0;
pub const DEFAULT_SURFACE_HEIGHT: f64 = 800.0;
pub const FIT_VIEW_PADDING: f64 = 0.1;
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 2.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_lines_fit_in_card() {
        let needed = HEADER_HEIGHT + FACT_MAX_LINES as f64 * LINE_SPACING + NODE_PADDING;
        assert!(needed <= crate::layout::config::LayoutConfig::default().node_height);
    }
}
