// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

/// Layout configuration for the top-down causal tree.
///
/// All spacing and dimension values are in diagram units (1 unit = 1 CSS
/// pixel at zoom 1).
#[derive(Clone, Debug)]
pub struct LayoutConfig {
    // Node card dimensions
    pub node_width: f64,
    pub node_height: f64,

    // Spacing between elements
    /// Horizontal gap between two neighbouring cards in the same row.
    pub horizontal_gap: f64,
    /// Distance between the centres of two consecutive depth rows.
    pub vertical_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 250.0,
            node_height: 110.0,
            horizontal_gap: 60.0,
            vertical_spacing: 180.0,
        }
    }
}

impl LayoutConfig {
    /// Width of a row holding `n` cards.
    pub fn row_width(&self, n: usize) -> f64 {
        if n == 0 {
            return 0.0;
        }
        n as f64 * self.node_width + (n - 1) as f64 * self.horizontal_gap
    }
}
