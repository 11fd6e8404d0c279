// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! SVG-to-PNG rasterization using resvg.
//!
//! Text is shaped with whatever fonts the host has installed; the canvas
//! styles fall back to a generic sans-serif family.

use std::sync::Arc;

use resvg::tiny_skia;
use resvg::usvg;

use crate::capture::{RasterImage, Rasterizer};
use crate::common::Result;
use crate::tree_err;

/// The production [`Rasterizer`].
#[derive(Clone)]
pub struct PngRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl PngRasterizer {
    pub fn new() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        PngRasterizer {
            fontdb: Arc::new(fontdb),
        }
    }
}

impl Default for PngRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for PngRasterizer {
    fn rasterize(&self, svg: &str, scale: f64) -> Result<RasterImage> {
        svg_to_png(svg, scale, &self.fontdb)
    }
}

/// Rasterizes an SVG string to PNG bytes at `scale` device pixels per
/// diagram unit, on a white canvas.
pub fn svg_to_png(
    svg_str: &str,
    scale: f64,
    fontdb: &Arc<usvg::fontdb::Database>,
) -> Result<RasterImage> {
    let usvg_opts = usvg::Options {
        font_family: "Arial".to_string(),
        fontdb: Arc::clone(fontdb),
        ..usvg::Options::default()
    };

    let tree = match usvg::Tree::from_str(svg_str, &usvg_opts) {
        Ok(tree) => tree,
        Err(err) => {
            return tree_err!(Capture, RasterizationFailed, format!("failed to parse SVG: {err}"));
        }
    };

    let svg_size = tree.size();
    let scale = scale as f32;
    let px_w = (svg_size.width() * scale).ceil() as u32;
    let px_h = (svg_size.height() * scale).ceil() as u32;
    if px_w == 0 || px_h == 0 {
        return tree_err!(
            Capture,
            RasterizationFailed,
            "computed image dimensions are zero".to_string()
        );
    }

    let Some(mut pixmap) = tiny_skia::Pixmap::new(px_w, px_h) else {
        return tree_err!(
            Capture,
            RasterizationFailed,
            format!("failed to allocate a {px_w}x{px_h} pixmap")
        );
    };
    pixmap.fill(tiny_skia::Color::WHITE);

    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    match pixmap.encode_png() {
        Ok(bytes) => Ok(RasterImage {
            bytes,
            width: px_w,
            height: px_h,
        }),
        Err(err) => tree_err!(Capture, RasterizationFailed, format!("failed to encode PNG: {err}")),
    }
}
