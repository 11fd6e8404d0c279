// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Static image export of the whole diagram.
//!
//! Capturing temporarily reshapes the render surface so the complete tree
//! fits at zoom 1 without any overlays, renders it, and hands the SVG to a
//! [`Rasterizer`].  The surface is put back by [`SurfaceOverride`]'s `Drop`,
//! so the visible view is unchanged however the capture ends.

use std::ops::Deref;

use crate::common::Result;
use crate::controller::DiagramModel;
use crate::diagram::common::{Rect, union_bounds};
use crate::diagram::{Chrome, RenderSurface, Viewport, node_bounds, render_svg};
use crate::layout::config::LayoutConfig;

pub const PNG_MIME: &str = "image/png";

#[derive(Clone, PartialEq, Debug)]
pub struct CaptureConfig {
    /// Margin around the content, in diagram units.
    pub padding: f64,
    /// Device pixels per diagram unit; clamped to `2.0..=3.0`.
    pub scale: f64,
    pub background: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            padding: 40.0,
            scale: 2.0,
            background: "#ffffff".to_string(),
        }
    }
}

impl CaptureConfig {
    pub fn effective_scale(&self) -> f64 {
        if self.scale.is_nan() {
            return 2.0;
        }
        self.scale.clamp(2.0, 3.0)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RasterImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub mime: &'static str,
    pub filename: String,
}

/// Turns a rendered SVG document into image bytes.
pub trait Rasterizer {
    fn rasterize(&self, svg: &str, scale: f64) -> Result<RasterImage>;
}

/// Union of all node cards, `None` for an empty diagram.
pub fn content_bounds(model: &DiagramModel, config: &LayoutConfig) -> Option<Rect> {
    union_bounds(model.nodes.iter().map(|n| node_bounds(n, config)))
}

/// Scoped replacement of the render surface state.
pub struct SurfaceOverride<'a> {
    surface: &'a mut RenderSurface,
    saved: RenderSurface,
}

impl<'a> SurfaceOverride<'a> {
    /// Sizes the surface to `bounds` plus `padding` on every side, at zoom 1
    /// with the content shifted into view, and hides every overlay.
    pub fn fit_content(
        surface: &'a mut RenderSurface,
        bounds: Rect,
        padding: f64,
        background: &str,
    ) -> Self {
        let saved = surface.clone();
        let padded = bounds.inflate(padding);
        *surface = RenderSurface {
            width: padded.width(),
            height: padded.height(),
            viewport: Viewport {
                x: -padded.left,
                y: -padded.top,
                zoom: 1.0,
            },
            chrome: Chrome::hidden(),
            background: Some(background.to_string()),
        };
        SurfaceOverride { surface, saved }
    }
}

impl Deref for SurfaceOverride<'_> {
    type Target = RenderSurface;

    fn deref(&self) -> &RenderSurface {
        &*self.surface
    }
}

impl Drop for SurfaceOverride<'_> {
    fn drop(&mut self) {
        *self.surface = self.saved.clone();
    }
}

pub fn suggested_filename(analysis_id: &str, timestamp_millis: i64) -> String {
    format!("arbol-causal-{analysis_id}-{timestamp_millis}.png")
}

pub fn suggested_filename_now(analysis_id: &str) -> String {
    suggested_filename(analysis_id, chrono::Utc::now().timestamp_millis())
}

/// Renders `model` to an image.  Failures are logged and reported as
/// `None`; `surface` is restored before returning.
pub fn capture_diagram<R: Rasterizer + ?Sized>(
    model: &DiagramModel,
    surface: &mut RenderSurface,
    layout: &LayoutConfig,
    rasterizer: &R,
    config: &CaptureConfig,
) -> Option<CapturedImage> {
    let Some(bounds) = content_bounds(model, layout) else {
        tracing::warn!(analysis = %model.analysis_id, "nothing to capture: diagram has no nodes");
        return None;
    };

    let scale = config.effective_scale();
    let result = {
        let overridden = SurfaceOverride::fit_content(surface, bounds, config.padding, &config.background);
        let svg = render_svg(model, &overridden, layout);
        rasterizer.rasterize(&svg, scale)
    };

    match result {
        Ok(image) => {
            tracing::debug!(
                analysis = %model.analysis_id,
                width = image.width,
                height = image.height,
                "captured diagram image"
            );
            Some(CapturedImage {
                bytes: image.bytes,
                width: image.width,
                height: image.height,
                mime: PNG_MIME,
                filename: suggested_filename_now(&model.analysis_id),
            })
        }
        Err(err) => {
            tracing::warn!(analysis = %model.analysis_id, error = %err, "diagram capture failed");
            None
        }
    }
}
