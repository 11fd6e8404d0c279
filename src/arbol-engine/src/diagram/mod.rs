// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

mod arrowhead;
pub mod common;
pub mod constants;
mod elements;
mod render;
#[cfg(feature = "png_render")]
pub mod render_png;

pub use elements::{node_bounds, wrap_text};
pub use render::{Chrome, RenderSurface, Viewport, render_svg};
