// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Construction, layout and image export of causal trees ("árbol causal")
//! for incident investigations.

#![forbid(unsafe_code)]

pub mod authoring;
pub mod capture;
pub mod common;
pub mod controller;
pub mod datamodel;
pub mod diagram;
pub mod json;
#[cfg(test)]
mod json_proptest;
pub mod layout;
pub mod store;
pub mod validation;

pub use self::authoring::{Classification, CreateNodeCommand, NodeDraft};
pub use self::capture::{CaptureConfig, CapturedImage, RasterImage, Rasterizer};
pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::controller::{DiagramController, DiagramEdge, DiagramModel, DiagramNode};
#[cfg(feature = "png_render")]
pub use self::diagram::render_png::PngRasterizer;
pub use self::layout::config::LayoutConfig;
pub use self::layout::{compute_depths, compute_layout};
pub use self::store::{AnalysisStore, AttachmentSink, Command, MemoryStore};
pub use self::validation::{ValidationCheck, ValidationResult, ValidationService};
