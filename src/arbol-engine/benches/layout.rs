// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Layout and presentation cost for wide and deep trees.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use arbol_engine::datamodel::{
    CausalNode, CausalTreeAnalysis, LinkType, NodeRelation, NodeType,
};
use arbol_engine::diagram::{RenderSurface, render_svg};
use arbol_engine::{DiagramController, LayoutConfig, compute_layout};

/// A tree where every node has `fanout` causes, `levels` deep below the
/// final event, plus one shared cause per level to exercise multi-effect
/// nodes.
fn generated_tree(fanout: usize, levels: usize) -> CausalTreeAnalysis {
    let mut nodes = vec![CausalNode::new("n0", 1, "final", NodeType::FinalEvent)];
    let mut relations = Vec::new();
    let mut frontier = vec!["n0".to_string()];

    for _ in 0..levels {
        let mut next = Vec::new();
        for effect in &frontier {
            for _ in 0..fanout {
                let numero = nodes.len() as u32 + 1;
                let id = format!("n{}", nodes.len());
                nodes.push(CausalNode::new(&id, numero, &id, NodeType::Intermediate));
                relations.push(NodeRelation::new(&id, effect, LinkType::Confirmada));
                next.push(id);
            }
        }
        if let (Some(first), Some(last)) = (next.first(), frontier.last()) {
            relations.push(NodeRelation::new(first, last, LinkType::Aparente));
        }
        frontier = next;
    }

    CausalTreeAnalysis {
        id: "bench".to_string(),
        nodes,
        relations,
        ..Default::default()
    }
}

fn bench_compute_layout(c: &mut Criterion) {
    let config = LayoutConfig::default();
    for (name, fanout, levels) in [("wide", 30, 2), ("deep", 2, 9)] {
        let analysis = generated_tree(fanout, levels);
        c.bench_function(&format!("compute_layout/{name}"), |b| {
            b.iter(|| compute_layout(black_box(&analysis.nodes), black_box(&analysis.relations), &config));
        });
    }
}

fn bench_presentation(c: &mut Criterion) {
    let controller = DiagramController::new(generated_tree(3, 5), false);
    c.bench_function("presentation/3x5", |b| {
        b.iter(|| controller.presentation());
    });

    let model = controller.presentation();
    let surface = RenderSurface::default();
    c.bench_function("render_svg/3x5", |b| {
        b.iter(|| render_svg(black_box(&model), &surface, controller.layout_config()));
    });
}

criterion_group!(benches, bench_compute_layout, bench_presentation);
criterion_main!(benches);
