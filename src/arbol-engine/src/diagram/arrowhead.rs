// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::diagram::common::{escape_xml_attr, format_number};

/// An arrowhead whose tip sits at `(x, y)`, pointing along `angle` degrees
/// (0 points towards +x).
pub fn render_arrowhead(x: f64, y: f64, angle: f64, size: f64, color: &str) -> String {
    let r = size;
    let path = format!(
        "M{},{}L{},{}A{},{} 0 0,1 {},{}z",
        format_number(x),
        format_number(y),
        format_number(x - r),
        format_number(y + r / 2.0),
        format_number(r * 3.0),
        format_number(r * 3.0),
        format_number(x - r),
        format_number(y - r / 2.0)
    );

    let transform = format!(
        "rotate({},{},{})",
        format_number(angle),
        format_number(x),
        format_number(y)
    );

    format!(
        "<path d=\"{}\" class=\"arbol-arrowhead\" fill=\"{}\" stroke=\"{}\" transform=\"{}\"></path>",
        escape_xml_attr(&path),
        escape_xml_attr(color),
        escape_xml_attr(color),
        escape_xml_attr(&transform)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_arrowhead_pointing_up() {
        let svg = render_arrowhead(100.0, 200.0, 270.0, 6.0, "#64748b");
        assert!(svg.contains("arbol-arrowhead"));
        assert!(svg.contains("rotate(270,100,200)"));
        assert!(svg.contains("M100,200L94,203"));
        assert!(svg.contains("fill=\"#64748b\""));
    }
}
