// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::datamodel::Position;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// The rectangle of size `width` x `height` centred on `center`.
    pub fn centered(center: Position, width: f64, height: f64) -> Self {
        Rect {
            top: center.y - height / 2.0,
            left: center.x - width / 2.0,
            right: center.x + width / 2.0,
            bottom: center.y + height / 2.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn inflate(&self, padding: f64) -> Self {
        Rect {
            top: self.top - padding,
            left: self.left - padding,
            right: self.right + padding,
            bottom: self.bottom + padding,
        }
    }
}

/// Escape text content for XML (inside elements)
pub fn escape_xml_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape attribute values for XML (inside double-quoted attributes)
pub fn escape_xml_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// Formats a coordinate the way browsers serialize numbers: no trailing
/// `.0` for integers and the shortest round-tripping decimal otherwise.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    // beyond 2^53 integers lose precision and `as i64` would saturate
    if n == n.trunc() && n.abs() < 9_007_199_254_740_992.0 {
        return format!("{}", n as i64);
    }
    format!("{}", n)
}

pub fn merge_bounds(a: Rect, b: Rect) -> Rect {
    Rect {
        top: a.top.min(b.top),
        left: a.left.min(b.left),
        right: a.right.max(b.right),
        bottom: a.bottom.max(b.bottom),
    }
}

/// Union of all rectangles, `None` when there are none.
pub fn union_bounds<I: IntoIterator<Item = Rect>>(bounds: I) -> Option<Rect> {
    bounds.into_iter().reduce(merge_bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml_text() {
        assert_eq!(escape_xml_text("hello"), "hello");
        assert_eq!(escape_xml_text("a & b"), "a &amp; b");
        assert_eq!(escape_xml_text("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_xml_text(""), "");
    }

    #[test]
    fn test_escape_xml_attr() {
        assert_eq!(escape_xml_attr("a & b"), "a &amp; b");
        assert_eq!(escape_xml_attr("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(45.0), "45");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-155.0), "-155");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "0");
        assert_eq!(format_number(1e19), format!("{}", 1e19_f64));
        assert_eq!(format_number(-1e20), format!("{}", -1e20_f64));
    }

    #[test]
    fn test_union_bounds() {
        assert!(union_bounds(Vec::new()).is_none());

        let a = Rect::centered(Position::new(0.0, 0.0), 250.0, 110.0);
        let b = Rect::centered(Position::new(310.0, 180.0), 250.0, 110.0);
        let u = union_bounds([a, b]).unwrap();
        assert_eq!(u.left, -125.0);
        assert_eq!(u.top, -55.0);
        assert_eq!(u.right, 435.0);
        assert_eq!(u.bottom, 235.0);
        assert_eq!(u.width(), 560.0);
        assert_eq!(u.inflate(40.0).height(), 370.0);
    }
}
