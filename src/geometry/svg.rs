//! SVG input.
//!
//! Only geometry is read. Stroked shapes become [`Path`]s in document user
//! units with all element and group transforms applied.

use alloc::vec::Vec;
use core::str::FromStr;

use roxmltree::{Document, Node, ParsingOptions};
use svgtypes::{Length, PointsParser, SimplePathSegment, SimplifyingPathParser, ViewBox};

use crate::error::{truncated, GeometryError, Result};

use super::path::Path;
use super::transform::Affine;
use super::Point;

/// Elements whose subtrees never render directly.
const NON_RENDERING: [&str; 8] = [
    "defs", "clipPath", "mask", "marker", "pattern", "symbol", "style", "metadata",
];

/// Geometry read from one SVG document.
#[derive(Debug, Clone, Default)]
pub struct SvgDocument {
    /// Stroked shapes in document order.
    pub paths: Vec<Path>,
    /// Document height in user units (`viewBox`, else `height`).
    pub height: Option<f64>,
    /// Shapes skipped because they have `stroke="none"`.
    pub fill_only: usize,
}

/// Parse an SVG document.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidDocument`] for malformed XML and
/// [`GeometryError::InvalidPathData`] for malformed `d` attributes.
pub fn parse_svg(text: &str) -> Result<SvgDocument> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, options)
        .map_err(|e| GeometryError::InvalidDocument(truncated(&e.to_string())))?;

    let root = doc.root_element();
    let mut out = SvgDocument {
        height: document_height(root),
        ..SvgDocument::default()
    };
    walk(root, Affine::IDENTITY, &mut out)?;

    debug!("svg: {} stroked shapes, {} fill-only", out.paths.len(), out.fill_only);
    Ok(out)
}

fn document_height(root: Node) -> Option<f64> {
    if let Some(vb) = root.attribute("viewBox").and_then(|s| ViewBox::from_str(s).ok()) {
        return Some(vb.h);
    }
    length(root, "height")
}

fn walk(node: Node, parent: Affine, out: &mut SvgDocument) -> Result<()> {
    for child in node.children().filter(|n| n.is_element()) {
        let tag = child.tag_name().name();
        if NON_RENDERING.contains(&tag) {
            continue;
        }

        let m = match child.attribute("transform").and_then(|s| svgtypes::Transform::from_str(s).ok()) {
            Some(t) => parent.then_after(&Affine::new(t.a, t.b, t.c, t.d, t.e, t.f)),
            None => parent,
        };

        if let Some(path) = shape(child, tag)? {
            if path.is_empty() {
                continue;
            }
            if stroke_is_none(child) {
                out.fill_only += 1;
                continue;
            }
            out.paths.push(path.transformed(&m));
        } else {
            walk(child, m, out)?;
        }
    }
    Ok(())
}

/// Geometry of a basic shape, or `None` for containers and unknown tags.
fn shape(node: Node, tag: &str) -> Result<Option<Path>> {
    let path = match tag {
        "path" => path_data(node.attribute("d").unwrap_or(""))?,
        "line" => Path::polygon(
            &[
                Point::new(number(node, "x1"), number(node, "y1")),
                Point::new(number(node, "x2"), number(node, "y2")),
            ],
            false,
        ),
        "polyline" | "polygon" => {
            let points: Vec<Point> = PointsParser::from(node.attribute("points").unwrap_or(""))
                .map(|(x, y)| Point::new(x, y))
                .collect();
            Path::polygon(&points, tag == "polygon")
        }
        "rect" => {
            let (x, y) = (number(node, "x"), number(node, "y"));
            let (w, h) = (number(node, "width"), number(node, "height"));
            if w <= 0.0 || h <= 0.0 {
                return Ok(Some(Path::new()));
            }
            Path::polygon(
                &[
                    Point::new(x, y),
                    Point::new(x + w, y),
                    Point::new(x + w, y + h),
                    Point::new(x, y + h),
                ],
                true,
            )
        }
        "circle" => {
            let r = number(node, "r");
            if r <= 0.0 {
                return Ok(Some(Path::new()));
            }
            Path::circle(Point::new(number(node, "cx"), number(node, "cy")), r, false)
        }
        "ellipse" => {
            let (rx, ry) = (number(node, "rx"), number(node, "ry"));
            if rx <= 0.0 || ry <= 0.0 {
                return Ok(Some(Path::new()));
            }
            Path::ellipse(Point::new(number(node, "cx"), number(node, "cy")), rx, ry, false)
        }
        _ => return Ok(None),
    };
    Ok(Some(path))
}

/// Convert `d` to absolute segments. Arcs arrive as cubic curves.
fn path_data(d: &str) -> Result<Path> {
    let mut path = Path::new();
    for segment in SimplifyingPathParser::from(d) {
        let segment = segment.map_err(|e| GeometryError::InvalidPathData(truncated(&e.to_string())))?;
        match segment {
            SimplePathSegment::MoveTo { x, y } => {
                path.move_to(Point::new(x, y));
            }
            SimplePathSegment::LineTo { x, y } => {
                path.line_to(Point::new(x, y));
            }
            SimplePathSegment::CurveTo { x1, y1, x2, y2, x, y } => {
                path.cubic_to(Point::new(x1, y1), Point::new(x2, y2), Point::new(x, y));
            }
            SimplePathSegment::Quadratic { x1, y1, x, y } => {
                path.quad_to(Point::new(x1, y1), Point::new(x, y));
            }
            SimplePathSegment::ClosePath => {
                path.close();
            }
        }
    }
    Ok(path)
}

fn length(node: Node, name: &str) -> Option<f64> {
    node.attribute(name)
        .and_then(|s| Length::from_str(s).ok())
        .map(|l| l.number)
}

fn number(node: Node, name: &str) -> f64 {
    length(node, name).unwrap_or(0.0)
}

/// Whether the nearest `stroke` declaration on the element or an ancestor
/// is `none`. `style` wins over the presentation attribute.
fn stroke_is_none(node: Node) -> bool {
    for n in node.ancestors().filter(|n| n.is_element()) {
        let declared = n
            .attribute("style")
            .and_then(|style| style_value(style, "stroke"))
            .or_else(|| n.attribute("stroke"));
        if let Some(value) = declared {
            return value.trim() == "none";
        }
    }
    false
}

fn style_value<'a>(style: &'a str, key: &str) -> Option<&'a str> {
    style.split(';').find_map(|decl| {
        let (k, v) = decl.split_once(':')?;
        (k.trim() == key).then_some(v)
    })
}
