//! Source paths before sampling.

use alloc::vec::Vec;
use core::f64::consts::TAU;

use super::transform::Affine;
use super::Point;

/// One drawing instruction. All points are absolute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    /// Start a new subpath.
    MoveTo(Point),
    /// Straight line.
    LineTo(Point),
    /// Quadratic Bézier.
    QuadTo {
        /// Control point.
        ctrl: Point,
        /// End point.
        to: Point,
    },
    /// Cubic Bézier.
    CubicTo {
        /// First control point.
        ctrl1: Point,
        /// Second control point.
        ctrl2: Point,
        /// End point.
        to: Point,
    },
    /// Elliptical arc `center + u·cos t + v·sin t` for `t` in
    /// `start .. start + sweep`. `u` and `v` are semi-axis vectors, so any
    /// affine map keeps the form.
    ArcTo {
        /// Ellipse centre.
        center: Point,
        /// First semi-axis vector.
        u: Point,
        /// Second semi-axis vector.
        v: Point,
        /// Start parameter (radians).
        start: f64,
        /// Signed sweep (radians, positive runs from `u` towards `v`).
        sweep: f64,
        /// Exact end point.
        to: Point,
    },
    /// Line back to the subpath start.
    Close,
}

impl Segment {
    fn transformed(&self, m: &Affine) -> Segment {
        match *self {
            Segment::MoveTo(p) => Segment::MoveTo(m.apply(p)),
            Segment::LineTo(p) => Segment::LineTo(m.apply(p)),
            Segment::QuadTo { ctrl, to } => Segment::QuadTo {
                ctrl: m.apply(ctrl),
                to: m.apply(to),
            },
            Segment::CubicTo { ctrl1, ctrl2, to } => Segment::CubicTo {
                ctrl1: m.apply(ctrl1),
                ctrl2: m.apply(ctrl2),
                to: m.apply(to),
            },
            Segment::ArcTo { center, u, v, start, sweep, to } => Segment::ArcTo {
                center: m.apply(center),
                u: m.apply_vector(u),
                v: m.apply_vector(v),
                start,
                sweep,
                to: m.apply(to),
            },
            Segment::Close => Segment::Close,
        }
    }
}

/// A sequence of segments, possibly with several subpaths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// Create an empty path.
    pub const fn new() -> Self {
        Self { segments: Vec::new() }
    }

    /// Segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the path holds any drawable segment.
    pub fn is_empty(&self) -> bool {
        !self.segments.iter().any(|s| !matches!(s, Segment::MoveTo(_)))
    }

    /// Append a raw segment.
    pub fn push(&mut self, segment: Segment) -> &mut Self {
        self.segments.push(segment);
        self
    }

    /// Start a subpath.
    pub fn move_to(&mut self, p: Point) -> &mut Self {
        self.push(Segment::MoveTo(p))
    }

    /// Straight line.
    pub fn line_to(&mut self, p: Point) -> &mut Self {
        self.push(Segment::LineTo(p))
    }

    /// Quadratic Bézier.
    pub fn quad_to(&mut self, ctrl: Point, to: Point) -> &mut Self {
        self.push(Segment::QuadTo { ctrl, to })
    }

    /// Cubic Bézier.
    pub fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) -> &mut Self {
        self.push(Segment::CubicTo { ctrl1, ctrl2, to })
    }

    /// Close the current subpath.
    pub fn close(&mut self) -> &mut Self {
        self.push(Segment::Close)
    }

    /// Closed polyline through `points`.
    pub fn polygon(points: &[Point], closed: bool) -> Self {
        let mut path = Self::new();
        if let Some((&first, rest)) = points.split_first() {
            path.move_to(first);
            for &p in rest {
                path.line_to(p);
            }
            if closed {
                path.close();
            }
        }
        path
    }

    /// Axis-aligned ellipse as one closed arc starting at `(cx + rx, cy)`.
    ///
    /// `clockwise` is relative to a y-up frame.
    pub fn ellipse(center: Point, rx: f64, ry: f64, clockwise: bool) -> Self {
        let start = Point::new(center.x + rx, center.y);
        let sweep = if clockwise { -TAU } else { TAU };

        let mut path = Self::new();
        path.move_to(start).push(Segment::ArcTo {
            center,
            u: Point::new(rx, 0.0),
            v: Point::new(0.0, ry),
            start: 0.0,
            sweep,
            to: start,
        });
        path
    }

    /// Circle as one closed arc starting at `(cx + r, cy)`.
    pub fn circle(center: Point, r: f64, clockwise: bool) -> Self {
        Self::ellipse(center, r, r, clockwise)
    }

    /// Map every point through `m`.
    pub fn transformed(&self, m: &Affine) -> Self {
        Self {
            segments: self.segments.iter().map(|s| s.transformed(m)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_shape() {
        let path = Path::circle(Point::new(50.0, 50.0), 30.0, false);
        assert_eq!(path.segments().len(), 2);
        assert_eq!(path.segments()[0], Segment::MoveTo(Point::new(80.0, 50.0)));
        assert!(!path.is_empty());
    }

    #[test]
    fn test_move_only_is_empty() {
        let mut path = Path::new();
        path.move_to(Point::new(1.0, 1.0));
        assert!(path.is_empty());
    }

    #[test]
    fn test_transformed_arc_keeps_end() {
        let path = Path::circle(Point::new(0.0, 0.0), 1.0, true);
        let moved = path.transformed(&Affine::translate(5.0, 0.0));
        match moved.segments()[1] {
            Segment::ArcTo { center, to, u, .. } => {
                assert_eq!(center, Point::new(5.0, 0.0));
                assert_eq!(to, Point::new(6.0, 0.0));
                assert_eq!(u, Point::new(1.0, 0.0));
            }
            other => panic!("unexpected segment {:?}", other),
        }
    }
}
