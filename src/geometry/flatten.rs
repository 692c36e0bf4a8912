//! Curve sampling.
//!
//! Curves are subdivided until consecutive samples lie at most `chord`
//! apart. Straight segments contribute their end point only.

use alloc::vec::Vec;

use super::path::{Path, Segment};
use super::Point;

/// Subdivision depth limit for Bézier splitting (2^20 pieces per segment).
const MAX_DEPTH: u32 = 20;

/// Sample every subpath of `path` into a polyline.
///
/// Subpaths with fewer than two distinct points are dropped.
pub fn flatten(path: &Path, chord: f64) -> Vec<Vec<Point>> {
    let mut out = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut start = Point::default();

    for segment in path.segments() {
        match *segment {
            Segment::MoveTo(p) => {
                finish(&mut out, &mut current);
                start = p;
                current.push(p);
            }
            Segment::LineTo(p) => {
                begin(&mut current, start);
                current.push(p);
            }
            Segment::QuadTo { ctrl, to } => {
                let from = begin(&mut current, start);
                // Quadratics are elevated to cubics.
                let c1 = from.lerp(&ctrl, 2.0 / 3.0);
                let c2 = to.lerp(&ctrl, 2.0 / 3.0);
                cubic(&mut current, [from, c1, c2, to], chord, 0);
            }
            Segment::CubicTo { ctrl1, ctrl2, to } => {
                let from = begin(&mut current, start);
                cubic(&mut current, [from, ctrl1, ctrl2, to], chord, 0);
            }
            Segment::ArcTo { center, u, v, start: t0, sweep, to } => {
                begin(&mut current, start);
                arc(&mut current, center, u, v, t0, sweep, to, chord);
            }
            Segment::Close => {
                if current.len() > 1 && current.last() != Some(&start) {
                    current.push(start);
                }
            }
        }
    }
    finish(&mut out, &mut current);
    out
}

/// Ensure the polyline has a start point and return its last point.
fn begin(current: &mut Vec<Point>, start: Point) -> Point {
    match current.last() {
        Some(&p) => p,
        None => {
            current.push(start);
            start
        }
    }
}

fn finish(out: &mut Vec<Vec<Point>>, current: &mut Vec<Point>) {
    let pts = core::mem::take(current);
    if pts.windows(2).any(|w| w[0] != w[1]) {
        out.push(pts);
    }
}

/// De Casteljau splitting until the control polygon is within `chord`.
///
/// The chord between the end points never exceeds the control polygon
/// length, so each emitted step is bounded.
fn cubic(out: &mut Vec<Point>, c: [Point; 4], chord: f64, depth: u32) {
    let polygon = c[0].distance(&c[1]) + c[1].distance(&c[2]) + c[2].distance(&c[3]);
    if polygon <= chord || depth >= MAX_DEPTH {
        out.push(c[3]);
        return;
    }

    let p01 = c[0].midpoint(&c[1]);
    let p12 = c[1].midpoint(&c[2]);
    let p23 = c[2].midpoint(&c[3]);
    let p012 = p01.midpoint(&p12);
    let p123 = p12.midpoint(&p23);
    let mid = p012.midpoint(&p123);

    cubic(out, [c[0], p01, p012, mid], chord, depth + 1);
    cubic(out, [mid, p123, p23, c[3]], chord, depth + 1);
}

/// Uniform parameter steps sized by the peak speed of `u·cos t + v·sin t`.
///
/// That speed is the largest singular value of the matrix `[u v]`, which
/// covers skewed and non-uniformly scaled ellipses where `u` and `v` are not
/// orthogonal. A step of `dt` moves at most `speed·dt`, so the step count
/// keeps every chord within `chord`. The last point is `to` exactly.
#[allow(clippy::too_many_arguments)]
fn arc(out: &mut Vec<Point>, center: Point, u: Point, v: Point, t0: f64, sweep: f64, to: Point, chord: f64) {
    let reach = peak_speed(u, v);
    let steps = libm::ceil(libm::fabs(sweep) * reach / chord);
    let steps = if steps.is_finite() && steps >= 1.0 { steps as usize } else { 1 };

    for i in 1..steps {
        let t = t0 + sweep * (i as f64 / steps as f64);
        let (s, c) = (libm::sin(t), libm::cos(t));
        out.push(Point::new(
            center.x + u.x * c + v.x * s,
            center.y + u.y * c + v.y * s,
        ));
    }
    out.push(to);
}

fn peak_speed(u: Point, v: Point) -> f64 {
    let (uu, vv, uv) = (u.dot(&u), v.dot(&v), u.dot(&v));
    let half_diff = (uu - vv) / 2.0;
    libm::sqrt((uu + vv) / 2.0 + libm::sqrt(half_diff * half_diff + uv * uv))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_step(pts: &[Point]) -> f64 {
        pts.windows(2).map(|w| w[0].distance(&w[1])).fold(0.0, f64::max)
    }

    #[test]
    fn test_lines_not_subdivided() {
        let path = Path::polygon(&[Point::new(0.0, 0.0), Point::new(100.0, 0.0)], false);
        let lines = flatten(&path, 0.1);
        assert_eq!(lines, [[Point::new(0.0, 0.0), Point::new(100.0, 0.0)]]);
    }

    #[test]
    fn test_circle_bounded_and_closed() {
        let path = Path::circle(Point::new(50.0, 50.0), 30.0, false);
        let lines = flatten(&path, 1.0);

        assert_eq!(lines.len(), 1);
        let pts = &lines[0];
        assert!(max_step(pts) <= 1.0);
        assert_eq!(pts.first(), pts.last());
        for p in pts {
            assert!((p.distance(&Point::new(50.0, 50.0)) - 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_skewed_circle_bounded() {
        use crate::geometry::Affine;

        // skewX(45)
        let skew = Affine::new(1.0, 0.0, 1.0, 1.0, 0.0, 0.0);
        let path = Path::circle(Point::new(50.0, 50.0), 30.0, false).transformed(&skew);
        let lines = flatten(&path, 1.0);

        assert!(max_step(&lines[0]) <= 1.0);
    }

    #[test]
    fn test_peak_speed_orthogonal() {
        let speed = peak_speed(Point::new(3.0, 0.0), Point::new(0.0, 2.0));
        assert!((speed - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_cubic_bounded() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0)).cubic_to(
            Point::new(0.0, 40.0),
            Point::new(60.0, -40.0),
            Point::new(60.0, 0.0),
        );
        let lines = flatten(&path, 0.5);
        assert!(max_step(&lines[0]) <= 0.5);
        assert_eq!(lines[0].last(), Some(&Point::new(60.0, 0.0)));
    }

    #[test]
    fn test_close_and_subpaths() {
        let mut path = Path::polygon(
            &[Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)],
            true,
        );
        path.move_to(Point::new(5.0, 5.0)).line_to(Point::new(6.0, 5.0));
        path.move_to(Point::new(9.0, 9.0));

        let lines = flatten(&path, 1.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 4);
        assert_eq!(lines[0][3], Point::new(0.0, 0.0));
    }
}
