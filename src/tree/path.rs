//! Link path geometry
//!
//! Two connector styles between a parent and a child anchor:
//! - orthogonal "org-chart" links: down to the vertical midpoint, across, down
//! - vertical cubic Bézier links (tangent to the vertical axis at both ends)

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A renderable connector path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkPath {
    /// source, corner at mid height below source, corner at mid height above target, target
    Orthogonal([Point; 4]),
    Curve {
        start: Point,
        c1: Point,
        c2: Point,
        end: Point,
    },
}

/// Build the connector between two anchors.
///
/// Coincident points give a zero-length path, never an error.
pub fn build_path(source: Point, target: Point, straight: bool) -> LinkPath {
    let mid_y = (source.y + target.y) / 2.0;
    if straight {
        LinkPath::Orthogonal([
            source,
            Point::new(source.x, mid_y),
            Point::new(target.x, mid_y),
            target,
        ])
    } else {
        LinkPath::Curve {
            start: source,
            c1: Point::new(source.x, mid_y),
            c2: Point::new(target.x, mid_y),
            end: target,
        }
    }
}

impl LinkPath {
    pub fn start(&self) -> Point {
        match self {
            LinkPath::Orthogonal(points) => points[0],
            LinkPath::Curve { start, .. } => *start,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            LinkPath::Orthogonal(points) => points[3],
            LinkPath::Curve { end, .. } => *end,
        }
    }

    /// Straight segments of an orthogonal path; empty for curves
    #[cfg(test)]
    pub fn segments(&self) -> Vec<(Point, Point)> {
        match self {
            LinkPath::Orthogonal(p) => vec![(p[0], p[1]), (p[1], p[2]), (p[2], p[3])],
            LinkPath::Curve { .. } => Vec::new(),
        }
    }

    /// Apply `f` to every control point
    pub fn map(self, f: impl Fn(Point) -> Point) -> Self {
        match self {
            LinkPath::Orthogonal(p) => LinkPath::Orthogonal([f(p[0]), f(p[1]), f(p[2]), f(p[3])]),
            LinkPath::Curve { start, c1, c2, end } => LinkPath::Curve {
                start: f(start),
                c1: f(c1),
                c2: f(c2),
                end: f(end),
            },
        }
    }

    /// Polyline approximation with `steps` pieces per curve or segment
    pub fn sample(&self, steps: usize) -> Vec<Point> {
        let steps = steps.max(1);
        let mut out = Vec::with_capacity(steps * 3 + 1);
        match self {
            LinkPath::Orthogonal(p) => {
                out.push(p[0]);
                for (a, b) in [(p[0], p[1]), (p[1], p[2]), (p[2], p[3])] {
                    for i in 1..=steps {
                        let t = i as f64 / steps as f64;
                        out.push(Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t));
                    }
                }
            }
            LinkPath::Curve { start, c1, c2, end } => {
                for i in 0..=steps {
                    out.push(cubic(*start, *c1, *c2, *end, i as f64 / steps as f64));
                }
            }
        }
        out
    }

    /// SVG path data
    pub fn to_svg(&self) -> String {
        let mut d = String::with_capacity(64);
        match self {
            LinkPath::Orthogonal(p) => {
                let _ = write!(
                    d,
                    "M{},{} L{},{} L{},{} L{},{}",
                    p[0].x, p[0].y, p[1].x, p[1].y, p[2].x, p[2].y, p[3].x, p[3].y
                );
            }
            LinkPath::Curve { start, c1, c2, end } => {
                let _ = write!(
                    d,
                    "M{},{} C{},{} {},{} {},{}",
                    start.x, start.y, c1.x, c1.y, c2.x, c2.y, end.x, end.y
                );
            }
        }
        d
    }
}

fn cubic(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal_segments(path: &LinkPath) -> usize {
        path.segments()
            .iter()
            .filter(|(a, b)| a.y == b.y && a.x != b.x)
            .count()
    }

    #[test]
    fn test_orthogonal_endpoints_and_shape() {
        let source = Point::new(10.0, 0.0);
        let target = Point::new(-240.0, 275.0);
        let path = build_path(source, target, true);

        assert_eq!(path.start(), source);
        assert_eq!(path.end(), target);
        assert_eq!(horizontal_segments(&path), 1);

        let segs = path.segments();
        assert_eq!(segs[0].0.x, segs[0].1.x);
        assert_eq!(segs[2].0.x, segs[2].1.x);
        assert_eq!(segs[1].0.y, 137.5);
    }

    #[test]
    fn test_orthogonal_vertically_aligned() {
        let path = build_path(Point::new(5.0, 0.0), Point::new(5.0, 100.0), true);
        assert_eq!(path.start(), Point::new(5.0, 0.0));
        assert_eq!(path.end(), Point::new(5.0, 100.0));
        // The middle segment exists but has zero length
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.segments()[1].0.y, path.segments()[1].1.y);
    }

    #[test]
    fn test_curve_tangent_to_vertical() {
        let path = build_path(Point::new(0.0, 0.0), Point::new(100.0, 200.0), false);
        match path {
            LinkPath::Curve { start, c1, c2, end } => {
                assert_eq!(c1.x, start.x);
                assert_eq!(c2.x, end.x);
                assert_eq!(c1.y, 100.0);
                assert_eq!(c2.y, 100.0);
            }
            _ => panic!("expected curve"),
        }
        let pts = path.sample(8);
        assert_eq!(pts.first().copied(), Some(Point::new(0.0, 0.0)));
        assert_eq!(pts.last().copied(), Some(Point::new(100.0, 200.0)));
    }

    #[test]
    fn test_coincident_points() {
        let p = Point::new(3.0, 4.0);
        for straight in [true, false] {
            let path = build_path(p, p, straight);
            assert!(path.sample(4).iter().all(|q| *q == p));
        }
    }

    #[test]
    fn test_svg_output() {
        let straight = build_path(Point::new(0.0, 0.0), Point::new(10.0, 20.0), true);
        assert_eq!(straight.to_svg(), "M0,0 L0,10 L10,10 L10,20");

        let curve = build_path(Point::new(0.0, 0.0), Point::new(10.0, 20.0), false);
        assert_eq!(curve.to_svg(), "M0,0 C0,10 10,10 10,20");
    }
}
