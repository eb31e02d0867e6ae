// SPDX-License-Identifier: MIT OR Apache-2.0
//! Path and shape geometry shared by connections, sockets and nodes.

use egui::{Pos2, Rect, Vec2};
use std::f32::consts::PI;

/// Number of line segments used to flatten a cubic curve
const CURVE_SAMPLES: usize = 64;

/// One drawable segment following the path start point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    /// Straight line to `end`
    Line {
        /// End point
        end: Pos2,
    },
    /// Cubic bezier to `end`
    Cubic {
        /// First control point
        c1: Pos2,
        /// Second control point
        c2: Pos2,
        /// End point
        end: Pos2,
    },
}

/// A connection path: start point, one segment, optional closed arrowhead
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPath {
    /// Start point
    pub start: Pos2,
    /// The single line or curve segment
    pub segment: Segment,
    /// Closed triangular subpath `[tip, wing1, wing2]`
    pub arrow: Option<[Pos2; 3]>,
    polyline: Vec<Pos2>,
    lengths: Vec<f32>,
}

impl ConnectionPath {
    /// Curve from `start` to `end` with horizontal tangents.
    ///
    /// A positive `curvature` pulls the control points horizontally by
    /// `(end.x - start.x) * curvature`; zero or less gives a straight line.
    pub fn new(start: Pos2, end: Pos2, curvature: f32) -> Self {
        let segment = if curvature > 0.0 {
            let adjust = (end.x - start.x) * curvature;
            Segment::Cubic {
                c1: Pos2::new(start.x + adjust, start.y),
                c2: Pos2::new(end.x - adjust, end.y),
                end,
            }
        } else {
            Segment::Line { end }
        };
        let polyline = flatten(start, &segment);
        let mut lengths = Vec::with_capacity(polyline.len());
        let mut total = 0.0;
        lengths.push(0.0);
        for pair in polyline.windows(2) {
            total += pair[0].distance(pair[1]);
            lengths.push(total);
        }
        Self {
            start,
            segment,
            arrow: None,
            polyline,
            lengths,
        }
    }

    /// End point of the path
    pub fn end(&self) -> Pos2 {
        match self.segment {
            Segment::Line { end } | Segment::Cubic { end, .. } => end,
        }
    }

    /// Total arc length
    pub fn length(&self) -> f32 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Flattened points along the path
    pub fn points(&self) -> &[Pos2] {
        &self.polyline
    }

    /// Point at fraction `t` of the arc length, `t` clamped to `[0, 1]`
    pub fn point_at_percent(&self, t: f32) -> Pos2 {
        let t = t.clamp(0.0, 1.0);
        let total = self.length();
        if total <= f32::EPSILON {
            return self.start;
        }
        let target = t * total;
        let idx = self.lengths.partition_point(|&l| l < target);
        if idx == 0 {
            return self.polyline[0];
        }
        if idx >= self.polyline.len() {
            return self.end();
        }
        let (l0, l1) = (self.lengths[idx - 1], self.lengths[idx]);
        let span = l1 - l0;
        let local = if span > 0.0 { (target - l0) / span } else { 0.0 };
        self.polyline[idx - 1].lerp(self.polyline[idx], local)
    }

    /// Attach an arrowhead of `size` centred at fraction `position`.
    ///
    /// No arrow is produced when the path is not longer than twice the size
    /// or the size is not positive.
    pub fn with_arrow(mut self, position: f32, size: f32) -> Self {
        let length = self.length();
        if size <= 0.0 || length <= 2.0 * size {
            self.arrow = None;
            return self;
        }
        let percent = (size / 2.0) / length;
        let tip = self.point_at_percent((position + percent).min(1.0));
        let tail = self.point_at_percent((position - percent).max(0.0));
        self.arrow = Some(arrow_head(tip, tail, size));
        self
    }

    /// Distance from `pos` to the nearest point on the flattened path
    pub fn distance_to(&self, pos: Pos2) -> f32 {
        self.polyline
            .windows(2)
            .map(|pair| distance_to_segment(pos, pair[0], pair[1]))
            .fold(f32::INFINITY, f32::min)
    }

    /// Bounds of the path and arrow
    pub fn bounds(&self) -> Rect {
        let mut rect = Rect::from_points(&self.polyline);
        if let Some(arrow) = &self.arrow {
            rect = rect.union(Rect::from_points(arrow));
        }
        rect
    }
}

/// Triangle with its tip at `tip`, pointing away from `tail`
pub fn arrow_head(tip: Pos2, tail: Pos2, size: f32) -> [Pos2; 3] {
    let dx = tail.x - tip.x;
    let dy = tail.y - tip.y;
    let len = (dx * dx + dy * dy).sqrt();
    let mut angle = if len > 0.0 {
        (dx / len).clamp(-1.0, 1.0).acos()
    } else {
        0.0
    };
    if dy >= 0.0 {
        angle = 2.0 * PI - angle;
    }
    let wing1 = tip + Vec2::new((angle + PI / 3.0).sin(), (angle + PI / 3.0).cos()) * size;
    let wing2 = tip
        + Vec2::new((angle + PI - PI / 3.0).sin(), (angle + PI - PI / 3.0).cos()) * size;
    [tip, wing1, wing2]
}

fn flatten(start: Pos2, segment: &Segment) -> Vec<Pos2> {
    match *segment {
        Segment::Line { end } => vec![start, end],
        Segment::Cubic { c1, c2, end } => (0..=CURVE_SAMPLES)
            .map(|i| cubic_point(start, c1, c2, end, i as f32 / CURVE_SAMPLES as f32))
            .collect(),
    }
}

/// Evaluate a cubic bezier at `t`
pub fn cubic_point(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, t: f32) -> Pos2 {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    Pos2::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

/// Distance from `p` to the segment `a`-`b`
pub fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Even-odd point-in-polygon test
pub fn polygon_contains(points: &[Pos2], p: Pos2) -> bool {
    let mut inside = false;
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (points[i], points[j]);
        if (pi.y > p.y) != (pj.y > p.y)
            && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Whether `p` lies inside `rect` with elliptical corners of radii `radii`
pub fn rounded_rect_contains(rect: Rect, radii: Vec2, p: Pos2) -> bool {
    if !rect.contains(p) {
        return false;
    }
    let rx = radii.x.clamp(0.0, rect.width() / 2.0);
    let ry = radii.y.clamp(0.0, rect.height() / 2.0);
    if rx <= 0.0 || ry <= 0.0 {
        return true;
    }
    let cx = if p.x < rect.left() + rx {
        rect.left() + rx
    } else if p.x > rect.right() - rx {
        rect.right() - rx
    } else {
        return true;
    };
    let cy = if p.y < rect.top() + ry {
        rect.top() + ry
    } else if p.y > rect.bottom() - ry {
        rect.bottom() - ry
    } else {
        return true;
    };
    let nx = (p.x - cx) / rx;
    let ny = (p.y - cy) / ry;
    nx * nx + ny * ny <= 1.0
}

/// Grow `rect` by individual amounts on each side
pub fn adjusted(rect: Rect, left: f32, top: f32, right: f32, bottom: f32) -> Rect {
    Rect::from_min_max(
        Pos2::new(rect.min.x - left, rect.min.y - top),
        Pos2::new(rect.max.x + right, rect.max.y + bottom),
    )
}

/// Round `pos` to the nearest multiple of `grid` on both axes
pub fn snap_to_grid(pos: Pos2, grid: f32) -> Pos2 {
    if grid <= 0.0 {
        return pos;
    }
    Pos2::new((pos.x / grid).round() * grid, (pos.y / grid).round() * grid)
}

/// Outline that hit-tests and bounds an item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemShape {
    /// Nothing hit-testable
    Empty,
    /// Rectangle with elliptical corners
    RoundedRect {
        /// Rectangle
        rect: Rect,
        /// Corner radii
        radii: Vec2,
    },
    /// Ellipse inscribed in a rectangle
    Ellipse(Rect),
    /// Closed polygon
    Polygon(Vec<Pos2>),
    /// Polyline stroked at a width
    Stroke {
        /// Polyline points
        points: Vec<Pos2>,
        /// Stroke width
        width: f32,
    },
    /// Union of several shapes
    Union(Vec<ItemShape>),
}

impl ItemShape {
    /// Whether `p` lies inside the shape
    pub fn contains(&self, p: Pos2) -> bool {
        match self {
            Self::Empty => false,
            Self::RoundedRect { rect, radii } => rounded_rect_contains(*rect, *radii, p),
            Self::Ellipse(rect) => rounded_rect_contains(*rect, rect.size() / 2.0, p),
            Self::Polygon(points) => polygon_contains(points, p),
            Self::Stroke { points, width } => points
                .windows(2)
                .any(|pair| distance_to_segment(p, pair[0], pair[1]) <= width / 2.0),
            Self::Union(shapes) => shapes.iter().any(|s| s.contains(p)),
        }
    }

    /// Bounding rectangle of the shape
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Empty => Rect::NOTHING,
            Self::RoundedRect { rect, .. } | Self::Ellipse(rect) => *rect,
            Self::Polygon(points) => Rect::from_points(points),
            Self::Stroke { points, width } => Rect::from_points(points).expand(width / 2.0),
            Self::Union(shapes) => shapes
                .iter()
                .map(Self::bounds)
                .fold(Rect::NOTHING, Rect::union),
        }
    }

    /// Shape moved by `offset`
    pub fn translated(self, offset: Vec2) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::RoundedRect { rect, radii } => Self::RoundedRect {
                rect: rect.translate(offset),
                radii,
            },
            Self::Ellipse(rect) => Self::Ellipse(rect.translate(offset)),
            Self::Polygon(points) => Self::Polygon(points.into_iter().map(|p| p + offset).collect()),
            Self::Stroke { points, width } => Self::Stroke {
                points: points.into_iter().map(|p| p + offset).collect(),
                width,
            },
            Self::Union(shapes) => {
                Self::Union(shapes.into_iter().map(|s| s.translated(offset)).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_straight_path_when_no_curvature() {
        let path = ConnectionPath::new(Pos2::new(0.0, 0.0), Pos2::new(100.0, 0.0), 0.0);
        assert!(matches!(path.segment, Segment::Line { .. }));
        assert!(approx(path.length(), 100.0));
        assert_eq!(path.point_at_percent(0.5), Pos2::new(50.0, 0.0));
    }

    #[test]
    fn test_cubic_control_points() {
        let path = ConnectionPath::new(Pos2::new(0.0, 0.0), Pos2::new(200.0, 100.0), 0.5);
        match path.segment {
            Segment::Cubic { c1, c2, end } => {
                assert_eq!(c1, Pos2::new(100.0, 0.0));
                assert_eq!(c2, Pos2::new(100.0, 100.0));
                assert_eq!(end, Pos2::new(200.0, 100.0));
            }
            Segment::Line { .. } => panic!("expected a cubic"),
        }
        assert!(path.length() > Pos2::ZERO.distance(Pos2::new(200.0, 100.0)) - 1e-3);
    }

    #[test]
    fn test_point_at_percent_clamps() {
        let path = ConnectionPath::new(Pos2::new(10.0, 5.0), Pos2::new(90.0, 5.0), 0.0);
        assert_eq!(path.point_at_percent(-3.0), Pos2::new(10.0, 5.0));
        assert_eq!(path.point_at_percent(7.0), Pos2::new(90.0, 5.0));
    }

    #[test]
    fn test_arrow_points_along_path() {
        let path = ConnectionPath::new(Pos2::new(0.0, 0.0), Pos2::new(100.0, 0.0), 0.0)
            .with_arrow(0.5, 10.0);
        let [tip, w1, w2] = path.arrow.expect("arrow should exist");
        assert!(approx(tip.x, 55.0));
        assert!(approx(tip.y, 0.0));
        // Wings sit behind the tip, mirrored about the path.
        assert!(w1.x < tip.x && w2.x < tip.x);
        assert!(approx(w1.y, -w2.y));
        assert!(approx(tip.distance(w1), 10.0));
        assert!(approx(tip.distance(w2), 10.0));
    }

    #[test]
    fn test_arrow_points_left_on_reversed_path() {
        let path = ConnectionPath::new(Pos2::new(100.0, 0.0), Pos2::new(0.0, 0.0), 0.0)
            .with_arrow(0.5, 10.0);
        let [tip, w1, w2] = path.arrow.expect("arrow should exist");
        assert!(approx(tip.x, 45.0));
        assert!(w1.x > tip.x && w2.x > tip.x);
    }

    #[test]
    fn test_no_arrow_on_short_path() {
        let path = ConnectionPath::new(Pos2::ZERO, Pos2::new(20.0, 0.0), 0.0).with_arrow(0.5, 15.0);
        assert!(path.arrow.is_none());
        let path = ConnectionPath::new(Pos2::ZERO, Pos2::new(200.0, 0.0), 0.0).with_arrow(0.5, 0.0);
        assert!(path.arrow.is_none());
    }

    #[test]
    fn test_rounded_rect_corners() {
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 50.0));
        let radii = Vec2::splat(10.0);
        assert!(rounded_rect_contains(rect, radii, Pos2::new(50.0, 25.0)));
        assert!(!rounded_rect_contains(rect, radii, Pos2::new(0.5, 0.5)));
        assert!(rounded_rect_contains(rect, radii, Pos2::new(5.0, 5.0)));
    }

    #[test]
    fn test_polygon_contains() {
        let tri = [Pos2::new(0.0, 0.0), Pos2::new(10.0, 0.0), Pos2::new(0.0, 10.0)];
        assert!(polygon_contains(&tri, Pos2::new(2.0, 2.0)));
        assert!(!polygon_contains(&tri, Pos2::new(8.0, 8.0)));
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(Pos2::new(23.0, 37.0), 20.0), Pos2::new(20.0, 40.0));
        assert_eq!(snap_to_grid(Pos2::new(-14.0, 6.0), 10.0), Pos2::new(-10.0, 10.0));
    }

    #[test]
    fn test_stroke_shape_hit() {
        let shape = ItemShape::Stroke {
            points: vec![Pos2::ZERO, Pos2::new(100.0, 0.0)],
            width: 9.0,
        };
        assert!(shape.contains(Pos2::new(50.0, 4.0)));
        assert!(!shape.contains(Pos2::new(50.0, 5.0)));
    }
}
