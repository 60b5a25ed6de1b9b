//! Geometry primitives shared by the anchoring, routing and alignment code.

use kurbo::{Point, Rect, Vec2};

/// Tolerance for collinearity tests.
const COLLINEAR_EPSILON: f64 = 1e-10;

/// Distance from a point to a line segment (a to b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    point.distance(proj)
}

/// Minimum distance from a point to a polyline.
///
/// Returns infinity for fewer than two points.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

fn cross(o: Point, p: Point, q: Point) -> f64 {
    (p - o).cross(q - o)
}

fn within_box(p: Point, q: Point, r: Point) -> bool {
    r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
}

/// Test if two line segments (a-b) and (c-d) intersect, touching included.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1.abs() < COLLINEAR_EPSILON && within_box(c, d, a))
        || (d2.abs() < COLLINEAR_EPSILON && within_box(c, d, b))
        || (d3.abs() < COLLINEAR_EPSILON && within_box(a, b, c))
        || (d4.abs() < COLLINEAR_EPSILON && within_box(a, b, d))
}

/// Intersection point of segments (a-b) and (c-d).
///
/// Parallel or collinear segments yield `None` even when they overlap,
/// since there is no single crossing point.
pub fn segment_intersection(a: Point, b: Point, c: Point, d: Point) -> Option<Point> {
    let r = b - a;
    let s = d - c;
    let denom = r.cross(s);
    if denom.abs() < COLLINEAR_EPSILON {
        return None;
    }
    let qp = c - a;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a + r * t)
    } else {
        None
    }
}

/// Axis-aligned bounding box of a point set, grown by `padding` on every side.
pub fn bounding_box(points: &[Point], padding: f64) -> Option<Rect> {
    let first = points.first()?;
    let rect = points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p));
    Some(rect.inflate(padding, padding))
}

/// Midpoint of two points.
pub fn midpoint(a: Point, b: Point) -> Point {
    a.midpoint(b)
}

/// True if `point` lies strictly inside `rect` (the outline itself is outside).
pub fn strictly_inside(rect: Rect, point: Point) -> bool {
    point.x > rect.x0 && point.x < rect.x1 && point.y > rect.y0 && point.y < rect.y1
}

/// Translate every point by `delta`.
pub fn translate_all(points: &[Point], delta: Vec2) -> Vec<Point> {
    points.iter().map(|p| *p + delta).collect()
}
