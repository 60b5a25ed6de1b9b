//! Single-bend orthogonal ("elbow") routing.
//!
//! An elbow connector is either a direct two-point segment (endpoints closer
//! than the direct threshold) or three points with one right-angle bend.

use crate::anchor::point_on_boundary;
use crate::config::EngineConfig;
use crate::connection::{ConnectionSide, EndpointContext};
use crate::geometry::strictly_inside;
use crate::shapes::Shape;
use kurbo::{Point, Rect};

/// Tolerance for treating a segment as axis-aligned.
const AXIS_EPSILON: f64 = 1e-6;

/// Caller overrides for [`route`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Force the first segment to be horizontal (`true`) or vertical (`false`).
    pub horizontal_first: Option<bool>,
}

fn dominant_horizontal(start: Point, end: Point) -> bool {
    (end.x - start.x).abs() >= (end.y - start.y).abs()
}

/// Decide whether the path leaves `start` horizontally.
///
/// The start side wins (east/west leave horizontally). Without one, the end
/// side decides inversely: arriving at north/south needs a horizontal first
/// leg. With neither, the longer axis goes first.
pub fn horizontal_first(
    start: Point,
    end: Point,
    start_side: Option<ConnectionSide>,
    end_side: Option<ConnectionSide>,
) -> bool {
    match (start_side, end_side) {
        (Some(side), _) => side.is_horizontal(),
        (None, Some(side)) => side.is_vertical(),
        (None, None) => dominant_horizontal(start, end),
    }
}

/// The bend between `start` and `end`.
pub fn bend_point(start: Point, end: Point, horizontal_first: bool) -> Point {
    if horizontal_first {
        Point::new(end.x, start.y)
    } else {
        Point::new(start.x, end.y)
    }
}

/// Route an elbow connector between two points.
///
/// Returns `[start, end]` when the points are closer than
/// `config.elbow_direct_threshold`, otherwise `[start, bend, end]`.
pub fn route(
    start: Point,
    end: Point,
    start_side: Option<ConnectionSide>,
    end_side: Option<ConnectionSide>,
    options: RouteOptions,
    config: &EngineConfig,
) -> Vec<Point> {
    if start.distance(end) < config.elbow_direct_threshold {
        return vec![start, end];
    }
    let horizontal = options
        .horizontal_first
        .unwrap_or_else(|| horizontal_first(start, end, start_side, end_side));
    vec![start, bend_point(start, end, horizontal), end]
}

/// Interior points of an elbow between two free endpoints.
///
/// Empty when the endpoints are closer than `config.elbow_direct_threshold`.
pub fn compute_elbow_path(start: Point, end: Point, config: &EngineConfig) -> Vec<Point> {
    if start.distance(end) < config.elbow_direct_threshold {
        return Vec::new();
    }
    vec![bend_point(start, end, dominant_horizontal(start, end))]
}

/// Orientation of an existing path's first leg, if it is axis-aligned.
fn first_leg_horizontal(points: &[Point]) -> Option<bool> {
    let [a, b, ..] = points else {
        return None;
    };
    leg_orientation(*a, *b)
}

fn leg_orientation(a: Point, b: Point) -> Option<bool> {
    let dx = (b.x - a.x).abs();
    let dy = (b.y - a.y).abs();
    if dy < AXIS_EPSILON && dx >= AXIS_EPSILON {
        Some(true)
    } else if dx < AXIS_EPSILON && dy >= AXIS_EPSILON {
        Some(false)
    } else {
        None
    }
}

/// Re-square an elbow path after one of its endpoints moved.
///
/// Keeps the orientation of whichever end leg is still axis-aligned, unless
/// `horizontal_first` overrides it. Paths with fewer than three points are
/// returned unchanged.
pub fn adjust_elbow(points: &[Point], horizontal_first: Option<bool>) -> Vec<Point> {
    let (Some(&start), Some(&end)) = (points.first(), points.last()) else {
        return points.to_vec();
    };
    if points.len() < 3 {
        return points.to_vec();
    }
    let horizontal = horizontal_first
        .or_else(|| first_leg_horizontal(points))
        .or_else(|| {
            // Last leg horizontal means the first leg was vertical.
            let n = points.len();
            leg_orientation(points[n - 2], points[n - 1]).map(|h| !h)
        })
        .unwrap_or_else(|| dominant_horizontal(start, end));
    vec![start, bend_point(start, end, horizontal), end]
}

/// True if every leg of `points` is horizontal or vertical.
pub fn is_orthogonal(points: &[Point]) -> bool {
    points.windows(2).all(|w| {
        (w[0].x - w[1].x).abs() < AXIS_EPSILON || (w[0].y - w[1].y).abs() < AXIS_EPSILON
    })
}

/// Check that the elbow between two anchored sides stays out of both shapes.
///
/// The bend must not sit inside either box, the first leg must leave along
/// the start side's normal and the last leg must arrive against the end
/// side's normal.
fn elbow_is_clear(
    a: &Shape,
    b: &Shape,
    a_box: Rect,
    b_box: Rect,
    sides: (ConnectionSide, ConnectionSide),
    config: &EngineConfig,
) -> bool {
    let ctx = EndpointContext::bare();
    let start = point_on_boundary(a, sides.0, &ctx, config);
    let end = point_on_boundary(b, sides.1, &ctx, config);
    let path = route(start, end, Some(sides.0), Some(sides.1), RouteOptions::default(), config);
    let [_, bend, _] = path.as_slice() else {
        return true;
    };
    let bend = *bend;
    !strictly_inside(a_box, bend)
        && !strictly_inside(b_box, bend)
        && (bend - start).dot(sides.0.normal()) >= 0.0
        && (bend - end).dot(sides.1.normal()) >= 0.0
}

/// Choose sides on two shapes for an elbow connector from `a` to `b`.
///
/// The dominant axis of the center offset picks the facing pair. If that
/// pair would bend inside either shape or double back through it, the
/// perpendicular facing pair and then the two mixed pairs are tried; the
/// first clear pair wins. When none is clear the facing pair is kept.
pub fn optimal_elbow_sides(
    a: &Shape,
    b: &Shape,
    config: &EngineConfig,
) -> Option<(ConnectionSide, ConnectionSide)> {
    let a_box = a.bounds()?;
    let b_box = b.bounds()?;
    let offset = b_box.center() - a_box.center();

    let facing_horizontal = if offset.x >= 0.0 {
        (ConnectionSide::East, ConnectionSide::West)
    } else {
        (ConnectionSide::West, ConnectionSide::East)
    };
    let facing_vertical = if offset.y >= 0.0 {
        (ConnectionSide::South, ConnectionSide::North)
    } else {
        (ConnectionSide::North, ConnectionSide::South)
    };
    let (primary, perpendicular) = if offset.x.abs() >= offset.y.abs() {
        (facing_horizontal, facing_vertical)
    } else {
        (facing_vertical, facing_horizontal)
    };

    let candidates = [
        primary,
        perpendicular,
        (primary.0, perpendicular.1),
        (perpendicular.0, primary.1),
    ];
    for sides in candidates {
        if elbow_is_clear(a, b, a_box, b_box, sides, config) {
            return Some(sides);
        }
        log::trace!("Elbow sides {:?} cut through a shape, trying next pair", sides);
    }
    log::debug!(
        "No clear elbow between {} and {}, keeping {:?}",
        a.id(),
        b.id(),
        primary
    );
    Some(primary)
}
