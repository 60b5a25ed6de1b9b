//! Per-kind outline strategies.
//!
//! Each strategy knows where the four connection points sit on its outline
//! and how far an arbitrary point is from that outline.

use crate::connection::ConnectionSide;
use crate::geometry::point_to_polyline_dist;
use kurbo::{Affine, Point, Rect, Vec2};
use std::f64::consts::FRAC_PI_4;

/// A connection point on an outline with its outward unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub point: Point,
    pub normal: Vec2,
}

/// Outline geometry for one family of shape kinds.
pub trait Outline: Sync {
    /// Connection point for `side` of a shape occupying `bounds`.
    fn anchor(&self, bounds: Rect, side: ConnectionSide) -> Anchor;

    /// Distance from `point` to the visual outline.
    fn distance(&self, bounds: Rect, point: Point) -> f64;
}

/// Rectangles, text, icons, cylinders: the bounding box is the outline.
pub(crate) struct BoxOutline;

pub(crate) struct CircleOutline;

/// The bounding box rotated 45 degrees about its center.
pub(crate) struct DiamondOutline;

/// Isosceles triangle, apex at the top center, base along the bottom edge.
pub(crate) struct TriangleOutline;

pub(crate) static BOX: BoxOutline = BoxOutline;
pub(crate) static CIRCLE: CircleOutline = CircleOutline;
pub(crate) static DIAMOND: DiamondOutline = DiamondOutline;
pub(crate) static TRIANGLE: TriangleOutline = TriangleOutline;

fn edge_midpoint(bounds: Rect, side: ConnectionSide) -> Point {
    let center = bounds.center();
    match side {
        ConnectionSide::North => Point::new(center.x, bounds.y0),
        ConnectionSide::South => Point::new(center.x, bounds.y1),
        ConnectionSide::East => Point::new(bounds.x1, center.y),
        ConnectionSide::West => Point::new(bounds.x0, center.y),
    }
}

fn corners(bounds: Rect) -> [Point; 5] {
    [
        Point::new(bounds.x0, bounds.y0),
        Point::new(bounds.x1, bounds.y0),
        Point::new(bounds.x1, bounds.y1),
        Point::new(bounds.x0, bounds.y1),
        Point::new(bounds.x0, bounds.y0),
    ]
}

fn diamond_rotation(bounds: Rect) -> Affine {
    Affine::rotate_about(FRAC_PI_4, bounds.center())
}

impl Outline for BoxOutline {
    fn anchor(&self, bounds: Rect, side: ConnectionSide) -> Anchor {
        Anchor {
            point: edge_midpoint(bounds, side),
            normal: side.normal(),
        }
    }

    fn distance(&self, bounds: Rect, point: Point) -> f64 {
        point_to_polyline_dist(point, &corners(bounds))
    }
}

impl Outline for CircleOutline {
    fn anchor(&self, bounds: Rect, side: ConnectionSide) -> Anchor {
        let radius = bounds.width().min(bounds.height()) / 2.0;
        let normal = side.normal();
        Anchor {
            point: bounds.center() + normal * radius,
            normal,
        }
    }

    fn distance(&self, bounds: Rect, point: Point) -> f64 {
        let radius = bounds.width().min(bounds.height()) / 2.0;
        (point.distance(bounds.center()) - radius).abs()
    }
}

impl Outline for DiamondOutline {
    fn anchor(&self, bounds: Rect, side: ConnectionSide) -> Anchor {
        let rotation = diamond_rotation(bounds);
        let rotate_normal = Affine::rotate(FRAC_PI_4);
        Anchor {
            point: rotation * edge_midpoint(bounds, side),
            normal: (rotate_normal * side.normal().to_point()).to_vec2(),
        }
    }

    fn distance(&self, bounds: Rect, point: Point) -> f64 {
        let rotation = diamond_rotation(bounds);
        let outline = corners(bounds).map(|p| rotation * p);
        point_to_polyline_dist(point, &outline)
    }
}

impl Outline for TriangleOutline {
    fn anchor(&self, bounds: Rect, side: ConnectionSide) -> Anchor {
        let center = bounds.center();
        let width = bounds.width();
        let point = match side {
            ConnectionSide::North => Point::new(center.x, bounds.y0),
            ConnectionSide::South => Point::new(center.x, bounds.y1),
            // Halfway down the sloped sides.
            ConnectionSide::East => Point::new(bounds.x0 + width * 0.75, center.y),
            ConnectionSide::West => Point::new(bounds.x0 + width * 0.25, center.y),
        };
        Anchor {
            point,
            normal: side.normal(),
        }
    }

    fn distance(&self, bounds: Rect, point: Point) -> f64 {
        let apex = Point::new(bounds.center().x, bounds.y0);
        let outline = [
            apex,
            Point::new(bounds.x1, bounds.y1),
            Point::new(bounds.x0, bounds.y1),
            apex,
        ];
        point_to_polyline_dist(point, &outline)
    }
}
