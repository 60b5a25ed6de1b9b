//! Choosing connection points: best side of one shape, nearest point across many.

use crate::anchor::point_on_boundary;
use crate::config::EngineConfig;
use crate::connection::{ConnectionSide, EndpointContext};
use crate::shapes::{Shape, ShapeId};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// The side of a shape closest to some target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideChoice {
    pub side: ConnectionSide,
    pub point: Point,
    pub distance: f64,
}

/// The closest connection point found across a set of shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearestPoint {
    pub shape_id: ShapeId,
    pub side: ConnectionSide,
    pub point: Point,
    pub distance: f64,
}

/// Pick the side of `shape` whose connection point is closest to `target`.
///
/// Sides are tried in [`ConnectionSide::ALL`] order; the first wins exact ties.
pub fn best_side_for(
    shape: &Shape,
    target: Point,
    context: &EndpointContext,
    config: &EngineConfig,
) -> SideChoice {
    let mut best: Option<SideChoice> = None;
    for side in ConnectionSide::ALL {
        let point = point_on_boundary(shape, side, context, config);
        let distance = point.distance(target);
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(SideChoice {
                side,
                point,
                distance,
            });
        }
    }
    // ALL is non-empty, so the loop always sets `best`.
    best.unwrap_or(SideChoice {
        side: ConnectionSide::North,
        point: shape.position,
        distance: shape.position.distance(target),
    })
}

/// Whether a shape can receive a connection from `exclude`'s points.
fn is_attachable(shape: &Shape, exclude: Option<ShapeId>) -> bool {
    !shape.is_group()
        && !shape.is_connector()
        && shape.size.is_some()
        && Some(shape.id()) != exclude
}

/// Closest connection point to `position` across `shapes`, strictly within `snap_radius`.
///
/// Groups, connectors, unsized shapes and `exclude` (the connector being
/// edited) are skipped. Ties keep the first candidate in iteration order.
pub fn nearest_across_shapes<'a, I>(
    shapes: I,
    position: Point,
    exclude: Option<ShapeId>,
    snap_radius: f64,
    context: &EndpointContext,
    config: &EngineConfig,
) -> Option<NearestPoint>
where
    I: IntoIterator<Item = &'a Shape>,
{
    let mut best: Option<NearestPoint> = None;
    for shape in shapes {
        if !is_attachable(shape, exclude) {
            continue;
        }
        for side in ConnectionSide::ALL {
            let point = point_on_boundary(shape, side, context, config);
            let distance = point.distance(position);
            if distance >= snap_radius {
                continue;
            }
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(NearestPoint {
                    shape_id: shape.id(),
                    side,
                    point,
                    distance,
                });
            }
        }
    }
    if let Some(found) = &best {
        log::trace!(
            "Nearest connection point {:?} on {} at distance {:.2}",
            found.side,
            found.shape_id,
            found.distance
        );
    }
    best
}
