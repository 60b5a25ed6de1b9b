//! Connection points on shape outlines.

use crate::config::EngineConfig;
use crate::connection::{ConnectionSide, EndpointContext};
use crate::shapes::{Anchor, Shape};
use kurbo::Point;

/// Boundary point of `shape` on `side`.
///
/// Connected endpoints carrying a marker are pushed outward by
/// `config.marker_offset` so the marker glyph clears the outline. A shape
/// without a size yields its raw position.
pub fn point_on_boundary(
    shape: &Shape,
    side: ConnectionSide,
    context: &EndpointContext,
    config: &EngineConfig,
) -> Point {
    match anchor(shape, side) {
        Some(anchor) if context.offset_applies() => {
            anchor.point + anchor.normal * config.marker_offset
        }
        Some(anchor) => anchor.point,
        None => shape.position,
    }
}

/// Un-offset anchor (point and outward normal), if the shape is sized.
pub fn anchor(shape: &Shape, side: ConnectionSide) -> Option<Anchor> {
    shape
        .bounds()
        .map(|bounds| shape.kind.outline().anchor(bounds, side))
}

/// All four connection points, in [`ConnectionSide::ALL`] order.
pub fn connection_points(
    shape: &Shape,
    context: &EndpointContext,
    config: &EngineConfig,
) -> [(ConnectionSide, Point); 4] {
    ConnectionSide::ALL.map(|side| (side, point_on_boundary(shape, side, context, config)))
}
