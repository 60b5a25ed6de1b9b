//! Connector frame normalization.
//!
//! Connector points are stored relative to the connector's position and must
//! stay non-negative. After any point change the frame is recomputed: the
//! padded box of the points becomes the connector's size, and if the padded
//! box pokes into negative coordinates the whole frame is shifted.

use crate::geometry::{bounding_box, translate_all};
use crate::shapes::Shape;
use kurbo::{Size, Vec2};

/// Negative overshoot below this is rounding noise, not a real overflow.
const FRAME_EPSILON: f64 = 1e-9;

/// Result of normalizing a connector's local points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFrame {
    /// New connector size.
    pub size: Size,
    /// Add to the connector's position.
    pub position_delta: Vec2,
    /// Add to every local point.
    pub point_delta: Vec2,
}

impl LineFrame {
    /// True when neither the position nor the points move.
    pub fn is_identity(&self) -> bool {
        self.position_delta == Vec2::ZERO && self.point_delta == Vec2::ZERO
    }

    /// Copy of `shape` re-framed. The points keep their canvas coordinates.
    pub fn apply(&self, shape: &Shape) -> Shape {
        let mut framed = shape.clone();
        framed.position += self.position_delta;
        framed.points = translate_all(&shape.points, self.point_delta);
        framed.size = Some(self.size);
        framed
    }
}

/// Compute the frame for local connector `points` padded by `padding`.
///
/// Returns `None` for fewer than two points; callers keep the shape as is.
pub fn normalize(points: &[kurbo::Point], padding: f64) -> Option<LineFrame> {
    if points.len() < 2 {
        return None;
    }
    let padded = bounding_box(points, padding)?;
    let shift_x = if padded.x0 < -FRAME_EPSILON { padded.x0 } else { 0.0 };
    let shift_y = if padded.y0 < -FRAME_EPSILON { padded.y0 } else { 0.0 };
    let position_delta = Vec2::new(shift_x, shift_y);
    let point_delta = -position_delta;
    Some(LineFrame {
        size: Size::new(padded.x1 + point_delta.x, padded.y1 + point_delta.y),
        position_delta,
        point_delta,
    })
}

/// Normalize a connector shape, returning an unchanged copy when it has
/// fewer than two points.
pub fn normalize_connector(shape: &Shape, padding: f64) -> Shape {
    match normalize(&shape.points, padding) {
        Some(frame) => {
            if !frame.is_identity() {
                log::trace!(
                    "Re-framing connector {} by {:?}",
                    shape.id(),
                    frame.position_delta
                );
            }
            frame.apply(shape)
        }
        None => shape.clone(),
    }
}
