//! Alignment guides and snapped offsets while shapes are dragged.
//!
//! Guides are recomputed every drag frame from the moving shapes' projected
//! boxes (start position plus the proposed delta) and never persisted.

use crate::config::EngineConfig;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Direction a guide line runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuideOrientation {
    /// Constant y.
    Horizontal,
    /// Constant x.
    Vertical,
}

/// What lined up to produce a guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuideKind {
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

/// A guide line to draw during a drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentGuide {
    pub orientation: GuideOrientation,
    /// y for horizontal guides, x for vertical ones.
    pub coordinate: f64,
    /// Visible span along the guide.
    pub start: f64,
    pub end: f64,
    pub kind: GuideKind,
}

/// Guides found for one drag frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuideSet {
    pub horizontal: Vec<AlignmentGuide>,
    pub vertical: Vec<AlignmentGuide>,
}

impl GuideSet {
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty()
    }

    pub fn len(&self) -> usize {
        self.horizontal.len() + self.vertical.len()
    }

    /// Add a guide, merging it into an existing one at the same coordinate.
    fn add(&mut self, guide: AlignmentGuide, tolerance: f64) {
        let guides = match guide.orientation {
            GuideOrientation::Horizontal => &mut self.horizontal,
            GuideOrientation::Vertical => &mut self.vertical,
        };
        match guides
            .iter_mut()
            .find(|g| (g.coordinate - guide.coordinate).abs() <= tolerance)
        {
            Some(existing) => {
                existing.start = existing.start.min(guide.start);
                existing.end = existing.end.max(guide.end);
                if guide.kind == GuideKind::Center {
                    existing.kind = GuideKind::Center;
                }
            }
            None => guides.push(guide),
        }
    }
}

/// Guides and the snapped delta for one drag frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DragAlignment {
    pub guides: GuideSet,
    pub delta: Vec2,
}

fn start_of(shape: &Shape, start_positions: &HashMap<ShapeId, Point>) -> Point {
    start_positions.get(&shape.id()).copied().unwrap_or(shape.position)
}

/// Box of `shape` at its drag start position moved by `delta`.
fn projected(
    shape: &Shape,
    delta: Vec2,
    start_positions: &HashMap<ShapeId, Point>,
) -> Option<Rect> {
    shape.bounds_at(start_of(shape, start_positions) + delta)
}

fn is_static(shape: &Shape, moving: &[ShapeId]) -> bool {
    !moving.contains(&shape.id())
        && !shape.is_connector()
        && !shape.is_group()
        && shape.size.is_some()
}

fn horizontal(
    coordinate: f64,
    m: Rect,
    s: Rect,
    kind: GuideKind,
    extension: f64,
) -> AlignmentGuide {
    AlignmentGuide {
        orientation: GuideOrientation::Horizontal,
        coordinate,
        start: m.x0.min(s.x0) - extension,
        end: m.x1.max(s.x1) + extension,
        kind,
    }
}

fn vertical(coordinate: f64, m: Rect, s: Rect, kind: GuideKind, extension: f64) -> AlignmentGuide {
    AlignmentGuide {
        orientation: GuideOrientation::Vertical,
        coordinate,
        start: m.y0.min(s.y0) - extension,
        end: m.y1.max(s.y1) + extension,
        kind,
    }
}

/// Guides between one projected moving box `m` and one static box `s`.
///
/// Center matches take priority: a pair that lines up on either center
/// skips the edge checks entirely.
fn pair_guides(m: Rect, s: Rect, config: &EngineConfig, out: &mut Vec<AlignmentGuide>) {
    let threshold = config.guide_threshold;
    let ext = config.guide_extension;
    let near = |a: f64, b: f64| (a - b).abs() < threshold;
    let (mc, sc) = (m.center(), s.center());

    let mut centered = false;
    if near(mc.y, sc.y) {
        out.push(horizontal(sc.y, m, s, GuideKind::Center, ext));
        centered = true;
    }
    if near(mc.x, sc.x) {
        out.push(vertical(sc.x, m, s, GuideKind::Center, ext));
        centered = true;
    }
    if centered {
        return;
    }

    let edges = [
        (m.y0, s.y0, GuideKind::Top, GuideOrientation::Horizontal),
        (m.y1, s.y1, GuideKind::Bottom, GuideOrientation::Horizontal),
        (m.y0, s.y1, GuideKind::Top, GuideOrientation::Horizontal),
        (m.y1, s.y0, GuideKind::Bottom, GuideOrientation::Horizontal),
        (m.x0, s.x0, GuideKind::Left, GuideOrientation::Vertical),
        (m.x1, s.x1, GuideKind::Right, GuideOrientation::Vertical),
        (m.x0, s.x1, GuideKind::Left, GuideOrientation::Vertical),
        (m.x1, s.x0, GuideKind::Right, GuideOrientation::Vertical),
    ];
    for (moving_edge, static_edge, kind, orientation) in edges {
        if !near(moving_edge, static_edge) {
            continue;
        }
        out.push(match orientation {
            GuideOrientation::Horizontal => horizontal(static_edge, m, s, kind, ext),
            GuideOrientation::Vertical => vertical(static_edge, m, s, kind, ext),
        });
    }
}

/// Find the guides for dragging `moving` by `delta`.
///
/// `start_positions` holds each moving shape's position when the drag
/// began; shapes missing from it use their current position. Static
/// candidates are every sized shape in `all_shapes` that is not moving, not
/// a connector and not a group.
pub fn find_guides(
    moving: &[ShapeId],
    all_shapes: &[Shape],
    delta: Vec2,
    start_positions: &HashMap<ShapeId, Point>,
    config: &EngineConfig,
) -> GuideSet {
    let projected_boxes: Vec<Rect> = all_shapes
        .iter()
        .filter(|s| moving.contains(&s.id()))
        .filter_map(|s| projected(s, delta, start_positions))
        .collect();

    let mut found = Vec::new();
    for m in &projected_boxes {
        for s in all_shapes.iter().filter(|s| is_static(s, moving)) {
            if let Some(bounds) = s.bounds() {
                pair_guides(*m, bounds, config, &mut found);
            }
        }
    }

    let mut guides = GuideSet::default();
    for guide in found {
        guides.add(guide, config.guide_merge_tolerance);
    }
    log::trace!(
        "{} guide(s) for {} moving shape(s) at {:?}",
        guides.len(),
        moving.len(),
        delta
    );
    guides
}

/// Offset from the closest edge or center line of `[lo, mid, hi]` to a
/// guide, strictly within `threshold`. Ties keep the first found.
fn closest_offset<'g>(
    lines: [f64; 3],
    guides: impl Iterator<Item = &'g AlignmentGuide>,
    threshold: f64,
) -> Option<f64> {
    let mut best: Option<f64> = None;
    for guide in guides {
        for line in lines {
            let offset = guide.coordinate - line;
            if offset.abs() < threshold && best.is_none_or(|b| offset.abs() < b.abs()) {
                best = Some(offset);
            }
        }
    }
    best
}

/// Adjust `delta` so `shape`'s projected box lands exactly on the closest
/// guide on each axis. Axes with no guide within `threshold` keep their
/// original delta.
pub fn snap(
    shape: &Shape,
    delta: Vec2,
    guides: &GuideSet,
    start_positions: &HashMap<ShapeId, Point>,
    threshold: f64,
) -> Vec2 {
    let Some(b) = projected(shape, delta, start_positions) else {
        return delta;
    };
    let c = b.center();
    let dy = closest_offset([b.y0, c.y, b.y1], guides.horizontal.iter(), threshold);
    let dx = closest_offset([b.x0, c.x, b.x1], guides.vertical.iter(), threshold);
    Vec2::new(delta.x + dx.unwrap_or(0.0), delta.y + dy.unwrap_or(0.0))
}

/// One drag frame: find guides, snap the lead shape to them, then recompute
/// the guides at the snapped delta so the drawn lines sit on the final
/// positions.
///
/// The lead is the first id in `moving` that is found in `all_shapes`.
pub fn align_drag(
    moving: &[ShapeId],
    all_shapes: &[Shape],
    delta: Vec2,
    start_positions: &HashMap<ShapeId, Point>,
    config: &EngineConfig,
) -> DragAlignment {
    let lead = moving
        .iter()
        .find_map(|id| all_shapes.iter().find(|s| s.id() == *id));
    let Some(lead) = lead else {
        return DragAlignment {
            guides: GuideSet::default(),
            delta,
        };
    };

    let guides = find_guides(moving, all_shapes, delta, start_positions, config);
    if guides.is_empty() {
        return DragAlignment { guides, delta };
    }
    let snapped = snap(lead, delta, &guides, start_positions, config.guide_threshold);
    if snapped == delta {
        return DragAlignment { guides, delta };
    }
    log::trace!("Drag snapped from {:?} to {:?}", delta, snapped);
    DragAlignment {
        guides: find_guides(moving, all_shapes, snapped, start_positions, config),
        delta: snapped,
    }
}
