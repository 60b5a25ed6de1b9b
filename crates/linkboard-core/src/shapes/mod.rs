//! Shape records read by the engine.
//!
//! The application owns shape storage; the engine only sees plain records
//! through [`ShapeSource`] and hands back updated copies.

mod outline;

pub use outline::{Anchor, Outline};

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// The closed set of shape types on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Diamond,
    Triangle,
    Cylinder,
    Text,
    Icon,
    Line,
    Arrow,
    /// Grouping marker; never a connection target.
    Group,
}

impl ShapeKind {
    /// Lines and arrows are connectors.
    pub fn is_connector(self) -> bool {
        matches!(self, ShapeKind::Line | ShapeKind::Arrow)
    }

    pub fn is_group(self) -> bool {
        self == ShapeKind::Group
    }

    /// Boundary strategy used to place connection points on this kind.
    pub fn outline(self) -> &'static dyn Outline {
        match self {
            ShapeKind::Circle => &outline::CIRCLE,
            ShapeKind::Diamond => &outline::DIAMOND,
            ShapeKind::Triangle => &outline::TRIANGLE,
            ShapeKind::Rectangle
            | ShapeKind::Cylinder
            | ShapeKind::Text
            | ShapeKind::Icon
            | ShapeKind::Line
            | ShapeKind::Arrow
            | ShapeKind::Group => &outline::BOX,
        }
    }
}

/// How a connector travels between its endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineType {
    /// Straight segments through every point.
    #[default]
    Straight,
    /// Single right-angle bend between the endpoints.
    Elbow,
}

/// Marker drawn at a connector endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    #[default]
    None,
    Arrow,
    Triangle,
    Circle,
    Diamond,
    Bar,
}

impl Marker {
    pub fn is_none(self) -> bool {
        self == Marker::None
    }
}

/// Which end of a connector a point is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Start,
    End,
}

/// Connector flags the engine reads. Ignored on non-connector shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorStyle {
    #[serde(default)]
    pub line_type: LineType,
    #[serde(default)]
    pub start_marker: Marker,
    #[serde(default)]
    pub end_marker: Marker,
}

impl ConnectorStyle {
    /// Marker at the given endpoint.
    pub fn marker(&self, endpoint: Endpoint) -> Marker {
        match endpoint {
            Endpoint::Start => self.start_marker,
            Endpoint::End => self.end_marker,
        }
    }
}

/// A shape on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    /// Shape type.
    pub kind: ShapeKind,
    /// Top-left corner in canvas units.
    pub position: Point,
    /// Width and height. `None` while the size is still unresolved.
    #[serde(default)]
    pub size: Option<Size>,
    /// Connector points, relative to `position`. Empty for non-connectors.
    #[serde(default)]
    pub points: Vec<Point>,
    /// Connector flags.
    #[serde(default)]
    pub connector: ConnectorStyle,
}

impl Shape {
    /// Create a sized, non-connector shape.
    pub fn new(kind: ShapeKind, position: Point, size: Size) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            size: Some(size),
            points: Vec::new(),
            connector: ConnectorStyle::default(),
        }
    }

    /// Create a shape whose size has not been measured yet.
    pub fn without_size(kind: ShapeKind, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            size: None,
            points: Vec::new(),
            connector: ConnectorStyle::default(),
        }
    }

    /// Create a connector from points in canvas coordinates.
    ///
    /// The connector is positioned at the first point; its size is left
    /// unresolved until the points are normalized.
    pub fn connector(kind: ShapeKind, world_points: &[Point], style: ConnectorStyle) -> Self {
        let position = world_points.first().copied().unwrap_or(Point::ZERO);
        let origin = position.to_vec2();
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            size: None,
            points: world_points.iter().map(|p| *p - origin).collect(),
            connector: style,
        }
    }

    /// Replace the identifier (for records coming from storage).
    pub fn with_id(mut self, id: ShapeId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn is_connector(&self) -> bool {
        self.kind.is_connector()
    }

    pub fn is_group(&self) -> bool {
        self.kind.is_group()
    }

    /// Elbow-typed connector.
    pub fn is_elbow(&self) -> bool {
        self.is_connector() && self.connector.line_type == LineType::Elbow
    }

    /// Bounding box in canvas coordinates, if the size is known.
    pub fn bounds(&self) -> Option<Rect> {
        self.size.map(|size| Rect::from_origin_size(self.position, size))
    }

    /// Bounding box as if the shape sat at `position`.
    pub fn bounds_at(&self, position: Point) -> Option<Rect> {
        self.size.map(|size| Rect::from_origin_size(position, size))
    }

    pub fn center(&self) -> Option<Point> {
        self.bounds().map(|b| b.center())
    }

    /// Connector points in canvas coordinates.
    pub fn world_points(&self) -> Vec<Point> {
        let origin = self.position.to_vec2();
        self.points.iter().map(|p| *p + origin).collect()
    }

    /// Store canvas-coordinate points relative to the current position.
    pub fn set_world_points(&mut self, world_points: &[Point]) {
        let origin = self.position.to_vec2();
        self.points = world_points.iter().map(|p| *p - origin).collect();
    }

    /// Endpoint role of a point index, `None` for interior points.
    pub fn endpoint_at(&self, index: usize) -> Option<Endpoint> {
        if index == 0 {
            Some(Endpoint::Start)
        } else if index + 1 == self.points.len() {
            Some(Endpoint::End)
        } else {
            None
        }
    }

    /// Copy of this shape moved by `delta`.
    pub fn translated(&self, delta: Vec2) -> Self {
        let mut shape = self.clone();
        shape.position += delta;
        shape
    }

    /// Copy of this shape with a new size.
    pub fn resized(&self, size: Size) -> Self {
        let mut shape = self.clone();
        shape.size = Some(size);
        shape
    }

    /// Check whether `point` lies on the visual outline within `tolerance`.
    pub fn hit_outline(&self, point: Point, tolerance: f64) -> bool {
        match self.bounds() {
            Some(bounds) => self.kind.outline().distance(bounds, point) <= tolerance,
            None => false,
        }
    }
}

/// Read-only access to the application's shapes.
pub trait ShapeSource {
    /// Look up a shape by id.
    fn shape(&self, id: ShapeId) -> Option<&Shape>;

    /// Iterate every shape, in the order nearest-point ties are resolved.
    fn iter_shapes(&self) -> impl Iterator<Item = &Shape>;
}

impl ShapeSource for HashMap<ShapeId, Shape> {
    fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.get(&id)
    }

    fn iter_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.values()
    }
}

impl ShapeSource for [Shape] {
    fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.iter().find(|s| s.id == id)
    }

    fn iter_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.iter()
    }
}
