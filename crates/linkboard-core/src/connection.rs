//! Connection bindings between connector points and shapes.

use crate::error::{EngineError, EngineResult};
use crate::shapes::{Endpoint, Marker, Shape, ShapeId};
use kurbo::Vec2;
use serde::{Deserialize, Serialize};

/// Side of a shape a connector attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionSide {
    North,
    South,
    East,
    West,
}

impl ConnectionSide {
    /// All sides, in the order candidate points are evaluated.
    pub const ALL: [ConnectionSide; 4] = [
        ConnectionSide::North,
        ConnectionSide::South,
        ConnectionSide::East,
        ConnectionSide::West,
    ];

    /// Outward unit normal (y grows downward).
    pub fn normal(self) -> Vec2 {
        match self {
            ConnectionSide::North => Vec2::new(0.0, -1.0),
            ConnectionSide::South => Vec2::new(0.0, 1.0),
            ConnectionSide::East => Vec2::new(1.0, 0.0),
            ConnectionSide::West => Vec2::new(-1.0, 0.0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            ConnectionSide::North => ConnectionSide::South,
            ConnectionSide::South => ConnectionSide::North,
            ConnectionSide::East => ConnectionSide::West,
            ConnectionSide::West => ConnectionSide::East,
        }
    }

    /// North and south leave the shape vertically.
    pub fn is_vertical(self) -> bool {
        matches!(self, ConnectionSide::North | ConnectionSide::South)
    }

    pub fn is_horizontal(self) -> bool {
        !self.is_vertical()
    }
}

/// A binding of one connector point to a side of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub connector_id: ShapeId,
    pub point_index: usize,
    pub target_id: ShapeId,
    pub side: ConnectionSide,
    /// Side is re-chosen as the shapes move instead of staying fixed.
    #[serde(default)]
    pub dynamic: bool,
}

/// A new side for an existing connection, produced by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideUpdate {
    pub connector_id: ShapeId,
    pub point_index: usize,
    pub side: ConnectionSide,
}

/// A connector point that moved to a new index after a re-route.
///
/// Elbow connectors switch between two and three points, which moves their
/// end point between index 1 and index 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexUpdate {
    pub connector_id: ShapeId,
    pub from: usize,
    pub to: usize,
}

/// What the anchor calculation needs to know about the point being placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointContext {
    /// The point is a connector point bound to the shape.
    pub connected: bool,
    /// Which end of the connector, `None` for interior points.
    pub endpoint: Option<Endpoint>,
    /// Marker drawn at that end.
    pub marker: Marker,
}

impl Default for EndpointContext {
    fn default() -> Self {
        Self::bare()
    }
}

impl EndpointContext {
    /// Context for a plain boundary query: never offset.
    pub fn bare() -> Self {
        Self {
            connected: false,
            endpoint: None,
            marker: Marker::None,
        }
    }

    /// Context for point `index` of `connector`.
    pub fn for_point(connector: &Shape, index: usize) -> Self {
        let endpoint = connector.endpoint_at(index);
        Self {
            connected: true,
            endpoint,
            marker: endpoint
                .map(|e| connector.connector.marker(e))
                .unwrap_or(Marker::None),
        }
    }

    /// Whether the marker offset applies.
    pub fn offset_applies(&self) -> bool {
        self.connected && self.endpoint.is_some() && !self.marker.is_none()
    }
}

/// The application's connection table, borrowed by the engine.
///
/// Holds at most one connection per (connector, point index).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Connections {
    items: Vec<Connection>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind point `point_index` of `connector` to `side` of `target`.
    ///
    /// Returns the binding it replaced, if any.
    pub fn connect(
        &mut self,
        connector: &Shape,
        point_index: usize,
        target: ShapeId,
        side: ConnectionSide,
        dynamic: bool,
    ) -> EngineResult<Option<Connection>> {
        if !connector.is_connector() {
            return Err(EngineError::NotAConnector(connector.id()));
        }
        if point_index >= connector.points.len() {
            return Err(EngineError::PointIndexOutOfRange {
                connector: connector.id(),
                index: point_index,
                len: connector.points.len(),
            });
        }
        Ok(self.insert(Connection {
            connector_id: connector.id(),
            point_index,
            target_id: target,
            side,
            dynamic,
        }))
    }

    /// Insert without validation, evicting any binding for the same point.
    pub fn insert(&mut self, connection: Connection) -> Option<Connection> {
        let evicted = self.disconnect(connection.connector_id, connection.point_index);
        if let Some(old) = &evicted {
            log::debug!(
                "Replacing connection {}[{}] -> {} with -> {}",
                old.connector_id,
                old.point_index,
                old.target_id,
                connection.target_id
            );
        }
        self.items.push(connection);
        evicted
    }

    /// Remove the binding for a connector point.
    pub fn disconnect(&mut self, connector_id: ShapeId, point_index: usize) -> Option<Connection> {
        let pos = self
            .items
            .iter()
            .position(|c| c.connector_id == connector_id && c.point_index == point_index)?;
        Some(self.items.remove(pos))
    }

    pub fn get(&self, connector_id: ShapeId, point_index: usize) -> Option<&Connection> {
        self.items
            .iter()
            .find(|c| c.connector_id == connector_id && c.point_index == point_index)
    }

    /// All bindings of a connector.
    pub fn for_connector(&self, connector_id: ShapeId) -> impl Iterator<Item = &Connection> {
        self.items.iter().filter(move |c| c.connector_id == connector_id)
    }

    /// All bindings that attach to `shape_id`.
    pub fn targeting(&self, shape_id: ShapeId) -> impl Iterator<Item = &Connection> {
        self.items.iter().filter(move |c| c.target_id == shape_id)
    }

    /// Drop every binding that references a deleted shape, as connector or target.
    pub fn remove_shape(&mut self, shape_id: ShapeId) -> Vec<Connection> {
        let (removed, kept): (Vec<Connection>, Vec<Connection>) = self
            .items
            .drain(..)
            .partition(|c| c.connector_id == shape_id || c.target_id == shape_id);
        self.items = kept;
        removed
    }

    /// Apply a side update. Returns false if the binding no longer exists.
    pub fn apply(&mut self, update: &SideUpdate) -> bool {
        match self
            .items
            .iter_mut()
            .find(|c| c.connector_id == update.connector_id && c.point_index == update.point_index)
        {
            Some(connection) => {
                connection.side = update.side;
                true
            }
            None => false,
        }
    }

    /// Move a binding to its point's new index, evicting whatever was bound
    /// there. Returns false if nothing was bound at `update.from`.
    pub fn reindex(&mut self, update: &IndexUpdate) -> bool {
        let Some(mut connection) = self.disconnect(update.connector_id, update.from) else {
            return false;
        };
        connection.point_index = update.to;
        self.insert(connection);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
