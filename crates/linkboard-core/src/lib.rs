//! Linkboard Core Library
//!
//! Connection and routing geometry for the Linkboard diagram editor: where
//! connectors attach to shapes, how elbow and straight connectors are routed,
//! how they follow shapes as those move, and which alignment guides appear
//! while shapes are dragged.

pub mod alignment;
pub mod anchor;
pub mod config;
pub mod connection;
pub mod elbow;
pub mod error;
pub mod geometry;
pub mod maintenance;
pub mod normalize;
pub mod search;
pub mod shapes;

pub use alignment::{
    AlignmentGuide, DragAlignment, GuideKind, GuideOrientation, GuideSet, align_drag, find_guides,
    snap,
};
pub use anchor::{connection_points, point_on_boundary};
pub use config::EngineConfig;
pub use connection::{
    Connection, ConnectionSide, Connections, EndpointContext, IndexUpdate, SideUpdate,
};
pub use elbow::{RouteOptions, adjust_elbow, compute_elbow_path, optimal_elbow_sides, route};
pub use error::{EngineError, EngineResult};
pub use maintenance::{Coordinator, MaintenanceResult, NewConnector};
pub use normalize::{LineFrame, normalize, normalize_connector};
pub use search::{NearestPoint, SideChoice, best_side_for, nearest_across_shapes};
pub use shapes::{
    ConnectorStyle, Endpoint, LineType, Marker, Shape, ShapeId, ShapeKind, ShapeSource,
};
