//! Engine tunables.
//!
//! Every distance is in canvas units. The defaults match what the editor
//! ships with; hosts can override them from a JSON settings blob.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Distance a connector endpoint is pushed off the outline when it carries a marker.
pub const MARKER_OFFSET: f64 = 12.0;

/// Radius within which a dragged endpoint attaches to a connection point.
pub const SNAP_RADIUS: f64 = 25.0;

/// Endpoints closer than this are joined by a straight segment instead of an elbow.
pub const ELBOW_DIRECT_THRESHOLD: f64 = 20.0;

/// Padding around a connector's points when computing its frame.
pub const LINE_PADDING: f64 = 10.0;

/// Rounds of side re-evaluation when both ends of an elbow connector are dynamic.
pub const SIDE_ITERATIONS: usize = 3;

/// Maximum edge/center mismatch for an alignment guide to appear.
pub const GUIDE_THRESHOLD: f64 = 5.0;

/// How far an alignment guide extends past the shapes it connects.
pub const GUIDE_EXTENSION: f64 = 50.0;

/// Guides closer than this are merged into one.
pub const GUIDE_MERGE_TOLERANCE: f64 = 1.0;

/// Tunables for the routing and alignment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Outward offset applied to endpoints that carry a marker.
    pub marker_offset: f64,
    /// Attach radius for nearest-point search.
    pub snap_radius: f64,
    /// Below this endpoint distance elbow routes collapse to a straight segment.
    pub elbow_direct_threshold: f64,
    /// Padding around connector points.
    pub line_padding: f64,
    /// Fixed-point rounds for two dynamic elbow endpoints.
    pub side_iterations: usize,
    /// Alignment guide threshold.
    pub guide_threshold: f64,
    /// Alignment guide extension past the aligned shapes.
    pub guide_extension: f64,
    /// Tolerance for merging guides at the same coordinate.
    pub guide_merge_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            marker_offset: MARKER_OFFSET,
            snap_radius: SNAP_RADIUS,
            elbow_direct_threshold: ELBOW_DIRECT_THRESHOLD,
            line_padding: LINE_PADDING,
            side_iterations: SIDE_ITERATIONS,
            guide_threshold: GUIDE_THRESHOLD,
            guide_extension: GUIDE_EXTENSION,
            guide_merge_tolerance: GUIDE_MERGE_TOLERANCE,
        }
    }
}

impl EngineConfig {
    /// Create a config with the default tunables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> EngineResult<()> {
        let distances = [
            ("marker_offset", self.marker_offset),
            ("snap_radius", self.snap_radius),
            ("elbow_direct_threshold", self.elbow_direct_threshold),
            ("line_padding", self.line_padding),
            ("guide_threshold", self.guide_threshold),
            ("guide_extension", self.guide_extension),
            ("guide_merge_tolerance", self.guide_merge_tolerance),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be a finite non-negative distance, got {value}"
                )));
            }
        }
        if self.side_iterations == 0 {
            return Err(EngineError::InvalidConfig(
                "side_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
