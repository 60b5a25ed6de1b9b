//! Keeping connectors attached while shapes move.
//!
//! The [`Coordinator`] borrows the application's shapes and connection table,
//! recomputes every connector affected by a change and hands back updated
//! copies. It never writes to its inputs; the caller commits the returned
//! connectors and binding updates in one step.

use crate::anchor::point_on_boundary;
use crate::config::EngineConfig;
use crate::connection::{
    Connection, ConnectionSide, Connections, EndpointContext, IndexUpdate, SideUpdate,
};
use crate::elbow::{RouteOptions, adjust_elbow, bend_point, optimal_elbow_sides, route};
use crate::geometry::midpoint;
use crate::normalize::normalize_connector;
use crate::search::{NearestPoint, best_side_for, nearest_across_shapes};
use crate::shapes::{ConnectorStyle, Endpoint, LineType, Shape, ShapeId, ShapeKind, ShapeSource};
use kurbo::Point;
use std::collections::HashMap;

/// Shapes that replace their stored copies for one maintenance pass.
type Overrides<'s> = HashMap<ShapeId, &'s Shape>;

/// A connector point bound to a shape that still exists.
type Bound<'s> = (&'s Connection, &'s Shape);

/// Everything a maintenance pass wants the application to commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceResult {
    /// Re-routed and re-framed connectors.
    pub connectors: Vec<Shape>,
    /// Connections whose side changed, keyed by their current index.
    pub side_updates: Vec<SideUpdate>,
    /// Elbow end bindings whose point moved to another index.
    pub index_updates: Vec<IndexUpdate>,
    /// Where a dragged endpoint would attach, if it came within the snap radius.
    pub attach_candidate: Option<NearestPoint>,
    /// Index of the dragged endpoint in the returned connector.
    pub attach_index: Option<usize>,
}

impl MaintenanceResult {
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
            && self.side_updates.is_empty()
            && self.index_updates.is_empty()
            && self.attach_candidate.is_none()
    }

    /// Commit the binding changes to `connections`.
    ///
    /// Side updates go first since they name the indices from before the
    /// re-route. Returns false if any update found no binding to change.
    pub fn apply_to(&self, connections: &mut Connections) -> bool {
        let mut all_applied = true;
        for update in &self.side_updates {
            all_applied &= connections.apply(update);
        }
        for update in &self.index_updates {
            all_applied &= connections.reindex(update);
        }
        all_applied
    }

    /// The updated copy of a connector, if this pass touched it.
    pub fn connector(&self, id: ShapeId) -> Option<&Shape> {
        self.connectors.iter().find(|s| s.id() == id)
    }
}

/// A freshly built connector and the bindings that attach it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConnector {
    pub shape: Shape,
    pub connections: [Connection; 2],
}

/// The binding on the start of an elbow connector.
fn start_binding(bindings: &[Connection]) -> Option<&Connection> {
    bindings.iter().find(|c| c.point_index == 0)
}

/// The binding on the end of an elbow connector.
///
/// The end moves between index 1 and index 2 as the route gains or loses
/// its bend, so this is the binding on the highest index.
fn end_binding(bindings: &[Connection]) -> Option<&Connection> {
    bindings
        .iter()
        .filter(|c| c.point_index > 0)
        .max_by_key(|c| c.point_index)
}

/// Report the elbow end binding if it no longer sits on the last point.
fn record_index(updates: &mut Vec<IndexUpdate>, bindings: &[Connection], last: usize) {
    if let Some(binding) = end_binding(bindings).filter(|c| c.point_index != last) {
        updates.push(IndexUpdate {
            connector_id: binding.connector_id,
            from: binding.point_index,
            to: last,
        });
    }
}

fn record_side(updates: &mut Vec<SideUpdate>, binding: &Connection, side: ConnectionSide) {
    if binding.side != side {
        updates.push(SideUpdate {
            connector_id: binding.connector_id,
            point_index: binding.point_index,
            side,
        });
    }
}

/// Recomputes connectors bound to shapes that moved, resized or were edited.
pub struct Coordinator<'a, S: ShapeSource + ?Sized> {
    shapes: &'a S,
    connections: &'a Connections,
    config: &'a EngineConfig,
}

impl<'a, S: ShapeSource + ?Sized> Coordinator<'a, S> {
    pub fn new(shapes: &'a S, connections: &'a Connections, config: &'a EngineConfig) -> Self {
        Self {
            shapes,
            connections,
            config,
        }
    }

    /// Update connectors after `shape` was moved.
    ///
    /// `shape` is the committed state; it wins over the stored copy.
    pub fn on_shape_moved(&self, shape: &Shape) -> MaintenanceResult {
        self.on_shapes_moved(std::slice::from_ref(shape))
    }

    /// Update connectors after `shape` was resized.
    pub fn on_shape_resized(&self, shape: &Shape) -> MaintenanceResult {
        self.on_shapes_moved(std::slice::from_ref(shape))
    }

    /// Update connectors after several shapes changed in the same frame.
    ///
    /// A connector bound to more than one of them is recomputed once, seeing
    /// all of their new states. Moved connectors that are themselves bound
    /// are pulled back onto their targets.
    pub fn on_shapes_moved(&self, moved: &[Shape]) -> MaintenanceResult {
        let overrides: Overrides = moved.iter().map(|s| (s.id(), s)).collect();
        let mut affected: Vec<ShapeId> = Vec::new();
        for shape in moved {
            let bound_here = self.connections.targeting(shape.id()).map(|c| c.connector_id);
            let self_bound = Some(shape.id()).filter(|id| {
                shape.is_connector() && self.connections.for_connector(*id).next().is_some()
            });
            for id in bound_here.chain(self_bound) {
                if !affected.contains(&id) {
                    affected.push(id);
                }
            }
        }
        log::debug!(
            "{} shape(s) changed, {} connector(s) to refresh",
            moved.len(),
            affected.len()
        );

        let mut result = MaintenanceResult::default();
        for connector_id in affected {
            let Some(connector) = self.lookup(connector_id, &overrides) else {
                log::warn!("Connector {} is bound but missing; skipping", connector_id);
                continue;
            };
            if !connector.is_connector() {
                log::warn!(
                    "Shape {} is bound as a connector but is a {:?}",
                    connector_id,
                    connector.kind
                );
                continue;
            }
            self.refresh(connector, &overrides, &mut result);
        }
        result
    }

    /// Update a connector after the user dragged point `index` to `new_pos`
    /// (canvas coordinates).
    ///
    /// A dragged endpoint snaps to the nearest connection point within the
    /// snap radius and reports it as `attach_candidate`; committing the
    /// binding is up to the caller, on the point at `attach_index`. Dynamic
    /// bindings on the other points re-aim at the new position.
    pub fn on_point_moved(
        &self,
        connector: &Shape,
        index: usize,
        new_pos: Point,
    ) -> MaintenanceResult {
        let mut points = connector.world_points();
        if index >= points.len() {
            log::warn!(
                "Point {} out of range for connector {} with {} points",
                index,
                connector.id(),
                points.len()
            );
            return MaintenanceResult::default();
        }

        let mut result = MaintenanceResult::default();
        let mut moved_side = None;
        points[index] = new_pos;
        if connector.endpoint_at(index).is_some() {
            let ctx = EndpointContext::for_point(connector, index);
            if let Some(candidate) = nearest_across_shapes(
                self.shapes.iter_shapes(),
                new_pos,
                Some(connector.id()),
                self.config.snap_radius,
                &ctx,
                self.config,
            ) {
                points[index] = candidate.point;
                moved_side = Some(candidate.side);
                result.attach_candidate = Some(candidate);
            }
        }

        let bindings: Vec<Connection> =
            self.connections.for_connector(connector.id()).copied().collect();
        let overrides = Overrides::new();
        let mut updates = Vec::new();
        if connector.is_elbow() {
            points = self.drag_elbow(
                connector,
                &points,
                index,
                moved_side,
                &bindings,
                &overrides,
                &mut updates,
            );
            record_index(&mut result.index_updates, &bindings, points.len() - 1);
        } else {
            self.refresh_straight(
                connector,
                &mut points,
                &bindings,
                Some(index),
                &overrides,
                &mut updates,
            );
        }

        if result.attach_candidate.is_some() {
            result.attach_index = match connector.endpoint_at(index) {
                Some(Endpoint::End) => Some(points.len() - 1),
                _ => Some(index),
            };
        }
        result.connectors.push(self.finish(connector, &points));
        result.side_updates = updates;
        result
    }

    /// Build an elbow connector from `from` to `to` on the sides that keep
    /// the bend outside both shapes, with dynamic bindings at both ends.
    ///
    /// Returns `None` if either shape has no size yet.
    pub fn connect_elbow(
        &self,
        from: &Shape,
        to: &Shape,
        kind: ShapeKind,
        style: ConnectorStyle,
    ) -> Option<NewConnector> {
        let (from_side, to_side) = optimal_elbow_sides(from, to, self.config)?;
        let style = ConnectorStyle {
            line_type: LineType::Elbow,
            ..style
        };
        // Marker offsets depend on the endpoint, so build a template first.
        let template = Shape::connector(kind, &[from.position, to.position], style);
        let start_ctx = EndpointContext::for_point(&template, 0);
        let end_ctx = EndpointContext::for_point(&template, 1);
        let start = point_on_boundary(from, from_side, &start_ctx, self.config);
        let end = point_on_boundary(to, to_side, &end_ctx, self.config);
        let options = RouteOptions::default();
        let path = route(start, end, Some(from_side), Some(to_side), options, self.config);

        let connector = Shape::connector(kind, &path, style);
        let shape = normalize_connector(&connector, self.config.line_padding);
        let last = shape.points.len() - 1;
        let connections = [
            Connection {
                connector_id: shape.id(),
                point_index: 0,
                target_id: from.id(),
                side: from_side,
                dynamic: true,
            },
            Connection {
                connector_id: shape.id(),
                point_index: last,
                target_id: to.id(),
                side: to_side,
                dynamic: true,
            },
        ];
        Some(NewConnector { shape, connections })
    }

    fn lookup<'s>(&'s self, id: ShapeId, overrides: &Overrides<'s>) -> Option<&'s Shape> {
        overrides.get(&id).copied().or_else(|| self.shapes.shape(id))
    }

    /// Target of a binding, logging when it has gone missing.
    fn target<'s>(&'s self, binding: &Connection, overrides: &Overrides<'s>) -> Option<&'s Shape> {
        let found = self.lookup(binding.target_id, overrides);
        if found.is_none() {
            log::warn!(
                "Connector {} point {} is bound to missing shape {}; leaving it in place",
                binding.connector_id,
                binding.point_index,
                binding.target_id
            );
        }
        found
    }

    fn bound<'s>(
        &'s self,
        binding: Option<&'s Connection>,
        overrides: &Overrides<'s>,
    ) -> Option<Bound<'s>> {
        let binding = binding?;
        self.target(binding, overrides).map(|shape| (binding, shape))
    }

    /// Side and point for connector point `index`, bound by `binding` and
    /// aimed at `aim`.
    fn resolve(
        &self,
        connector: &Shape,
        index: usize,
        binding: &Connection,
        target: &Shape,
        aim: Point,
    ) -> (ConnectionSide, Point) {
        let ctx = EndpointContext::for_point(connector, index);
        let side = if binding.dynamic {
            best_side_for(target, aim, &ctx, self.config).side
        } else {
            binding.side
        };
        (side, point_on_boundary(target, side, &ctx, self.config))
    }

    fn refresh(
        &self,
        connector: &Shape,
        overrides: &Overrides<'_>,
        result: &mut MaintenanceResult,
    ) {
        let mut points = connector.world_points();
        if points.len() < 2 {
            log::warn!("Connector {} has fewer than two points", connector.id());
            result.connectors.push(connector.clone());
            return;
        }
        let bindings: Vec<Connection> =
            self.connections.for_connector(connector.id()).copied().collect();
        let updates = &mut result.side_updates;
        if connector.is_elbow() {
            points = self.refresh_elbow(connector, &points, &bindings, overrides, updates);
            record_index(&mut result.index_updates, &bindings, points.len() - 1);
        } else {
            self.refresh_straight(connector, &mut points, &bindings, None, overrides, updates);
        }
        result.connectors.push(self.finish(connector, &points));
    }

    fn finish(&self, connector: &Shape, world_points: &[Point]) -> Shape {
        let mut updated = connector.clone();
        updated.set_world_points(world_points);
        normalize_connector(&updated, self.config.line_padding)
    }

    fn refresh_elbow(
        &self,
        connector: &Shape,
        points: &[Point],
        bindings: &[Connection],
        overrides: &Overrides<'_>,
        updates: &mut Vec<SideUpdate>,
    ) -> Vec<Point> {
        let last = points.len() - 1;
        let start_bound = self.bound(start_binding(bindings), overrides);
        let end_bound = self.bound(end_binding(bindings), overrides);

        let mut start = points[0];
        let mut end = points[last];
        let mut start_side = None;
        let mut end_side = None;
        match (start_bound, end_bound) {
            (Some(a), Some(b)) if a.0.dynamic && b.0.dynamic => {
                let ((a_side, a_point), (b_side, b_point)) =
                    self.converge(connector, a, b, start, end);
                start = a_point;
                start_side = Some(a_side);
                end = b_point;
                end_side = Some(b_side);
            }
            (a, b) => {
                if let Some((binding, target)) = a {
                    let (side, point) = self.resolve(connector, 0, binding, target, end);
                    start = point;
                    start_side = Some(side);
                }
                if let Some((binding, target)) = b {
                    let (side, point) = self.resolve(connector, last, binding, target, start);
                    end = point;
                    end_side = Some(side);
                }
            }
        }

        if let (Some((binding, _)), Some(side)) = (start_bound, start_side) {
            record_side(updates, binding, side);
        }
        if let (Some((binding, _)), Some(side)) = (end_bound, end_side) {
            record_side(updates, binding, side);
        }
        route(start, end, start_side, end_side, RouteOptions::default(), self.config)
    }

    /// Alternate re-aiming both dynamic ends of an elbow at each other.
    ///
    /// Each end's best side depends on the other end's point, so this runs
    /// a bounded number of rounds (`side_iterations`) and stops early once
    /// both sides hold steady. Convergence is not guaranteed in general.
    fn converge(
        &self,
        connector: &Shape,
        start: Bound<'_>,
        end: Bound<'_>,
        mut a: Point,
        mut b: Point,
    ) -> ((ConnectionSide, Point), (ConnectionSide, Point)) {
        let a_ctx = EndpointContext::for_point(connector, 0);
        let b_ctx = EndpointContext::for_point(connector, connector.points.len().saturating_sub(1));
        let mut a_side = start.0.side;
        let mut b_side = end.0.side;
        for round in 0..self.config.side_iterations {
            let next_a = best_side_for(start.1, b, &a_ctx, self.config);
            let next_b = best_side_for(end.1, next_a.point, &b_ctx, self.config);
            let steady = round > 0 && next_a.side == a_side && next_b.side == b_side;
            a_side = next_a.side;
            a = next_a.point;
            b_side = next_b.side;
            b = next_b.point;
            if steady {
                log::trace!(
                    "Elbow sides for {} settled after {} rounds",
                    connector.id(),
                    round + 1
                );
                break;
            }
        }
        ((a_side, a), (b_side, b))
    }

    /// Re-place every bound point of a straight connector independently.
    ///
    /// Interior points aim at the midpoint of their neighbors, endpoints at
    /// the opposite endpoint. `skip` is the point the user is dragging.
    fn refresh_straight(
        &self,
        connector: &Shape,
        points: &mut [Point],
        bindings: &[Connection],
        skip: Option<usize>,
        overrides: &Overrides<'_>,
        updates: &mut Vec<SideUpdate>,
    ) {
        let original = points.to_vec();
        let last = original.len() - 1;
        for binding in bindings {
            let index = binding.point_index;
            if Some(index) == skip {
                continue;
            }
            if index > last {
                log::warn!(
                    "Binding for point {} of connector {} is out of range",
                    index,
                    connector.id()
                );
                continue;
            }
            let Some(target) = self.target(binding, overrides) else {
                continue;
            };
            let aim = if index == 0 {
                original[last]
            } else if index == last {
                original[0]
            } else {
                midpoint(original[index - 1], original[index + 1])
            };
            let (side, point) = self.resolve(connector, index, binding, target, aim);
            points[index] = point;
            record_side(updates, binding, side);
        }
    }

    /// Re-route an elbow connector while one of its points is dragged.
    ///
    /// The binding on the opposite end re-aims at the dragged point; the
    /// dragged end's own binding is left for the caller to replace.
    #[allow(clippy::too_many_arguments)]
    fn drag_elbow(
        &self,
        connector: &Shape,
        points: &[Point],
        index: usize,
        moved_side: Option<ConnectionSide>,
        bindings: &[Connection],
        overrides: &Overrides<'_>,
        updates: &mut Vec<SideUpdate>,
    ) -> Vec<Point> {
        let last = points.len() - 1;
        let mut start = points[0];
        let mut end = points[last];

        if index != 0 && index != last {
            // Dragging the bend flips it to whichever corner is closer.
            let grabbed = points[index];
            let horizontal = grabbed.distance(bend_point(start, end, true))
                <= grabbed.distance(bend_point(start, end, false));
            let options = RouteOptions {
                horizontal_first: Some(horizontal),
            };
            return route(start, end, None, None, options, self.config);
        }

        let (mut start_side, mut end_side) = if index == 0 {
            (moved_side, None)
        } else {
            (None, moved_side)
        };
        let (fixed, fixed_index) = if index == 0 {
            (end_binding(bindings), last)
        } else {
            (start_binding(bindings), 0)
        };
        if let Some((binding, target)) = self.bound(fixed, overrides) {
            let (side, point) =
                self.resolve(connector, fixed_index, binding, target, points[index]);
            record_side(updates, binding, side);
            if fixed_index == 0 {
                start = point;
                start_side = Some(side);
            } else {
                end = point;
                end_side = Some(side);
            }
        }

        if start_side.is_none()
            && end_side.is_none()
            && points.len() >= 3
            && start.distance(end) >= self.config.elbow_direct_threshold
        {
            // Free elbow: keep the orientation the user already has.
            return adjust_elbow(points, None);
        }
        route(start, end, start_side, end_side, RouteOptions::default(), self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Marker;
    use kurbo::{Size, Vec2};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn rect(x: f64, y: f64) -> Shape {
        Shape::new(ShapeKind::Rectangle, Point::new(x, y), Size::new(100.0, 100.0))
    }

    fn elbow_style() -> ConnectorStyle {
        ConnectorStyle {
            line_type: LineType::Elbow,
            ..ConnectorStyle::default()
        }
    }

    fn bind(
        connections: &mut Connections,
        connector: &Shape,
        index: usize,
        target: &Shape,
        side: ConnectionSide,
        dynamic: bool,
    ) {
        connections
            .connect(connector, index, target.id(), side, dynamic)
            .unwrap();
    }

    #[test]
    fn test_fixed_elbow_follows_moved_shape() {
        init_logging();
        let a = rect(0.0, 0.0);
        let b = rect(300.0, 0.0);
        let line = Shape::connector(
            ShapeKind::Arrow,
            &[Point::new(100.0, 50.0), Point::new(300.0, 50.0)],
            elbow_style(),
        );
        let mut connections = Connections::new();
        bind(&mut connections, &line, 0, &a, ConnectionSide::East, false);
        bind(&mut connections, &line, 1, &b, ConnectionSide::West, false);
        let shapes = vec![a.clone(), b.clone(), line.clone()];
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let moved = b.translated(Vec2::new(0.0, 200.0));
        let result = coordinator.on_shape_moved(&moved);
        assert!(result.side_updates.is_empty());
        let updated = result.connector(line.id()).unwrap();
        assert_eq!(
            updated.world_points(),
            vec![Point::new(100.0, 50.0), Point::new(300.0, 50.0), Point::new(300.0, 250.0)]
        );
    }

    #[test]
    fn test_fixed_elbow_follows_second_move() {
        let a = rect(0.0, 0.0);
        let b = rect(300.0, 0.0);
        let line = Shape::connector(
            ShapeKind::Arrow,
            &[Point::new(100.0, 50.0), Point::new(300.0, 50.0)],
            elbow_style(),
        );
        let mut connections = Connections::new();
        bind(&mut connections, &line, 0, &a, ConnectionSide::East, false);
        bind(&mut connections, &line, 1, &b, ConnectionSide::West, false);
        let config = EngineConfig::default();

        // The bend appears, so the end moves from index 1 to index 2.
        let first_b = b.translated(Vec2::new(0.0, 200.0));
        let first = {
            let shapes = vec![a.clone(), b.clone(), line.clone()];
            Coordinator::new(shapes.as_slice(), &connections, &config).on_shape_moved(&first_b)
        };
        assert_eq!(
            first.index_updates,
            vec![IndexUpdate {
                connector_id: line.id(),
                from: 1,
                to: 2,
            }]
        );
        assert!(first.apply_to(&mut connections));
        assert!(connections.get(line.id(), 1).is_none());
        assert_eq!(connections.get(line.id(), 2).map(|c| c.target_id), Some(b.id()));
        assert!(!first.apply_to(&mut connections));
        let routed = first.connector(line.id()).unwrap().clone();

        let second_b = first_b.translated(Vec2::new(0.0, 100.0));
        let second = {
            let shapes = vec![a.clone(), first_b.clone(), routed];
            Coordinator::new(shapes.as_slice(), &connections, &config).on_shape_moved(&second_b)
        };
        assert!(second.index_updates.is_empty());
        assert_eq!(
            second.connector(line.id()).unwrap().world_points(),
            vec![Point::new(100.0, 50.0), Point::new(300.0, 50.0), Point::new(300.0, 350.0)]
        );
    }

    #[test]
    fn test_elbow_end_bound_past_last_point_still_follows() {
        let a = rect(0.0, 0.0);
        let b = rect(110.0, 0.0);
        // Collapsed to two points, but the end is still bound on index 2.
        let line = Shape::connector(
            ShapeKind::Arrow,
            &[Point::new(100.0, 50.0), Point::new(110.0, 50.0)],
            elbow_style(),
        );
        let mut connections = Connections::new();
        connections.insert(Connection {
            connector_id: line.id(),
            point_index: 0,
            target_id: a.id(),
            side: ConnectionSide::East,
            dynamic: true,
        });
        connections.insert(Connection {
            connector_id: line.id(),
            point_index: 2,
            target_id: b.id(),
            side: ConnectionSide::West,
            dynamic: true,
        });
        let shapes = vec![a.clone(), b.clone(), line.clone()];
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let result = coordinator.on_shape_moved(&b.translated(Vec2::new(300.0, 300.0)));
        let pts = result.connector(line.id()).unwrap().world_points();
        assert_eq!(pts.last(), Some(&Point::new(410.0, 350.0)));
        assert!(result.index_updates.is_empty());
        assert!(result.side_updates.is_empty());
    }

    #[test]
    fn test_straight_connector_endpoint_replaced() {
        let a = rect(0.0, 0.0);
        let b = rect(300.0, 0.0);
        let line = Shape::connector(
            ShapeKind::Line,
            &[Point::new(100.0, 50.0), Point::new(300.0, 50.0)],
            ConnectorStyle::default(),
        );
        let mut connections = Connections::new();
        bind(&mut connections, &line, 1, &b, ConnectionSide::West, false);
        let shapes = vec![a, b.clone(), line.clone()];
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let moved = b.translated(Vec2::new(50.0, 100.0));
        let result = coordinator.on_shape_moved(&moved);
        let updated = result.connector(line.id()).unwrap();
        assert_eq!(
            updated.world_points(),
            vec![Point::new(100.0, 50.0), Point::new(350.0, 150.0)]
        );
        assert!(updated.points.iter().all(|p| p.x >= 0.0 && p.y >= 0.0));
    }

    #[test]
    fn test_dynamic_side_flips_when_shape_passes_over() {
        let a = rect(0.0, 0.0);
        let b = rect(300.0, 0.0);
        let line = Shape::connector(
            ShapeKind::Line,
            &[Point::new(100.0, 50.0), Point::new(300.0, 50.0)],
            ConnectorStyle::default(),
        );
        let mut connections = Connections::new();
        bind(&mut connections, &line, 1, &b, ConnectionSide::West, true);
        let shapes = vec![a, b.clone(), line.clone()];
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        // B now sits directly below the start point.
        let moved = b.translated(Vec2::new(-250.0, 300.0));
        let result = coordinator.on_shape_moved(&moved);
        assert_eq!(
            result.side_updates,
            vec![SideUpdate {
                connector_id: line.id(),
                point_index: 1,
                side: ConnectionSide::North,
            }]
        );
        let updated = result.connector(line.id()).unwrap();
        assert_eq!(updated.world_points()[1], Point::new(100.0, 300.0));
    }

    #[test]
    fn test_both_dynamic_elbow_converges() {
        let a = rect(0.0, 0.0);
        let b = rect(300.0, 0.0);
        let line = Shape::connector(
            ShapeKind::Arrow,
            &[Point::new(100.0, 50.0), Point::new(300.0, 50.0)],
            elbow_style(),
        );
        let mut connections = Connections::new();
        bind(&mut connections, &line, 0, &a, ConnectionSide::East, true);
        bind(&mut connections, &line, 1, &b, ConnectionSide::West, true);
        let shapes = vec![a.clone(), b.clone(), line.clone()];
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        // B goes far below A.
        let moved = b.translated(Vec2::new(-300.0, 500.0));
        let result = coordinator.on_shape_moved(&moved);
        let updated = result.connector(line.id()).unwrap();
        let pts = updated.world_points();
        assert_eq!(pts.first(), Some(&Point::new(50.0, 100.0)));
        assert_eq!(pts.last(), Some(&Point::new(50.0, 500.0)));
        assert_eq!(result.side_updates.len(), 2);
        let updated_to = |index, side| {
            result
                .side_updates
                .iter()
                .any(|u| u.point_index == index && u.side == side)
        };
        assert!(updated_to(0, ConnectionSide::South));
        assert!(updated_to(1, ConnectionSide::North));
        assert_eq!(
            result.index_updates,
            vec![IndexUpdate {
                connector_id: line.id(),
                from: 1,
                to: 2,
            }]
        );
    }

    #[test]
    fn test_missing_target_leaves_point() {
        init_logging();
        let a = rect(0.0, 0.0);
        let ghost = rect(500.0, 500.0);
        let line = Shape::connector(
            ShapeKind::Line,
            &[Point::new(100.0, 50.0), Point::new(500.0, 550.0)],
            ConnectorStyle::default(),
        );
        let mut connections = Connections::new();
        bind(&mut connections, &line, 0, &a, ConnectionSide::East, false);
        bind(&mut connections, &line, 1, &ghost, ConnectionSide::West, true);
        // The ghost is not in the shape list.
        let shapes = vec![a.clone(), line.clone()];
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let moved = a.translated(Vec2::new(0.0, 40.0));
        let result = coordinator.on_shape_moved(&moved);
        let updated = result.connector(line.id()).unwrap();
        let pts = updated.world_points();
        assert_eq!(pts[0], Point::new(100.0, 90.0));
        assert_eq!(pts[1], Point::new(500.0, 550.0));
        assert!(result.side_updates.is_empty());
    }

    #[test]
    fn test_interior_point_aims_at_neighbor_midpoint() {
        let hub = rect(100.0, 200.0);
        let line = Shape::connector(
            ShapeKind::Line,
            &[Point::new(0.0, 0.0), Point::new(150.0, 150.0), Point::new(300.0, 0.0)],
            ConnectorStyle::default(),
        );
        let mut connections = Connections::new();
        bind(&mut connections, &line, 1, &hub, ConnectionSide::West, true);
        let shapes = vec![hub.clone(), line.clone()];
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let result = coordinator.on_shape_moved(&hub);
        let updated = result.connector(line.id()).unwrap();
        // Neighbors' midpoint is (150, 0): straight above the hub.
        assert_eq!(updated.world_points()[1], Point::new(150.0, 200.0));
        assert_eq!(result.side_updates[0].side, ConnectionSide::North);
    }

    #[test]
    fn test_marker_offset_applied_to_bound_end() {
        let b = rect(300.0, 0.0);
        let line = Shape::connector(
            ShapeKind::Arrow,
            &[Point::new(0.0, 50.0), Point::new(288.0, 50.0)],
            ConnectorStyle {
                end_marker: Marker::Arrow,
                ..ConnectorStyle::default()
            },
        );
        let mut connections = Connections::new();
        bind(&mut connections, &line, 1, &b, ConnectionSide::West, false);
        let shapes = vec![b.clone(), line.clone()];
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let moved = b.translated(Vec2::new(100.0, 0.0));
        let result = coordinator.on_shape_moved(&moved);
        let updated = result.connector(line.id()).unwrap();
        assert_eq!(updated.world_points()[1], Point::new(388.0, 50.0));
    }

    #[test]
    fn test_batch_move_refreshes_connector_once() {
        let a = rect(0.0, 0.0);
        let b = rect(300.0, 0.0);
        let line = Shape::connector(
            ShapeKind::Line,
            &[Point::new(100.0, 50.0), Point::new(300.0, 50.0)],
            ConnectorStyle::default(),
        );
        let mut connections = Connections::new();
        bind(&mut connections, &line, 0, &a, ConnectionSide::East, false);
        bind(&mut connections, &line, 1, &b, ConnectionSide::West, false);
        let shapes = vec![a.clone(), b.clone(), line.clone()];
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let delta = Vec2::new(20.0, 30.0);
        let moved = [a.translated(delta), b.translated(delta), line.translated(delta)];
        let result = coordinator.on_shapes_moved(&moved);
        assert_eq!(result.connectors.len(), 1);
        let pts = result.connectors[0].world_points();
        assert_eq!(pts, vec![Point::new(120.0, 80.0), Point::new(320.0, 80.0)]);
    }

    #[test]
    fn test_unbound_shape_move_is_empty() {
        let a = rect(0.0, 0.0);
        let shapes = vec![a.clone()];
        let connections = Connections::new();
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);
        assert!(coordinator.on_shape_moved(&a.translated(Vec2::new(5.0, 5.0))).is_empty());
    }

    #[test]
    fn test_resize_moves_anchor() {
        let a = rect(0.0, 0.0);
        let line = Shape::connector(
            ShapeKind::Line,
            &[Point::new(100.0, 50.0), Point::new(400.0, 50.0)],
            ConnectorStyle::default(),
        );
        let mut connections = Connections::new();
        bind(&mut connections, &line, 0, &a, ConnectionSide::East, false);
        let shapes = vec![a.clone(), line.clone()];
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let result = coordinator.on_shape_resized(&a.resized(Size::new(200.0, 60.0)));
        let updated = result.connector(line.id()).unwrap();
        assert_eq!(updated.world_points()[0], Point::new(200.0, 30.0));
    }

    #[test]
    fn test_point_drag_snaps_to_nearby_shape() {
        let a = rect(0.0, 0.0);
        let b = rect(300.0, 0.0);
        let line = Shape::connector(
            ShapeKind::Line,
            &[Point::new(100.0, 50.0), Point::new(200.0, 50.0)],
            ConnectorStyle::default(),
        );
        let shapes = vec![a, b.clone(), line.clone()];
        let connections = Connections::new();
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let result = coordinator.on_point_moved(&line, 1, Point::new(290.0, 45.0));
        let candidate = result.attach_candidate.unwrap();
        assert_eq!(candidate.shape_id, b.id());
        assert_eq!(candidate.side, ConnectionSide::West);
        let updated = result.connector(line.id()).unwrap();
        assert_eq!(updated.world_points()[1], Point::new(300.0, 50.0));
    }

    #[test]
    fn test_elbow_drag_attach_index_follows_new_bend() {
        let b = rect(300.0, 200.0);
        let line = Shape::connector(
            ShapeKind::Line,
            &[Point::new(100.0, 50.0), Point::new(110.0, 50.0)],
            elbow_style(),
        );
        let shapes = vec![b.clone(), line.clone()];
        let mut connections = Connections::new();
        let config = EngineConfig::default();

        let result = Coordinator::new(shapes.as_slice(), &connections, &config).on_point_moved(
            &line,
            1,
            Point::new(290.0, 245.0),
        );
        let candidate = result.attach_candidate.unwrap();
        assert_eq!(candidate.side, ConnectionSide::West);
        assert_eq!(result.attach_index, Some(2));
        let updated = result.connector(line.id()).unwrap();
        assert_eq!(
            updated.world_points(),
            vec![Point::new(100.0, 50.0), Point::new(100.0, 250.0), Point::new(300.0, 250.0)]
        );

        let index = result.attach_index.unwrap();
        connections
            .connect(updated, index, candidate.shape_id, candidate.side, false)
            .unwrap();
        assert_eq!(connections.get(line.id(), 2).map(|c| c.target_id), Some(b.id()));
    }

    #[test]
    fn test_point_drag_free_space() {
        let line = Shape::connector(
            ShapeKind::Line,
            &[Point::new(100.0, 50.0), Point::new(200.0, 50.0)],
            ConnectorStyle::default(),
        );
        let shapes = vec![line.clone()];
        let connections = Connections::new();
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let result = coordinator.on_point_moved(&line, 1, Point::new(20.0, -80.0));
        assert!(result.attach_candidate.is_none());
        let updated = result.connector(line.id()).unwrap();
        assert_eq!(
            updated.world_points(),
            vec![Point::new(100.0, 50.0), Point::new(20.0, -80.0)]
        );
        assert!(updated.points.iter().all(|p| p.x >= 0.0 && p.y >= 0.0));
    }

    #[test]
    fn test_point_drag_reaims_other_dynamic_end() {
        let a = rect(0.0, 0.0);
        let line = Shape::connector(
            ShapeKind::Arrow,
            &[Point::new(100.0, 50.0), Point::new(400.0, 50.0)],
            elbow_style(),
        );
        let mut connections = Connections::new();
        bind(&mut connections, &line, 0, &a, ConnectionSide::East, true);
        let shapes = vec![a.clone(), line.clone()];
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let result = coordinator.on_point_moved(&line, 1, Point::new(50.0, 400.0));
        assert_eq!(result.side_updates.len(), 1);
        assert_eq!(result.side_updates[0].side, ConnectionSide::South);
        let pts = result.connector(line.id()).unwrap().world_points();
        assert_eq!(pts.first(), Some(&Point::new(50.0, 100.0)));
        assert_eq!(pts.last(), Some(&Point::new(50.0, 400.0)));
    }

    #[test]
    fn test_point_drag_out_of_range() {
        let line = Shape::connector(
            ShapeKind::Line,
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            ConnectorStyle::default(),
        );
        let shapes = vec![line.clone()];
        let connections = Connections::new();
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);
        assert!(coordinator.on_point_moved(&line, 5, Point::ZERO).is_empty());
    }

    #[test]
    fn test_free_elbow_drag_keeps_orientation() {
        let line = Shape::connector(
            ShapeKind::Line,
            &[Point::new(0.0, 0.0), Point::new(0.0, 100.0), Point::new(200.0, 100.0)],
            elbow_style(),
        );
        let shapes = vec![line.clone()];
        let connections = Connections::new();
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let result = coordinator.on_point_moved(&line, 2, Point::new(250.0, 180.0));
        let pts = result.connector(line.id()).unwrap().world_points();
        assert_eq!(
            pts,
            vec![Point::new(0.0, 0.0), Point::new(0.0, 180.0), Point::new(250.0, 180.0)]
        );
    }

    #[test]
    fn test_bend_drag_flips_orientation() {
        let line = Shape::connector(
            ShapeKind::Line,
            &[Point::new(0.0, 0.0), Point::new(0.0, 100.0), Point::new(200.0, 100.0)],
            elbow_style(),
        );
        let shapes = vec![line.clone()];
        let connections = Connections::new();
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let result = coordinator.on_point_moved(&line, 1, Point::new(190.0, 10.0));
        let pts = result.connector(line.id()).unwrap().world_points();
        assert_eq!(pts[1], Point::new(200.0, 0.0));
    }

    #[test]
    fn test_connect_elbow_builds_bound_connector() {
        let a = rect(0.0, 0.0);
        let b = rect(300.0, 200.0);
        let shapes = vec![a.clone(), b.clone()];
        let connections = Connections::new();
        let config = EngineConfig::default();
        let coordinator = Coordinator::new(shapes.as_slice(), &connections, &config);

        let built = coordinator
            .connect_elbow(&a, &b, ShapeKind::Arrow, ConnectorStyle::default())
            .unwrap();
        assert!(built.shape.is_elbow());
        assert_eq!(
            built.shape.world_points(),
            vec![Point::new(100.0, 50.0), Point::new(300.0, 50.0), Point::new(300.0, 250.0)]
        );
        assert_eq!(built.connections[0].side, ConnectionSide::East);
        assert_eq!(built.connections[1].side, ConnectionSide::West);
        assert_eq!(built.connections[1].point_index, 2);
        assert!(built.connections.iter().all(|c| c.dynamic));
    }
}
