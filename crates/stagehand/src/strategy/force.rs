//! Force-directed simulation shared by the force family and `comboForce`.
//!
//! Every step applies pairwise repulsion, spring forces along edges and a
//! weak pull toward the frame center, scaled by a cooling factor (`alpha`).
//! The simulation settles when it has cooled down, when nodes stop moving or
//! after `max_iteration` steps.

use std::f32::consts::PI;

use log::trace;

use stagehand_core::geometry::Point;

use super::{Frame, LayoutStrategy, Progress};
use crate::{config::LayoutConfig, error::LayoutError, snapshot::LayoutSnapshot};

/// Tuning of the force simulation. Every field can be set through the
/// option of the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceParams {
    /// Rest length of the spring along an edge.
    pub link_distance: f32,
    /// Repulsion between every pair of nodes.
    pub node_strength: f32,
    /// Spring constant along edges.
    pub edge_strength: f32,
    /// Velocity kept from one step to the next.
    pub damping: f32,
    /// Pull toward the frame center.
    pub gravity: f32,
    /// Extra distance kept between node outlines.
    pub node_spacing: f32,
    pub max_iteration: usize,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    /// Average per-node movement below which the run settles.
    pub min_movement: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            link_distance: 100.0,
            node_strength: 1000.0,
            edge_strength: 0.1,
            damping: 0.85,
            gravity: 0.05,
            node_spacing: 10.0,
            max_iteration: 300,
            alpha_decay: 0.028,
            alpha_min: 0.001,
            min_movement: 0.1,
        }
    }
}

impl ForceParams {
    /// Overrides the fields whose option is present in `patch`.
    pub fn apply(&mut self, patch: &LayoutConfig) -> Result<(), LayoutError> {
        let fields: [(&str, &mut f32); 8] = [
            ("link_distance", &mut self.link_distance),
            ("node_strength", &mut self.node_strength),
            ("edge_strength", &mut self.edge_strength),
            ("damping", &mut self.damping),
            ("gravity", &mut self.gravity),
            ("node_spacing", &mut self.node_spacing),
            ("alpha_decay", &mut self.alpha_decay),
            ("alpha_min", &mut self.alpha_min),
        ];
        for (key, field) in fields {
            if let Some(value) = patch.number_option(key)? {
                *field = value;
            }
        }
        if let Some(movement) = patch.number_option("min_movement")? {
            self.min_movement = movement;
        }
        if let Some(max) = patch.number_option("max_iteration")? {
            self.max_iteration = max.max(1.0) as usize;
        }
        if !(0.0..1.0).contains(&self.damping) {
            return Err(LayoutError::invalid_option(
                patch.kind().unwrap_or("force"),
                "damping",
                format!("expected a value in [0, 1), found {}", self.damping),
            ));
        }
        Ok(())
    }
}

/// State of a running force simulation.
#[derive(Debug, Clone)]
pub(crate) struct Simulation {
    pub params: ForceParams,
    pub center: Point,
    velocities: Vec<Point>,
    alpha: f32,
    iteration: usize,
}

impl Simulation {
    pub fn new(params: ForceParams, center: Point) -> Self {
        Self {
            params,
            center,
            velocities: Vec::new(),
            alpha: 1.0,
            iteration: 0,
        }
    }

    /// Restarts the simulation for `len` nodes.
    pub fn reset(&mut self, len: usize) {
        self.velocities = vec![Point::default(); len];
        self.alpha = 1.0;
        self.iteration = 0;
    }

    pub fn release(&mut self) {
        self.velocities = Vec::new();
    }

    /// Runs one step. `extra` may add forces, indexed like the positions it
    /// receives.
    pub fn step(
        &mut self,
        snapshot: &mut LayoutSnapshot,
        extra: impl FnOnce(&[Point], &mut [Point]),
    ) -> Progress {
        let count = snapshot.len();
        if count == 0 {
            return Progress::Settled;
        }
        if self.velocities.len() != count {
            self.reset(count);
        }

        let positions = snapshot.positions_or_origin();
        let radii: Vec<f32> = snapshot
            .nodes()
            .iter()
            .map(|node| {
                node.size()
                    .map_or(0.0, |size| (size.width() + size.height()) / 4.0)
            })
            .collect();
        let mut forces = vec![Point::default(); count];

        self.repel(&positions, &radii, &mut forces);
        self.attract(snapshot, &positions, &mut forces);
        for (force, position) in forces.iter_mut().zip(&positions) {
            *force = force.add_point(self.center.sub_point(*position).scale(self.params.gravity));
        }
        extra(&positions, &mut forces);

        let max_speed = self.params.link_distance.max(10.0) * 2.0;
        let mut movement = 0.0;
        for (index, force) in forces.into_iter().enumerate() {
            let mut velocity = self.velocities[index]
                .add_point(force.scale(self.alpha))
                .scale(self.params.damping);
            let speed = velocity.hypot();
            if speed > max_speed {
                velocity = velocity.scale(max_speed / speed);
            }
            if !velocity.is_finite() {
                velocity = Point::default();
            }
            self.velocities[index] = velocity;
            movement += velocity.hypot();
            snapshot.place(index, positions[index].add_point(velocity));
        }

        self.alpha *= 1.0 - self.params.alpha_decay;
        self.iteration += 1;
        let average = movement / count as f32;
        trace!(iteration = self.iteration, alpha = self.alpha, average; "Force step");

        if self.iteration >= self.params.max_iteration
            || self.alpha < self.params.alpha_min
            || average < self.params.min_movement
        {
            Progress::Settled
        } else {
            Progress::Running
        }
    }

    fn repel(&self, positions: &[Point], radii: &[f32], forces: &mut [Point]) {
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let mut trans = positions[i].sub_point(positions[j]);
                if trans.hypot() < 0.01 {
                    // Coincident nodes: separate along a per-pair direction.
                    let angle = (i * 7 + j * 13) as f32 * PI / 8.0;
                    trans = Point::new(angle.cos(), angle.sin());
                }
                let distance = trans.hypot().max(1.0);
                let min_distance = radii[i] + radii[j] + self.params.node_spacing;

                let factor = if distance < min_distance {
                    self.params.node_strength * (min_distance / distance).powi(2) / distance
                } else {
                    self.params.node_strength / distance
                };
                let push = trans.scale(factor / distance);
                forces[i] = forces[i].add_point(push);
                forces[j] = forces[j].sub_point(push);
            }
        }
    }

    fn attract(&self, snapshot: &LayoutSnapshot, positions: &[Point], forces: &mut [Point]) {
        for edge in snapshot.edges().iter().filter(|edge| !edge.is_loop()) {
            let (source, target) = (edge.source_index(), edge.target_index());
            let delta = positions[source].sub_point(positions[target]);
            let distance = delta.hypot().max(1.0);
            let stretch = self.params.edge_strength * (distance - self.params.link_distance);
            let pull = delta.scale(stretch / distance);
            forces[source] = forces[source].sub_point(pull);
            forces[target] = forces[target].add_point(pull);
        }
    }
}

/// Iterative force-directed layout, registered as `force`, `g6force` and
/// `gForce`.
///
/// `execute` only starts the simulation; each `tick` runs one step.
#[derive(Debug)]
pub struct ForceLayout {
    frame: Frame,
    simulation: Simulation,
}

impl ForceLayout {
    pub fn new(config: &LayoutConfig) -> Result<Self, LayoutError> {
        let mut params = ForceParams::default();
        params.apply(config)?;
        let frame = Frame::from_config(config);
        Ok(Self {
            frame,
            simulation: Simulation::new(params, frame.center),
        })
    }

    pub fn params(&self) -> &ForceParams {
        &self.simulation.params
    }
}

impl LayoutStrategy for ForceLayout {
    fn init(&mut self, snapshot: &LayoutSnapshot) {
        self.simulation.reset(snapshot.len());
    }

    fn update_config(&mut self, patch: &LayoutConfig) -> Result<(), LayoutError> {
        let mut params = self.simulation.params.clone();
        params.apply(patch)?;
        self.simulation.params = params;
        self.frame = self.frame.patched(patch);
        self.simulation.center = self.frame.center;
        Ok(())
    }

    fn execute(&mut self, snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
        self.simulation.reset(snapshot.len());
        if snapshot.is_empty() {
            return Ok(Progress::Settled);
        }
        Ok(Progress::Running)
    }

    fn tick(&mut self, snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
        Ok(self.simulation.step(snapshot, |_, _| {}))
    }

    fn enable_tick(&self) -> bool {
        true
    }

    fn destroy(&mut self) {
        self.simulation.release();
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use stagehand_core::{geometry::Size, identifier::Id};

    use super::*;
    use crate::snapshot::NodeRecord;

    fn pair(distance: f32) -> LayoutSnapshot {
        LayoutSnapshot::new(
            vec![
                NodeRecord::new("a").with_position(Point::new(400.0 - distance / 2.0, 300.0)),
                NodeRecord::new("b").with_position(Point::new(400.0 + distance / 2.0, 300.0)),
            ],
            vec![(None, Id::new("a"), Id::new("b"))],
            Vec::new(),
        )
    }

    fn run(layout: &mut ForceLayout, snapshot: &mut LayoutSnapshot) -> usize {
        layout.init(snapshot);
        assert_eq!(layout.execute(snapshot), Ok(Progress::Running));
        let mut ticks = 0;
        loop {
            ticks += 1;
            if layout.tick(snapshot).expect("tick").is_settled() {
                return ticks;
            }
        }
    }

    fn config() -> LayoutConfig {
        LayoutConfig::new("force").with_canvas_defaults(Size::new(800.0, 600.0))
    }

    #[test]
    fn test_settles_within_max_iteration() {
        let mut layout =
            ForceLayout::new(&config().with_option("max_iteration", 25)).expect("valid");
        let mut s = pair(10.0);

        let ticks = run(&mut layout, &mut s);

        assert!(ticks <= 25);
        assert!(s.all_positioned());
    }

    #[test]
    fn test_close_nodes_are_pushed_apart() {
        let mut layout = ForceLayout::new(&config()).expect("valid");
        let mut s = pair(2.0);

        run(&mut layout, &mut s);

        let distance = s.position(0).expect("a").sub_point(s.position(1).expect("b")).hypot();
        assert!(distance > 20.0, "nodes still {distance} apart");
    }

    #[test]
    fn test_coincident_nodes_separate() {
        let mut layout = ForceLayout::new(&config()).expect("valid");
        let mut s = pair(0.0);

        layout.init(&s);
        layout.tick(&mut s).expect("tick");

        assert_ne!(s.position(0), s.position(1));
    }

    #[test]
    fn test_update_keeps_unpatched_params() {
        let mut layout =
            ForceLayout::new(&config().with_option("node_strength", 500)).expect("valid");

        layout
            .update_config(&LayoutConfig::new("force").with_option("link_distance", 50))
            .expect("valid patch");

        assert_approx_eq!(f32, layout.params().link_distance, 50.0);
        assert_approx_eq!(f32, layout.params().node_strength, 500.0);
    }

    #[test]
    fn test_rejects_bad_damping() {
        assert!(ForceLayout::new(&config().with_option("damping", 1.5)).is_err());
    }

    #[test]
    fn test_is_iterative() {
        assert!(ForceLayout::new(&config()).expect("valid").enable_tick());
    }
}
