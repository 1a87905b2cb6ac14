//! Starting coordinates for nodes that have none.
//!
//! [`PositionInitializer`] guarantees every node in a snapshot has both
//! coordinates before a strategy sees it. Where coordinates come from is up to
//! the [`ScatterPolicy`]. Nodes missing a single axis keep the axis they have.

use std::{cell::RefCell, fmt};

use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

use stagehand_core::geometry::{Point, Size};

use crate::snapshot::LayoutSnapshot;

/// Chooses a starting coordinate for a node without one.
pub trait ScatterPolicy: fmt::Debug {
    /// Returns a point for the node at `index` out of `count` nodes.
    ///
    /// `center` and `canvas` describe the area the scatter should fill.
    fn scatter(&self, index: usize, count: usize, center: Point, canvas: Size) -> Point;
}

/// Uniform random offset within the canvas around the center.
///
/// Unseeded policies draw from the thread-local generator. Seeded policies
/// are reproducible across runs.
pub struct RandomScatter {
    rng: Option<RefCell<StdRng>>,
}

impl RandomScatter {
    pub fn new() -> Self {
        Self { rng: None }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Some(RefCell::new(StdRng::seed_from_u64(seed))),
        }
    }

    fn sample(&self) -> (f32, f32) {
        match &self.rng {
            Some(rng) => {
                let mut rng = rng.borrow_mut();
                (rng.random::<f32>(), rng.random::<f32>())
            }
            None => {
                let mut rng = rand::rng();
                (rng.random::<f32>(), rng.random::<f32>())
            }
        }
    }
}

impl Default for RandomScatter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RandomScatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomScatter")
            .field("seeded", &self.rng.is_some())
            .finish()
    }
}

impl ScatterPolicy for RandomScatter {
    fn scatter(&self, _index: usize, _count: usize, center: Point, canvas: Size) -> Point {
        let (u, v) = self.sample();
        Point::new(
            center.x() + (u - 0.5) * canvas.width(),
            center.y() + (v - 0.5) * canvas.height(),
        )
    }
}

/// Deterministic grid over 85% of the canvas, centered on the center point.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridScatter;

const GRID_FILL: f32 = 0.85;

impl ScatterPolicy for GridScatter {
    fn scatter(&self, index: usize, count: usize, center: Point, canvas: Size) -> Point {
        let count = count.max(1);
        let columns = (count as f32).sqrt().ceil().max(1.0) as usize;
        let rows = count.div_ceil(columns);

        let area = canvas.scale(GRID_FILL);
        let cell_w = area.width() / columns as f32;
        let cell_h = area.height() / rows as f32;

        let column = index % columns;
        let row = index / columns;
        let origin = Point::new(
            center.x() - area.width() / 2.0,
            center.y() - area.height() / 2.0,
        );
        origin.add_point(Point::new(
            (column as f32 + 0.5) * cell_w,
            (row as f32 + 0.5) * cell_h,
        ))
    }
}

/// What [`PositionInitializer::initialize`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialPlacement {
    /// Every node already had both coordinates. Nothing changed.
    AlreadyPositioned,
    /// `count` nodes had at least one coordinate filled in.
    Scattered { count: usize },
}

impl InitialPlacement {
    pub fn all_positioned(self) -> bool {
        matches!(self, Self::AlreadyPositioned)
    }
}

/// Fills in missing node coordinates using a [`ScatterPolicy`].
#[derive(Debug)]
pub struct PositionInitializer {
    policy: Box<dyn ScatterPolicy>,
}

impl PositionInitializer {
    pub fn new(policy: impl ScatterPolicy + 'static) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }

    pub fn initialize(
        &self,
        center: Point,
        canvas: Size,
        snapshot: &mut LayoutSnapshot,
    ) -> InitialPlacement {
        if snapshot.all_positioned() {
            return InitialPlacement::AlreadyPositioned;
        }

        let total = snapshot.len();
        let missing: Vec<usize> = (0..total)
            .filter(|&index| snapshot.position(index).is_none())
            .collect();

        let mut count = 0;
        for (slot, &index) in missing.iter().enumerate() {
            let point = self.policy.scatter(slot, missing.len(), center, canvas);
            if snapshot.fill_missing(index, point) {
                count += 1;
            }
        }

        debug!(scattered = count, total; "Assigned initial positions");
        InitialPlacement::Scattered { count }
    }
}

impl Default for PositionInitializer {
    fn default() -> Self {
        Self::new(RandomScatter::new())
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use stagehand_core::geometry::Bounds;

    use super::*;
    use crate::snapshot::NodeRecord;

    fn snapshot(nodes: Vec<NodeRecord>) -> LayoutSnapshot {
        LayoutSnapshot::new(nodes, Vec::new(), Vec::new())
    }

    #[test]
    fn test_all_positioned_is_untouched() {
        let mut s = snapshot(vec![
            NodeRecord::new("a").with_position(Point::new(1.0, 2.0)),
            NodeRecord::new("b").with_position(Point::new(3.0, 4.0)),
        ]);

        let placement = PositionInitializer::default().initialize(
            Point::new(400.0, 300.0),
            Size::new(800.0, 600.0),
            &mut s,
        );

        assert_eq!(placement, InitialPlacement::AlreadyPositioned);
        assert_eq!(s.position(0), Some(Point::new(1.0, 2.0)));
        assert_eq!(s.position(1), Some(Point::new(3.0, 4.0)));
    }

    #[test]
    fn test_partial_only_fills_missing() {
        let mut s = snapshot(vec![
            NodeRecord::new("a").with_position(Point::new(1.0, 2.0)),
            NodeRecord::new("b"),
            NodeRecord::new("c").with_y(Some(7.0)),
        ]);

        let placement = PositionInitializer::new(GridScatter).initialize(
            Point::new(400.0, 300.0),
            Size::new(800.0, 600.0),
            &mut s,
        );

        assert_eq!(placement, InitialPlacement::Scattered { count: 2 });
        assert!(!placement.all_positioned());
        assert_eq!(s.position(0), Some(Point::new(1.0, 2.0)));
        assert!(s.position(1).is_some());
        assert_approx_eq!(f32, s.position(2).map_or(0.0, |p| p.y()), 7.0);
    }

    #[test]
    fn test_grid_single_node_lands_on_center() {
        let point = GridScatter.scatter(0, 1, Point::new(400.0, 300.0), Size::new(800.0, 600.0));
        assert_approx_eq!(f32, point.x(), 400.0);
        assert_approx_eq!(f32, point.y(), 300.0);
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let center = Point::new(0.0, 0.0);
        let canvas = Size::new(100.0, 100.0);
        let a = RandomScatter::seeded(7);
        let b = RandomScatter::seeded(7);
        for i in 0..5 {
            assert_eq!(a.scatter(i, 5, center, canvas), b.scatter(i, 5, center, canvas));
        }
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        fn canvas_strategy() -> impl Strategy<Value = (Point, Size)> {
            (
                -500.0f32..500.0,
                -500.0f32..500.0,
                1.0f32..2000.0,
                1.0f32..2000.0,
            )
                .prop_map(|(x, y, w, h)| (Point::new(x, y), Size::new(w, h)))
        }

        proptest! {
            #[test]
            fn scattered_nodes_stay_in_canvas(
                (center, canvas) in canvas_strategy(),
                count in 1usize..60,
                seed in any::<u64>(),
                grid in any::<bool>(),
            ) {
                let nodes = (0..count).map(|i| NodeRecord::new(format!("n{i}"))).collect();
                let mut s = snapshot(nodes);
                let init = if grid {
                    PositionInitializer::new(GridScatter)
                } else {
                    PositionInitializer::new(RandomScatter::seeded(seed))
                };

                init.initialize(center, canvas, &mut s);

                let bounds = Bounds::new_from_center(center, canvas);
                for index in 0..count {
                    let point = s.position(index);
                    prop_assert!(point.is_some());
                    prop_assert!(bounds.contains(point.unwrap_or_default()));
                }
            }

            #[test]
            fn second_pass_is_a_no_op(
                (center, canvas) in canvas_strategy(),
                count in 1usize..30,
                seed in any::<u64>(),
            ) {
                let nodes = (0..count).map(|i| NodeRecord::new(format!("n{i}"))).collect();
                let mut s = snapshot(nodes);
                let init = PositionInitializer::new(RandomScatter::seeded(seed));

                init.initialize(center, canvas, &mut s);
                let before = s.positions_or_origin();
                let placement = init.initialize(center, canvas, &mut s);

                prop_assert_eq!(placement, InitialPlacement::AlreadyPositioned);
                prop_assert_eq!(s.positions_or_origin(), before);
            }
        }
    }
}
