//! The contract every layout algorithm satisfies, and the registry that maps
//! type names to algorithms.
//!
//! Strategies are constructed from the effective [`LayoutConfig`] of a run,
//! which always carries `width`, `height` and `center`. A strategy computes
//! coordinates by writing to the [`LayoutSnapshot`] it is handed; it never
//! touches the host.

mod circular;
mod combo_force;
mod dagre;
mod force;
mod grid;
mod radial;
mod random;

use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use stagehand_core::geometry::{Point, Size};

use crate::{config::LayoutConfig, error::LayoutError, snapshot::LayoutSnapshot};

pub use circular::CircularLayout;
pub use combo_force::ComboForceLayout;
pub use dagre::DagreLayout;
pub use force::{ForceLayout, ForceParams};
pub use grid::GridLayout;
pub use radial::RadialLayout;
pub use random::RandomLayout;

/// Where a strategy stands after `execute` or `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Final positions are in the snapshot.
    Settled,
    /// More ticks are needed.
    Running,
}

impl Progress {
    pub fn is_settled(self) -> bool {
        self == Self::Settled
    }
}

/// A pluggable layout algorithm.
///
/// The controller calls `init` with a fresh snapshot before every execution,
/// then `execute`. Iterative strategies return [`Progress::Running`] from
/// `execute` and are driven one `tick` at a time until they settle.
/// `destroy` releases whatever the strategy holds; nothing is called on a
/// strategy after it.
pub trait LayoutStrategy: Send {
    /// Seeds the strategy with the data of a run.
    fn init(&mut self, _snapshot: &LayoutSnapshot) {}

    /// Applies a partial configuration. Only keys present in `patch` change.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidOption`] if a patched key is unusable.
    fn update_config(&mut self, patch: &LayoutConfig) -> Result<(), LayoutError>;

    /// Computes positions, or starts iterating.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Strategy`] if the algorithm fails.
    fn execute(&mut self, snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError>;

    /// Advances an iterative run by one step.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Strategy`] if the algorithm fails.
    fn tick(&mut self, _snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
        Ok(Progress::Settled)
    }

    /// Returns true if the strategy settles over several ticks.
    fn enable_tick(&self) -> bool {
        false
    }

    /// Releases the strategy's resources.
    fn destroy(&mut self) {}
}

/// Builds a strategy from the effective configuration of a run.
pub type StrategyFactory =
    Arc<dyn Fn(&LayoutConfig) -> Result<Box<dyn LayoutStrategy>, LayoutError> + Send + Sync>;

/// Maps strategy type names to factories.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    factories: IndexMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    /// A registry with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in strategy registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("random", |config| Ok(Box::new(RandomLayout::new(config)?)));
        registry.register("grid", |config| Ok(Box::new(GridLayout::new(config)?)));
        registry.register("circular", |config| {
            Ok(Box::new(CircularLayout::new(config)?))
        });
        registry.register("radial", |config| Ok(Box::new(RadialLayout::new(config)?)));
        registry.register("dagre", |config| Ok(Box::new(DagreLayout::new(config)?)));
        for name in FORCE_FAMILY {
            registry.register(name, |config| Ok(Box::new(ForceLayout::new(config)?)));
        }
        registry.register(COMBO_FORCE, |config| {
            Ok(Box::new(ComboForceLayout::new(config)?))
        });
        registry
    }

    /// Registers `factory` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&LayoutConfig) -> Result<Box<dyn LayoutStrategy>, LayoutError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Builds the strategy registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownStrategy`] if nothing is registered under
    /// `name`, or whatever the factory returns.
    pub fn create(
        &self,
        name: &str,
        config: &LayoutConfig,
    ) -> Result<Box<dyn LayoutStrategy>, LayoutError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| LayoutError::UnknownStrategy(name.to_string()))?;
        factory(config)
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

const FORCE_FAMILY: [&str; 3] = ["force", "g6force", "gForce"];

/// Type name of the combo-aware force strategy.
pub const COMBO_FORCE: &str = "comboForce";

/// Returns true for the type names of the iterative force simulation.
pub fn is_force_family(kind: &str) -> bool {
    FORCE_FAMILY.contains(&kind)
}

/// Center and extent a strategy lays out into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Frame {
    pub center: Point,
    pub size: Size,
}

impl Frame {
    pub fn from_config(config: &LayoutConfig) -> Self {
        let size = config.size().unwrap_or_default();
        Self {
            center: config.center().unwrap_or_else(|| size.center()),
            size,
        }
    }

    /// Returns a copy with the fields `patch` sets.
    pub fn patched(self, patch: &LayoutConfig) -> Self {
        Self {
            center: patch.center().unwrap_or(self.center),
            size: Size::new(
                patch.width().unwrap_or(self.size.width()),
                patch.height().unwrap_or(self.size.height()),
            ),
        }
    }

    /// Top-left corner.
    pub fn origin(self) -> Point {
        Point::new(
            self.center.x() - self.size.width() / 2.0,
            self.center.y() - self.size.height() / 2.0,
        )
    }

    pub fn min_side(self) -> f32 {
        self.size.width().min(self.size.height())
    }
}

/// Indices of the snapshot's nodes, highest degree first. Ties keep snapshot
/// order.
pub(crate) fn order_by_degree(snapshot: &LayoutSnapshot) -> Vec<usize> {
    let degrees = snapshot.degrees();
    let mut order: Vec<usize> = (0..snapshot.len()).collect();
    order.sort_by(|a, b| degrees[*b].cmp(&degrees[*a]));
    order
}

/// Shifts every position so the bounding box of the snapshot is centered on
/// `center`.
pub(crate) fn recenter(snapshot: &mut LayoutSnapshot, center: Point) {
    let points: Vec<Point> = snapshot.positions_or_origin();
    let Some(bounds) = stagehand_core::geometry::Bounds::enclosing(points.iter().copied()) else {
        return;
    };
    let offset = center.sub_point(bounds.center());
    for (index, point) in points.into_iter().enumerate() {
        snapshot.place(index, point.add_point(offset));
    }
}
