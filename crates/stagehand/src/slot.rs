//! Ownership of the one live strategy of a controller.
//!
//! [`StrategySlot`] holds at most one strategy, either running locally or
//! offloaded to a worker. Installing a new occupant always tears down the
//! previous one first, so two strategies never drive the same canvas.

use log::debug;

use crate::{
    config::LayoutConfig,
    error::LayoutError,
    snapshot::LayoutSnapshot,
    strategy::{LayoutStrategy, Progress},
    worker::WorkerHandle,
};

/// A strategy together with its type name and `destroyed` flag.
///
/// Once destroyed, every method is a no-op.
pub struct StrategyInstance {
    kind: String,
    strategy: Box<dyn LayoutStrategy>,
    destroyed: bool,
}

impl StrategyInstance {
    pub fn new(kind: impl Into<String>, strategy: Box<dyn LayoutStrategy>) -> Self {
        Self {
            kind: kind.into(),
            strategy,
            destroyed: false,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn enable_tick(&self) -> bool {
        !self.destroyed && self.strategy.enable_tick()
    }

    pub fn init(&mut self, snapshot: &LayoutSnapshot) {
        if !self.destroyed {
            self.strategy.init(snapshot);
        }
    }

    pub fn update_config(&mut self, patch: &LayoutConfig) -> Result<(), LayoutError> {
        if self.destroyed {
            return Ok(());
        }
        self.strategy.update_config(patch)
    }

    pub fn execute(&mut self, snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
        if self.destroyed {
            return Ok(Progress::Settled);
        }
        self.strategy.execute(snapshot)
    }

    pub fn tick(&mut self, snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
        if self.destroyed {
            return Ok(Progress::Settled);
        }
        self.strategy.tick(snapshot)
    }

    /// Releases the strategy and marks the instance destroyed. Repeated calls
    /// do nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.strategy.destroy();
        self.destroyed = true;
        debug!(kind = self.kind.as_str(); "Destroyed layout strategy");
    }
}

impl std::fmt::Debug for StrategyInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyInstance")
            .field("kind", &self.kind)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

#[derive(Debug)]
enum Occupant {
    Local(StrategyInstance),
    Offloaded(WorkerHandle),
}

/// Holds the controller's single live strategy.
#[derive(Debug, Default)]
pub struct StrategySlot {
    occupant: Option<Occupant>,
}

impl StrategySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroys the current occupant, then stores `instance`.
    pub fn install_local(&mut self, instance: StrategyInstance) {
        self.clear();
        self.occupant = Some(Occupant::Local(instance));
    }

    /// Destroys the current occupant, then stores `handle`.
    pub fn install_offloaded(&mut self, handle: WorkerHandle) {
        self.clear();
        self.occupant = Some(Occupant::Offloaded(handle));
    }

    /// Destroys the current occupant, if any. A local strategy is destroyed
    /// in place; a worker is cancelled and its pending messages dropped.
    ///
    /// Returns true if there was an occupant.
    pub fn clear(&mut self) -> bool {
        match self.occupant.take() {
            Some(Occupant::Local(mut instance)) => {
                instance.destroy();
                true
            }
            Some(Occupant::Offloaded(handle)) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    /// The local strategy, unless it was destroyed.
    pub fn local_mut(&mut self) -> Option<&mut StrategyInstance> {
        match &mut self.occupant {
            Some(Occupant::Local(instance)) if !instance.is_destroyed() => Some(instance),
            _ => None,
        }
    }

    pub fn worker(&self) -> Option<&WorkerHandle> {
        match &self.occupant {
            Some(Occupant::Offloaded(handle)) => Some(handle),
            _ => None,
        }
    }

    /// Type name of the occupant.
    pub fn kind(&self) -> Option<&str> {
        match &self.occupant {
            Some(Occupant::Local(instance)) => Some(instance.kind()),
            Some(Occupant::Offloaded(handle)) => Some(handle.kind()),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    struct Counting {
        destroyed: Arc<AtomicUsize>,
    }

    impl LayoutStrategy for Counting {
        fn update_config(&mut self, _patch: &LayoutConfig) -> Result<(), LayoutError> {
            Ok(())
        }

        fn execute(&mut self, _snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
            Ok(Progress::Settled)
        }

        fn destroy(&mut self) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn instance(counter: &Arc<AtomicUsize>) -> StrategyInstance {
        StrategyInstance::new(
            "counting",
            Box::new(Counting {
                destroyed: Arc::clone(counter),
            }),
        )
    }

    #[test]
    fn test_install_destroys_previous() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut slot = StrategySlot::new();

        slot.install_local(instance(&first));
        slot.install_local(instance(&second));

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
        assert_eq!(slot.kind(), Some("counting"));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut instance = instance(&counter);

        instance.destroy();
        instance.destroy();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(instance.is_destroyed());
        assert_eq!(
            instance.execute(&mut LayoutSnapshot::default()),
            Ok(Progress::Settled)
        );
    }

    #[test]
    fn test_clear_empties_slot() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut slot = StrategySlot::new();
        slot.install_local(instance(&counter));

        assert!(slot.clear());
        assert!(!slot.clear());
        assert!(slot.is_empty());
        assert!(slot.local_mut().is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
