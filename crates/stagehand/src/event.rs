//! Lifecycle events announced to the host.

use std::fmt;

/// Milestones of a layout run, in the order a run emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutEvent {
    /// A run is about to start; positions are about to change.
    BeforeLayout,
    /// A configured strategy is about to execute.
    BeginLayout,
    /// The strategy reported completion. Positions on the canvas are still
    /// stale until the following refresh.
    AfterLayout,
}

impl LayoutEvent {
    /// The event name hosts subscribe to.
    pub fn name(self) -> &'static str {
        match self {
            Self::BeforeLayout => "beforelayout",
            Self::BeginLayout => "beginlayout",
            Self::AfterLayout => "afterlayout",
        }
    }
}

impl fmt::Display for LayoutEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
