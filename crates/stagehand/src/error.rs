//! Error types for layout runs.
//!
//! [`LayoutError`] describes everything that can go wrong while preparing or
//! running a layout. None of it escapes the controller's public operations:
//! the controller logs the error and degrades to an unlaid-out but still
//! renderable graph.

use thiserror::Error;

/// Failure raised by the registry, a strategy or the worker substrate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// No factory is registered under the requested strategy type.
    #[error("The layout method: '{0}' does not exist! Please specify it first.")]
    UnknownStrategy(String),

    /// A strategy-specific option is present but unusable.
    #[error("Invalid option `{key}` for layout '{strategy}': {reason}")]
    InvalidOption {
        strategy: String,
        key: String,
        reason: String,
    },

    /// The projected snapshot has no nodes.
    #[error("Graph has no nodes to lay out")]
    EmptyGraph,

    /// A worker result arrived for a run that is no longer current.
    #[error("Discarded result of stale layout run {generation}")]
    StaleResult { generation: u64 },

    /// A strategy failed while computing positions.
    #[error("Layout '{strategy}' failed: {reason}")]
    Strategy { strategy: String, reason: String },

    /// The worker thread could not be started or went away.
    #[error("Layout worker error: {0}")]
    Worker(String),
}

impl LayoutError {
    /// Create an [`LayoutError::InvalidOption`] error.
    pub fn invalid_option(
        strategy: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOption {
            strategy: strategy.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a [`LayoutError::Strategy`] error.
    pub fn strategy(strategy: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Strategy {
            strategy: strategy.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for errors caused by the layout configuration rather than
    /// by the data or the execution substrate.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnknownStrategy(_) | Self::InvalidOption { .. })
    }
}
