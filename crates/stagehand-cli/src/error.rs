//! Error types for the Stagehand CLI.

use std::{io, ops::Range};

use thiserror::Error;

use crate::config::ConfigError;

/// Everything that can stop a CLI run.
///
/// `GraphParse` keeps the graph source and the offending byte range so the
/// error adapter can render a snippet.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid graph file: {message}")]
    GraphParse {
        message: String,
        src: String,
        span: Option<Range<usize>>,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown layout type `{name}`")]
    UnknownLayout { name: String, known: Vec<String> },

    #[error("Layout did not settle within {max_ticks} ticks")]
    Unsettled { max_ticks: usize },

    #[error("Failed to serialize positions: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl CliError {
    /// Create a new `GraphParse` error with the associated source.
    pub fn new_graph_error(
        message: impl Into<String>,
        src: impl Into<String>,
        span: Option<Range<usize>>,
    ) -> Self {
        Self::GraphParse {
            message: message.into(),
            src: src.into(),
            span,
        }
    }
}
