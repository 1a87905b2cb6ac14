//! Command-line argument definitions for the Stagehand CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the graph to lay out, where positions are
//! written, which configuration file is used and how verbose logging is.

use std::str::FromStr;

use clap::Parser;
use log::LevelFilter;

/// Command-line arguments for the Stagehand layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input graph file (TOML)
    #[arg(help = "Path to the input graph file")]
    pub input: String,

    /// Path to the output positions file (TOML)
    #[arg(short, long, default_value = "positions.toml")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Layout type, overriding the one from the graph file or configuration
    #[arg(short, long)]
    pub layout: Option<String>,

    /// Seed for the initial scatter of unpositioned nodes
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Parsed `--log-level`, or `None` when it names no level.
    pub fn level_filter(&self) -> Option<LevelFilter> {
        LevelFilter::from_str(&self.log_level).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_level() {
        let args = Args::parse_from(["stagehand", "graph.toml", "--log-level", "debug"]);
        assert_eq!(args.input, "graph.toml");
        assert_eq!(args.output, "positions.toml");
        assert_eq!(args.level_filter(), Some(LevelFilter::Debug));
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let args = Args::parse_from(["stagehand", "graph.toml", "--log-level", "loud"]);
        assert_eq!(args.level_filter(), None);
    }

    #[test]
    fn test_layout_and_seed_flags() {
        let args = Args::parse_from(["stagehand", "g.toml", "-l", "grid", "--seed", "9"]);
        assert_eq!(args.layout.as_deref(), Some("grid"));
        assert_eq!(args.seed, Some(9));
    }
}
