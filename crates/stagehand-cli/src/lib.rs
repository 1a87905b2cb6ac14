//! CLI logic for the Stagehand layout tool.
//!
//! Loads a graph description, drives a [`LayoutController`] against a
//! [`HeadlessHost`] until the run settles and writes the resulting node
//! positions.

pub mod error_adapter;

mod args;
mod config;
mod error;
mod graph_file;
mod host;
mod output;

pub use args::Args;
pub use config::{AppConfig, CanvasConfig, ConfigError, ScatterConfig, ScatterMode, load_config};
pub use error::CliError;
pub use graph_file::GraphFile;
pub use host::HeadlessHost;
pub use output::PositionsFile;

use std::{fs, rc::Rc};

use log::{debug, info};

use stagehand::{
    LayoutConfig, LayoutController, RenderBridge, TickStatus,
    callback::ReadyCallback,
    position::{GridScatter, RandomScatter},
    strategy::StrategyRegistry,
};

/// Run the Stagehand CLI application
///
/// Reads the input graph, lays it out and writes node positions to the
/// output file.
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Graph file errors
/// - Unknown layout types
/// - Runs that do not settle within the configured tick budget
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Laying out graph"
    );

    let app_config = load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let graph_file = GraphFile::parse(&source)?;

    let layout = resolve_layout(&app_config, &graph_file, args.layout.as_deref());
    let registry = StrategyRegistry::with_builtins();
    if let Some(name) = layout.as_ref().and_then(LayoutConfig::kind) {
        if !registry.contains(name) {
            return Err(CliError::UnknownLayout {
                name: name.to_string(),
                known: registry.names().map(str::to_string).collect(),
            });
        }
    }

    let canvas = graph_file
        .canvas()
        .unwrap_or_else(|| app_config.canvas().size());
    let host = Rc::new(
        HeadlessHost::new(graph_file.into_graph(), canvas).with_layout_config(layout),
    );

    let controller = LayoutController::new(&host).with_registry(registry);
    let seed = args.seed.or(app_config.scatter().seed());
    let mut controller = match app_config.scatter().mode() {
        ScatterMode::Random => controller.with_scatter(match seed {
            Some(seed) => RandomScatter::seeded(seed),
            None => RandomScatter::new(),
        }),
        ScatterMode::Grid => controller.with_scatter(GridScatter),
    };

    let on_ready = app_config.fit_view().then(|| {
        let host = Rc::clone(&host);
        Box::new(move || host.fit_view()) as ReadyCallback
    });

    controller.layout(on_ready);
    let max_ticks = app_config.max_ticks();
    let status = controller.run_to_completion(max_ticks);
    debug!(status:?, state:? = controller.state(); "Controller stopped ticking");
    if status == TickStatus::Running {
        return Err(CliError::Unsettled { max_ticks });
    }

    let positions = PositionsFile::from_host(&host, controller.layout_type());
    controller.destroy();

    fs::write(&args.output, positions.to_toml()?)?;

    info!(
        output_file = args.output,
        nodes = positions.len();
        "Positions written"
    );

    Ok(())
}

/// Picks the layout for this run.
///
/// The graph file's own layout wins over the application configuration. An
/// explicit `override_kind` replaces the type of whichever layout wins, or
/// stands alone when neither declares one.
fn resolve_layout(
    app_config: &AppConfig,
    graph_file: &GraphFile,
    override_kind: Option<&str>,
) -> Option<LayoutConfig> {
    let declared = graph_file
        .layout()
        .or_else(|| app_config.layout())
        .cloned();
    match (declared, override_kind) {
        (Some(config), Some(kind)) => Some(config.with_kind(kind)),
        (None, Some(kind)) => Some(LayoutConfig::new(kind)),
        (declared, None) => declared,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_config(src: &str) -> AppConfig {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn test_graph_layout_wins_over_config() {
        let config = app_config("[layout]\ntype = \"grid\"\n");
        let graph = GraphFile::parse("[layout]\ntype = \"circular\"\n").unwrap();

        let layout = resolve_layout(&config, &graph, None).unwrap();
        assert_eq!(layout.kind(), Some("circular"));
    }

    #[test]
    fn test_config_layout_used_when_graph_is_silent() {
        let config = app_config("[layout]\ntype = \"grid\"\ncols = 3\n");
        let graph = GraphFile::parse("").unwrap();

        let layout = resolve_layout(&config, &graph, None).unwrap();
        assert_eq!(layout.kind(), Some("grid"));
        assert_eq!(layout.number_option("cols").unwrap(), Some(3.0));
    }

    #[test]
    fn test_override_keeps_declared_options() {
        let config = AppConfig::default();
        let graph = GraphFile::parse("[layout]\ntype = \"grid\"\nseed = 4\n").unwrap();

        let layout = resolve_layout(&config, &graph, Some("random")).unwrap();
        assert_eq!(layout.kind(), Some("random"));
        assert_eq!(layout.number_option("seed").unwrap(), Some(4.0));
    }

    #[test]
    fn test_no_layout_anywhere() {
        let graph = GraphFile::parse("").unwrap();
        assert!(resolve_layout(&AppConfig::default(), &graph, None).is_none());

        let forced = resolve_layout(&AppConfig::default(), &graph, Some("force")).unwrap();
        assert_eq!(forced.kind(), Some("force"));
    }
}
