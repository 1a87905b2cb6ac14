//! Graph description files.
//!
//! A graph file is TOML with `[[nodes]]`, `[[edges]]` and `[[combos]]` arrays
//! in the shape of [`GraphData`], plus optional `[layout]` and `[canvas]`
//! tables that take precedence over the application configuration.
//!
//! ```toml
//! [layout]
//! type = "circular"
//!
//! [[nodes]]
//! id = "a"
//!
//! [[nodes]]
//! id = "b"
//! x = 120
//! y = 40
//!
//! [[edges]]
//! source = "a"
//! target = "b"
//! ```

use std::collections::HashSet;

use log::{debug, warn};
use serde::Deserialize;

use stagehand::{
    LayoutConfig,
    geometry::Size,
    model::{ComboModel, EdgeModel, GraphData, NodeModel},
};

use crate::{config::CanvasConfig, error::CliError};

#[derive(Debug, Default, Deserialize)]
pub struct GraphFile {
    #[serde(default)]
    layout: Option<LayoutConfig>,

    #[serde(default)]
    canvas: Option<CanvasConfig>,

    #[serde(default)]
    nodes: Vec<NodeModel>,

    #[serde(default)]
    edges: Vec<EdgeModel>,

    #[serde(default)]
    combos: Vec<ComboModel>,
}

impl GraphFile {
    /// Parses and checks a graph file.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::GraphParse`] if the source is not valid TOML, does
    /// not match the graph shape, declares a degenerate canvas or repeats a
    /// node id.
    pub fn parse(src: &str) -> Result<Self, CliError> {
        let file: GraphFile = toml::from_str(src)
            .map_err(|err| CliError::new_graph_error(err.message(), src, err.span()))?;

        if let Some(canvas) = &file.canvas {
            canvas
                .validate()
                .map_err(|err| CliError::new_graph_error(err.to_string(), src, None))?;
        }

        let mut seen = HashSet::new();
        for node in &file.nodes {
            if !seen.insert(node.id) {
                return Err(CliError::new_graph_error(
                    format!("duplicate node id `{}`", node.id),
                    src,
                    None,
                ));
            }
        }

        for edge in &file.edges {
            if !seen.contains(&edge.source) || !seen.contains(&edge.target) {
                warn!(
                    source = edge.source.to_string(),
                    target = edge.target.to_string();
                    "Edge references an unknown node and will be ignored"
                );
            }
        }

        debug!(
            nodes = file.nodes.len(),
            edges = file.edges.len(),
            combos = file.combos.len();
            "Graph file parsed"
        );
        Ok(file)
    }

    /// Layout declared by the file itself.
    pub fn layout(&self) -> Option<&LayoutConfig> {
        self.layout.as_ref()
    }

    pub fn canvas(&self) -> Option<Size> {
        self.canvas.map(|canvas| canvas.size())
    }

    pub fn into_graph(self) -> GraphData {
        GraphData::new(self.nodes, self.edges).with_combos(self.combos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_graph_with_layout() {
        let file = GraphFile::parse(
            r#"
            [layout]
            type = "grid"
            cols = 2

            [canvas]
            width = 400
            height = 300

            [[nodes]]
            id = "a"

            [[nodes]]
            id = "b"
            combo = "group"

            [[edges]]
            source = "a"
            target = "b"

            [[combos]]
            id = "group"
            "#,
        )
        .unwrap();

        assert_eq!(file.layout().and_then(LayoutConfig::kind), Some("grid"));
        assert_eq!(file.canvas(), Some(Size::new(400.0, 300.0)));

        let graph = file.into_graph();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.combos.len(), 1);
        assert_eq!(graph.nodes[1].combo, Some("group".into()));
    }

    #[test]
    fn test_empty_file_is_an_empty_graph() {
        let file = GraphFile::parse("").unwrap();
        assert!(file.layout().is_none());
        assert!(file.into_graph().nodes.is_empty());
    }

    #[test]
    fn test_syntax_error_carries_span() {
        let src = "[[nodes]]\nid = \n";
        let err = GraphFile::parse(src).unwrap_err();

        match err {
            CliError::GraphParse {
                src: kept, span, ..
            } => {
                assert_eq!(kept, src);
                let span = span.expect("toml reports a location");
                assert!(span.start <= src.len());
            }
            other => panic!("Expected GraphParse, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_node_is_rejected() {
        let err = GraphFile::parse("[[nodes]]\nid = \"a\"\n[[nodes]]\nid = \"a\"\n").unwrap_err();
        assert!(err.to_string().contains("duplicate node id `a`"));
    }

    #[test]
    fn test_degenerate_canvas_is_rejected() {
        let err = GraphFile::parse("[canvas]\nwidth = -1\nheight = 10\n").unwrap_err();
        assert!(matches!(err, CliError::GraphParse { .. }));
    }

    #[test]
    fn test_dangling_edge_is_kept_for_projection() {
        let file =
            GraphFile::parse("[[nodes]]\nid = \"a\"\n[[edges]]\nsource = \"a\"\ntarget = \"z\"\n")
                .unwrap();
        assert_eq!(file.into_graph().edges.len(), 1);
    }
}
