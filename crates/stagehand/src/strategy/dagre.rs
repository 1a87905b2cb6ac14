use std::collections::HashMap;

use log::debug;
use rust_sugiyama::configure::Config;

use stagehand_core::geometry::Point;

use super::{Frame, LayoutStrategy, Progress, recenter};
use crate::{config::LayoutConfig, error::LayoutError, snapshot::LayoutSnapshot};

/// Hierarchical layout: ranks flow top to bottom along edge direction.
///
/// Options: `node_sep` (horizontal spacing, default 50), `rank_sep`
/// (vertical spacing, default 50). Each connected component is laid out on
/// its own and placed to the right of the previous one. Nodes without edges
/// share a row below the hierarchy.
#[derive(Debug)]
pub struct DagreLayout {
    frame: Frame,
    node_sep: f32,
    rank_sep: f32,
}

const COMPONENT_GAP: f64 = 1.0;

impl DagreLayout {
    pub fn new(config: &LayoutConfig) -> Result<Self, LayoutError> {
        let mut layout = Self {
            frame: Frame::from_config(config),
            node_sep: 50.0,
            rank_sep: 50.0,
        };
        layout.update_config(config)?;
        Ok(layout)
    }

    /// Runs the Sugiyama pipeline, returning positions in layer units keyed
    /// by node index.
    fn hierarchy(edges: Vec<(u32, u32)>) -> Result<HashMap<usize, (f64, f64)>, LayoutError> {
        let layouts = std::panic::catch_unwind(move || {
            let config = Config {
                minimum_length: 1,
                vertex_spacing: 1.0,
                ..Default::default()
            };
            rust_sugiyama::from_edges(&edges, &config)
        })
        .map_err(|err| {
            let reason = err
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| err.downcast_ref::<&str>().map(|msg| msg.to_string()))
                .unwrap_or_else(|| "layout engine panicked".to_string());
            LayoutError::strategy("dagre", reason)
        })?;

        let mut positions = HashMap::new();
        let mut offset = 0.0;
        for (coords, width, _height) in layouts {
            for (id, (x, y)) in coords {
                positions.insert(id, (x + offset, y));
            }
            offset += width + COMPONENT_GAP;
        }
        Ok(positions)
    }
}

impl LayoutStrategy for DagreLayout {
    fn update_config(&mut self, patch: &LayoutConfig) -> Result<(), LayoutError> {
        self.frame = self.frame.patched(patch);
        if let Some(sep) = patch.number_option("node_sep")? {
            self.node_sep = sep.abs();
        }
        if let Some(sep) = patch.number_option("rank_sep")? {
            self.rank_sep = sep.abs();
        }
        Ok(())
    }

    fn execute(&mut self, snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
        let edges: Vec<(u32, u32)> = snapshot
            .edges()
            .iter()
            .filter(|edge| !edge.is_loop())
            .map(|edge| (edge.source_index() as u32, edge.target_index() as u32))
            .collect();

        let hierarchy = if edges.is_empty() {
            HashMap::new()
        } else {
            debug!(nodes = snapshot.len(), edges = edges.len(); "Applying Sugiyama layout");
            Self::hierarchy(edges)?
        };

        let bottom = hierarchy
            .values()
            .map(|(_, y)| *y as f32)
            .fold(-1.0f32, f32::max);
        let mut loose = 0;
        for index in 0..snapshot.len() {
            let point = match hierarchy.get(&index) {
                Some(&(x, y)) => Point::new(x as f32 * self.node_sep, y as f32 * self.rank_sep),
                None => {
                    loose += 1;
                    Point::new(
                        (loose - 1) as f32 * self.node_sep,
                        (bottom + 1.0) * self.rank_sep,
                    )
                }
            };
            snapshot.place(index, point);
        }

        recenter(snapshot, self.frame.center);
        Ok(Progress::Settled)
    }
}
