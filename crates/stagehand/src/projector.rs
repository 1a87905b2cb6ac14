//! Projection of the host's graph into a [`LayoutSnapshot`].

use log::trace;

use stagehand_core::model::GraphData;

use crate::snapshot::{ComboRecord, LayoutSnapshot, NodeRecord};

/// Builds a layout-ready snapshot from the host's graph.
///
/// Hidden nodes are left out. An edge survives only when it is visible and
/// both of its endpoints survive. Render-only fields such as labels are
/// stripped. Identities are preserved so positions written by a strategy can
/// be matched back to the host's nodes. `data` is never modified.
pub fn project(data: &GraphData) -> LayoutSnapshot {
    let nodes: Vec<NodeRecord> = data
        .nodes
        .iter()
        .filter(|node| node.visible)
        .map(|node| {
            NodeRecord::new(node.id)
                .with_x(node.x)
                .with_y(node.y)
                .with_size(node.size)
                .with_combo(node.combo)
                .with_data(node.data.clone())
        })
        .collect();

    let edges = data
        .edges
        .iter()
        .filter(|edge| edge.visible)
        .map(|edge| (edge.id, edge.source, edge.target));

    let combos = data
        .combos
        .iter()
        .map(|combo| ComboRecord {
            id: combo.id,
            parent: combo.parent,
        })
        .collect();

    let snapshot = LayoutSnapshot::new(nodes, edges, combos);
    trace!(
        nodes = snapshot.len(),
        edges = snapshot.edges().len(),
        hidden = data.nodes.len() - snapshot.len();
        "Projected graph"
    );
    snapshot
}
