use std::{collections::BTreeMap, f32::consts::TAU};

use log::debug;
use petgraph::{algo::dijkstra, graph::UnGraph};

use stagehand_core::identifier::Id;

use super::{Frame, LayoutStrategy, Progress, order_by_degree};
use crate::{config::LayoutConfig, error::LayoutError, snapshot::LayoutSnapshot};

/// Places nodes on concentric rings by graph distance from a focus node.
///
/// Options: `focus_node` (node id, default: the node with the highest
/// degree), `unit_radius` (ring spacing, default: fills the shorter canvas
/// side). Nodes not connected to the focus go on the outermost ring.
#[derive(Debug)]
pub struct RadialLayout {
    frame: Frame,
    focus: Option<Id>,
    unit_radius: Option<f32>,
}

impl RadialLayout {
    pub fn new(config: &LayoutConfig) -> Result<Self, LayoutError> {
        let mut layout = Self {
            frame: Frame::from_config(config),
            focus: None,
            unit_radius: None,
        };
        layout.update_config(config)?;
        Ok(layout)
    }

    fn focus_index(&self, snapshot: &LayoutSnapshot) -> Option<usize> {
        self.focus
            .and_then(|focus| {
                let index = snapshot.index_of(focus);
                if index.is_none() {
                    debug!(focus = focus.to_string(); "Focus node not in graph, using the hub");
                }
                index
            })
            .or_else(|| order_by_degree(snapshot).first().copied())
    }

    /// Ring of every node: its hop distance from the focus node.
    fn rings(snapshot: &LayoutSnapshot, focus: usize) -> Vec<usize> {
        let mut graph = UnGraph::<(), ()>::with_capacity(snapshot.len(), snapshot.edges().len());
        let indices: Vec<_> = (0..snapshot.len()).map(|_| graph.add_node(())).collect();
        for edge in snapshot.edges() {
            graph.add_edge(indices[edge.source_index()], indices[edge.target_index()], ());
        }

        let distances = dijkstra(&graph, indices[focus], None, |_| 1usize);
        let unreachable = distances.values().copied().max().unwrap_or(0) + 1;
        indices
            .iter()
            .map(|index| distances.get(index).copied().unwrap_or(unreachable))
            .collect()
    }
}

impl LayoutStrategy for RadialLayout {
    fn update_config(&mut self, patch: &LayoutConfig) -> Result<(), LayoutError> {
        self.frame = self.frame.patched(patch);
        if let Some(focus) = patch.text_option("focus_node")? {
            self.focus = Some(Id::new(focus));
        }
        if let Some(radius) = patch.number_option("unit_radius")? {
            self.unit_radius = Some(radius.abs());
        }
        Ok(())
    }

    fn execute(&mut self, snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
        let Some(focus) = self.focus_index(snapshot) else {
            return Ok(Progress::Settled);
        };
        let rings = Self::rings(snapshot, focus);

        let mut by_ring: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (index, ring) in rings.iter().enumerate() {
            by_ring.entry(*ring).or_default().push(index);
        }
        let outermost = by_ring.keys().next_back().copied().unwrap_or(0).max(1);
        let unit = self
            .unit_radius
            .unwrap_or(self.frame.min_side() / 2.0 / outermost as f32);

        for (ring, members) in by_ring {
            let step = TAU / members.len() as f32;
            for (slot, index) in members.into_iter().enumerate() {
                let point = if ring == 0 {
                    self.frame.center
                } else {
                    self.frame
                        .center
                        .polar_offset(unit * ring as f32, step * slot as f32)
                };
                snapshot.place(index, point);
            }
        }
        Ok(Progress::Settled)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use stagehand_core::geometry::{Point, Size};

    use super::*;
    use crate::snapshot::NodeRecord;

    fn chain() -> LayoutSnapshot {
        LayoutSnapshot::new(
            ["a", "b", "c", "lonely"].into_iter().map(NodeRecord::new).collect(),
            vec![
                (None, Id::new("a"), Id::new("b")),
                (None, Id::new("b"), Id::new("c")),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_rings_follow_hop_distance() {
        let config = LayoutConfig::new("radial")
            .with_option("focus_node", "a")
            .with_option("unit_radius", 50)
            .with_canvas_defaults(Size::new(400.0, 400.0));
        let mut s = chain();

        RadialLayout::new(&config).expect("valid").execute(&mut s).expect("runs");

        let center = Point::new(200.0, 200.0);
        let distance = |index: usize| s.position(index).expect("placed").sub_point(center).hypot();
        assert_approx_eq!(f32, distance(0), 0.0);
        assert_approx_eq!(f32, distance(1), 50.0, epsilon = 0.01);
        assert_approx_eq!(f32, distance(2), 100.0, epsilon = 0.01);
        assert_approx_eq!(f32, distance(3), 150.0, epsilon = 0.01);
    }

    #[test]
    fn test_defaults_to_hub_focus() {
        let config = LayoutConfig::new("radial").with_canvas_defaults(Size::new(400.0, 400.0));
        let mut s = chain();

        RadialLayout::new(&config).expect("valid").execute(&mut s).expect("runs");

        assert_eq!(s.position(1), Some(Point::new(200.0, 200.0)));
    }

    #[test]
    fn test_unknown_focus_falls_back() {
        let config = LayoutConfig::new("radial")
            .with_option("focus_node", "missing")
            .with_canvas_defaults(Size::new(400.0, 400.0));
        let mut s = chain();

        RadialLayout::new(&config).expect("valid").execute(&mut s).expect("runs");

        assert!(s.all_positioned());
    }
}
