use std::collections::HashMap;

use log::debug;

use stagehand_core::{geometry::Point, identifier::Id, model::ComboTree};

use super::{
    Frame, LayoutStrategy, Progress,
    force::{ForceParams, Simulation},
};
use crate::{config::LayoutConfig, error::LayoutError, snapshot::LayoutSnapshot};

/// Force simulation that also pulls every node toward the centroid of each
/// combo containing it, nested combos included.
///
/// The hierarchy comes from the combo trees attached to the configuration;
/// without them, the combo each node names is used as a flat grouping.
/// Options: every `force` option, plus `combo_gravity` (default 0.2).
#[derive(Debug)]
pub struct ComboForceLayout {
    frame: Frame,
    simulation: Simulation,
    combo_gravity: f32,
    trees: Option<Vec<ComboTree>>,
    groups: Vec<Vec<usize>>,
}

impl ComboForceLayout {
    pub fn new(config: &LayoutConfig) -> Result<Self, LayoutError> {
        let mut params = ForceParams::default();
        params.apply(config)?;
        let frame = Frame::from_config(config);
        let mut layout = Self {
            frame,
            simulation: Simulation::new(params, frame.center),
            combo_gravity: 0.2,
            trees: config.combo_trees().map(<[ComboTree]>::to_vec),
            groups: Vec::new(),
        };
        if let Some(gravity) = config.number_option("combo_gravity")? {
            layout.combo_gravity = gravity;
        }
        Ok(layout)
    }

    /// Node indices of every combo, each including its nested combos.
    fn groups_from_trees(trees: &[ComboTree], snapshot: &LayoutSnapshot) -> Vec<Vec<usize>> {
        fn collect(
            tree: &ComboTree,
            snapshot: &LayoutSnapshot,
            out: &mut Vec<Vec<usize>>,
        ) -> Vec<usize> {
            let mut members: Vec<usize> = tree
                .nodes
                .iter()
                .filter_map(|id| snapshot.index_of(*id))
                .collect();
            for child in &tree.children {
                members.extend(collect(child, snapshot, out));
            }
            out.push(members.clone());
            members
        }

        let mut groups = Vec::new();
        for tree in trees {
            collect(tree, snapshot, &mut groups);
        }
        groups
    }

    fn groups_from_nodes(snapshot: &LayoutSnapshot) -> Vec<Vec<usize>> {
        let mut by_combo: HashMap<Id, Vec<usize>> = HashMap::new();
        for (index, node) in snapshot.nodes().iter().enumerate() {
            if let Some(combo) = node.combo() {
                by_combo.entry(combo).or_default().push(index);
            }
        }
        by_combo.into_values().collect()
    }

    /// Rebuilds the combo groups from the current hierarchy.
    fn regroup(&mut self, snapshot: &LayoutSnapshot) {
        self.groups = match &self.trees {
            Some(trees) => Self::groups_from_trees(trees, snapshot),
            None => Self::groups_from_nodes(snapshot),
        };
        self.groups.retain(|members| members.len() > 1);
        debug!(groups = self.groups.len(); "Prepared combo groups");
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }
}

impl LayoutStrategy for ComboForceLayout {
    fn init(&mut self, snapshot: &LayoutSnapshot) {
        self.simulation.reset(snapshot.len());
        self.regroup(snapshot);
    }

    fn update_config(&mut self, patch: &LayoutConfig) -> Result<(), LayoutError> {
        let mut params = self.simulation.params.clone();
        params.apply(patch)?;
        if let Some(gravity) = patch.number_option("combo_gravity")? {
            self.combo_gravity = gravity;
        }
        if let Some(trees) = patch.combo_trees() {
            self.trees = Some(trees.to_vec());
        }
        self.simulation.params = params;
        self.frame = self.frame.patched(patch);
        self.simulation.center = self.frame.center;
        Ok(())
    }

    fn execute(&mut self, snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
        self.simulation.reset(snapshot.len());
        // Trees patched in after `init` apply to this run.
        self.regroup(snapshot);
        if snapshot.is_empty() {
            return Ok(Progress::Settled);
        }
        Ok(Progress::Running)
    }

    fn tick(&mut self, snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
        let groups = &self.groups;
        let gravity = self.combo_gravity;
        Ok(self.simulation.step(snapshot, |positions, forces| {
            for members in groups {
                let sum = members
                    .iter()
                    .fold(Point::default(), |acc, index| acc.add_point(positions[*index]));
                let centroid = sum.scale(1.0 / members.len() as f32);
                for index in members {
                    let pull = centroid.sub_point(positions[*index]).scale(gravity);
                    forces[*index] = forces[*index].add_point(pull);
                }
            }
        }))
    }

    fn enable_tick(&self) -> bool {
        true
    }

    fn destroy(&mut self) {
        self.simulation.release();
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use stagehand_core::{
        geometry::Size,
        model::{ComboModel, GraphData, NodeModel},
    };

    use super::*;
    use crate::snapshot::NodeRecord;

    fn nodes() -> LayoutSnapshot {
        LayoutSnapshot::new(
            vec![
                NodeRecord::new("a")
                    .with_combo(Some(Id::new("left")))
                    .with_position(Point::new(100.0, 100.0)),
                NodeRecord::new("b")
                    .with_combo(Some(Id::new("left")))
                    .with_position(Point::new(700.0, 500.0)),
                NodeRecord::new("c").with_position(Point::new(400.0, 300.0)),
            ],
            Vec::new(),
            Vec::new(),
        )
    }

    fn config() -> LayoutConfig {
        LayoutConfig::new("comboForce").with_canvas_defaults(Size::new(800.0, 600.0))
    }

    #[test]
    fn test_flat_groups_from_node_combos() {
        let mut layout = ComboForceLayout::new(&config()).expect("valid");
        layout.init(&nodes());
        assert_eq!(layout.groups(), &[vec![0, 1]]);
    }

    #[test]
    fn test_nested_trees_include_descendants() {
        let data = GraphData::new(
            vec![
                NodeModel::new("a").with_combo("inner"),
                NodeModel::new("b").with_combo("outer"),
            ],
            Vec::new(),
        )
        .with_combos(vec![
            ComboModel::new("outer"),
            ComboModel::new("inner").with_parent("outer"),
        ]);
        let mut config = config();
        config.set_combo_trees(ComboTree::build(&data));
        let snapshot = LayoutSnapshot::new(
            vec![NodeRecord::new("a"), NodeRecord::new("b")],
            Vec::new(),
            Vec::new(),
        );

        let mut layout = ComboForceLayout::new(&config).expect("valid");
        layout.init(&snapshot);

        // "inner" alone has one member and is dropped; "outer" holds both.
        assert_eq!(layout.groups().len(), 1);
        let mut outer = layout.groups()[0].clone();
        outer.sort_unstable();
        assert_eq!(outer, vec![0, 1]);
    }

    #[test]
    fn test_patched_trees_replace_groups_on_next_run() {
        let data = GraphData::new(
            vec![
                NodeModel::new("a"),
                NodeModel::new("b").with_combo("right"),
                NodeModel::new("c").with_combo("right"),
            ],
            Vec::new(),
        )
        .with_combos(vec![ComboModel::new("right")]);
        let mut s = nodes();
        let mut layout = ComboForceLayout::new(&config()).expect("valid");
        layout.init(&s);
        assert_eq!(layout.groups(), &[vec![0, 1]]);

        let mut patch = LayoutConfig::default();
        patch.set_combo_trees(ComboTree::build(&data));
        layout.update_config(&patch).expect("valid patch");
        layout.execute(&mut s).expect("starts");

        assert_eq!(layout.groups(), &[vec![1, 2]]);
    }

    #[test]
    fn test_combo_members_draw_together() {
        let mut s = nodes();
        let before = s.position(0).expect("a").sub_point(s.position(1).expect("b")).hypot();
        let mut layout =
            ComboForceLayout::new(&config().with_option("max_iteration", 50)).expect("valid");

        layout.init(&s);
        layout.execute(&mut s).expect("starts");
        while !layout.tick(&mut s).expect("tick").is_settled() {}

        let after = s.position(0).expect("a").sub_point(s.position(1).expect("b")).hypot();
        assert!(after < before, "{after} >= {before}");
    }
}
