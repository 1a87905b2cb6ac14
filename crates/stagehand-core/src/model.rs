//! Host-side graph model.
//!
//! These are the records a host keeps for rendering: besides identity,
//! position and structure they carry visual state (`visible`, `label`,
//! `collapsed`) that a layout run must not see or alter. The controller reads
//! a [`GraphData`] from its host on every run and projects it into a
//! layout-only snapshot.
//!
//! All records deserialize from self-describing formats, which is how headless
//! hosts load graphs.
//!
//! ```
//! # use stagehand_core::model::{EdgeModel, GraphData, NodeModel};
//! let data = GraphData::new(
//!     vec![NodeModel::new("a"), NodeModel::new("b").hidden()],
//!     vec![EdgeModel::new("a", "b")],
//! );
//! assert_eq!(data.nodes.len(), 2);
//! assert!(data.node("a".into()).is_some());
//! ```

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    geometry::{Point, Size},
    identifier::Id,
    value::OptionValue,
};

fn visible_by_default() -> bool {
    true
}

/// A node as the host stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeModel {
    pub id: Id,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub combo: Option<Id>,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default)]
    pub label: Option<String>,
    /// Arbitrary fields a strategy may read (`degree`, `cluster`, ...).
    #[serde(default)]
    pub data: IndexMap<String, OptionValue>,
}

impl NodeModel {
    /// A visible node with no position and no data.
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            x: None,
            y: None,
            size: None,
            combo: None,
            visible: true,
            label: None,
            data: IndexMap::new(),
        }
    }

    pub fn with_position(mut self, point: Point) -> Self {
        self.x = Some(point.x());
        self.y = Some(point.y());
        self
    }

    pub fn with_combo(mut self, combo: impl Into<Id>) -> Self {
        self.combo = Some(combo.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Both coordinates, when the node has them.
    pub fn position(&self) -> Option<Point> {
        Some(Point::new(self.x?, self.y?))
    }
}

/// A directed edge as the host stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeModel {
    #[serde(default)]
    pub id: Option<Id>,
    pub source: Id,
    pub target: Id,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

impl EdgeModel {
    pub fn new(source: impl Into<Id>, target: impl Into<Id>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            visible: true,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A combo (compound node) as the host stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboModel {
    pub id: Id,
    #[serde(default)]
    pub parent: Option<Id>,
    #[serde(default)]
    pub collapsed: bool,
}

impl ComboModel {
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            collapsed: false,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<Id>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// The full graph a host renders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<NodeModel>,
    #[serde(default)]
    pub edges: Vec<EdgeModel>,
    #[serde(default)]
    pub combos: Vec<ComboModel>,
}

impl GraphData {
    pub fn new(nodes: Vec<NodeModel>, edges: Vec<EdgeModel>) -> Self {
        Self {
            nodes,
            edges,
            combos: Vec::new(),
        }
    }

    pub fn with_combos(mut self, combos: Vec<ComboModel>) -> Self {
        self.combos = combos;
        self
    }

    pub fn node(&self, id: Id) -> Option<&NodeModel> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: Id) -> Option<&mut NodeModel> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }
}

/// One level of the combo hierarchy with the nodes directly inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboTree {
    pub id: Id,
    #[serde(default)]
    pub nodes: Vec<Id>,
    #[serde(default)]
    pub children: Vec<ComboTree>,
}

impl ComboTree {
    /// Builds the combo forest of `data`.
    ///
    /// Roots are combos without a parent, or whose parent is unknown. Combos
    /// that form a parent cycle are unreachable from any root and are dropped
    /// with a warning.
    pub fn build(data: &GraphData) -> Vec<ComboTree> {
        let known: HashSet<Id> = data.combos.iter().map(|combo| combo.id).collect();

        let mut children: HashMap<Id, Vec<Id>> = HashMap::new();
        let mut roots = Vec::new();
        for combo in &data.combos {
            match combo.parent.filter(|parent| known.contains(parent)) {
                Some(parent) => children.entry(parent).or_default().push(combo.id),
                None => roots.push(combo.id),
            }
        }

        let mut members: HashMap<Id, Vec<Id>> = HashMap::new();
        for node in &data.nodes {
            if let Some(combo) = node.combo.filter(|combo| known.contains(combo)) {
                members.entry(combo).or_default().push(node.id);
            }
        }

        let mut visited = HashSet::new();
        let forest: Vec<ComboTree> = roots
            .into_iter()
            .map(|root| Self::assemble(root, &children, &members, &mut visited))
            .collect();

        if visited.len() < known.len() {
            warn!(
                dropped = known.len() - visited.len();
                "Combo hierarchy contains a parent cycle"
            );
        }
        forest
    }

    fn assemble(
        id: Id,
        children: &HashMap<Id, Vec<Id>>,
        members: &HashMap<Id, Vec<Id>>,
        visited: &mut HashSet<Id>,
    ) -> ComboTree {
        visited.insert(id);
        let nested = children
            .get(&id)
            .into_iter()
            .flatten()
            .filter(|child| !visited.contains(*child))
            .copied()
            .collect::<Vec<_>>()
            .into_iter()
            .map(|child| Self::assemble(child, children, members, visited))
            .collect();
        ComboTree {
            id,
            nodes: members.get(&id).cloned().unwrap_or_default(),
            children: nested,
        }
    }

    /// Visits this tree depth-first, calling `f` with each combo and its depth.
    pub fn walk<'a>(&'a self, depth: usize, f: &mut impl FnMut(&'a ComboTree, usize)) {
        f(self, depth);
        for child in &self.children {
            child.walk(depth + 1, f);
        }
    }
}
