//! Layout-ready snapshot of a graph.
//!
//! A [`LayoutSnapshot`] is what a strategy sees: node identities, optional
//! coordinates, sizes, combo membership and data fields, plus edges with their
//! endpoints resolved to node indices. The structure is fixed once the
//! snapshot is built. Coordinates are the one mutable part, and are written
//! only through [`LayoutSnapshot::place`] and friends.

use std::collections::HashMap;

use indexmap::IndexMap;

use stagehand_core::{
    geometry::{Point, Size},
    identifier::Id,
    value::OptionValue,
};

/// A node as a strategy sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    id: Id,
    x: Option<f32>,
    y: Option<f32>,
    size: Option<Size>,
    combo: Option<Id>,
    data: IndexMap<String, OptionValue>,
}

impl NodeRecord {
    /// A node with no coordinates, size, combo or data.
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            x: None,
            y: None,
            size: None,
            combo: None,
            data: IndexMap::new(),
        }
    }

    pub fn with_x(mut self, x: Option<f32>) -> Self {
        self.x = x.filter(|x| x.is_finite());
        self
    }

    pub fn with_y(mut self, y: Option<f32>) -> Self {
        self.y = y.filter(|y| y.is_finite());
        self
    }

    pub fn with_position(self, point: Point) -> Self {
        self.with_x(Some(point.x())).with_y(Some(point.y()))
    }

    pub fn with_size(mut self, size: Option<Size>) -> Self {
        self.size = size;
        self
    }

    pub fn with_combo(mut self, combo: Option<Id>) -> Self {
        self.combo = combo;
        self
    }

    pub fn with_data(mut self, data: IndexMap<String, OptionValue>) -> Self {
        self.data = data;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn x(&self) -> Option<f32> {
        self.x
    }

    pub fn y(&self) -> Option<f32> {
        self.y
    }

    /// Both coordinates, when the node has them.
    pub fn position(&self) -> Option<Point> {
        Some(Point::new(self.x?, self.y?))
    }

    pub fn size(&self) -> Option<Size> {
        self.size
    }

    pub fn combo(&self) -> Option<Id> {
        self.combo
    }

    pub fn data(&self) -> &IndexMap<String, OptionValue> {
        &self.data
    }

    pub fn field(&self, key: &str) -> Option<&OptionValue> {
        self.data.get(key)
    }
}

/// An edge between two projected nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    id: Option<Id>,
    source: Id,
    target: Id,
    source_index: usize,
    target_index: usize,
}

impl EdgeRecord {
    pub fn id(&self) -> Option<Id> {
        self.id
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    /// Index of the source node in [`LayoutSnapshot::nodes`].
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// Index of the target node in [`LayoutSnapshot::nodes`].
    pub fn target_index(&self) -> usize {
        self.target_index
    }

    pub fn is_loop(&self) -> bool {
        self.source_index == self.target_index
    }
}

/// A combo with its parent, if nested.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboRecord {
    pub id: Id,
    pub parent: Option<Id>,
}

/// Nodes, edges and combos handed to a strategy for one run.
#[derive(Debug, Clone, Default)]
pub struct LayoutSnapshot {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    combos: Vec<ComboRecord>,
    index: HashMap<Id, usize>,
}

impl LayoutSnapshot {
    /// Builds a snapshot, resolving edge endpoints against `nodes`.
    ///
    /// Edges whose source or target is not among `nodes` are dropped. When
    /// two nodes share an id the first one wins lookups.
    pub fn new(
        nodes: Vec<NodeRecord>,
        edges: impl IntoIterator<Item = (Option<Id>, Id, Id)>,
        combos: Vec<ComboRecord>,
    ) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            index.entry(node.id).or_insert(i);
        }

        let edges = edges
            .into_iter()
            .filter_map(|(id, source, target)| {
                Some(EdgeRecord {
                    id,
                    source,
                    target,
                    source_index: *index.get(&source)?,
                    target_index: *index.get(&target)?,
                })
            })
            .collect();

        Self {
            nodes,
            edges,
            combos,
            index,
        }
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn combos(&self) -> &[ComboRecord] {
        &self.combos
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: Id) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn node(&self, id: Id) -> Option<&NodeRecord> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// Coordinates of the node at `index`, when it has both.
    pub fn position(&self, index: usize) -> Option<Point> {
        self.nodes.get(index).and_then(NodeRecord::position)
    }

    /// Coordinates of every node, with the origin for nodes that lack them.
    pub fn positions_or_origin(&self) -> Vec<Point> {
        self.nodes
            .iter()
            .map(|node| node.position().unwrap_or_default())
            .collect()
    }

    /// Returns true when every node has both coordinates.
    pub fn all_positioned(&self) -> bool {
        self.nodes.iter().all(|node| node.position().is_some())
    }

    /// Sets both coordinates of the node at `index`.
    ///
    /// Out-of-range indices and non-finite points are ignored.
    pub fn place(&mut self, index: usize, point: Point) {
        if !point.is_finite() {
            return;
        }
        if let Some(node) = self.nodes.get_mut(index) {
            node.x = Some(point.x());
            node.y = Some(point.y());
        }
    }

    /// Sets only the coordinates the node at `index` is missing.
    ///
    /// Returns true if anything was written.
    pub fn fill_missing(&mut self, index: usize, point: Point) -> bool {
        let Some(node) = self.nodes.get_mut(index) else {
            return false;
        };
        let mut changed = false;
        if node.x.is_none() && point.x().is_finite() {
            node.x = Some(point.x());
            changed = true;
        }
        if node.y.is_none() && point.y().is_finite() {
            node.y = Some(point.y());
            changed = true;
        }
        changed
    }

    /// Writes a full set of positions, one per node in order.
    ///
    /// Returns false, leaving the snapshot untouched, if the count does not
    /// match the number of nodes.
    pub fn apply_positions(&mut self, positions: &[Point]) -> bool {
        if positions.len() != self.nodes.len() {
            return false;
        }
        for (index, point) in positions.iter().enumerate() {
            self.place(index, *point);
        }
        true
    }

    /// Number of non-loop edges touching each node, in node order.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.nodes.len()];
        for edge in self.edges.iter().filter(|edge| !edge.is_loop()) {
            degrees[edge.source_index] += 1;
            degrees[edge.target_index] += 1;
        }
        degrees
    }
}
