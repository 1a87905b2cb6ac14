//! Headless graph host.
//!
//! [`HeadlessHost`] stands in for a paint surface: it owns the graph, records
//! lifecycle events and applies refreshed positions to its own node models.

use std::cell::{Cell, RefCell};

use log::{debug, trace};

use stagehand::{
    GraphHost, LayoutConfig, LayoutEvent, RenderBridge,
    geometry::{Bounds, Point, Size},
    identifier::Id,
    model::{ComboTree, GraphData},
    snapshot::NodeRecord,
};

/// Margin kept free on each side when fitting the graph to the canvas.
const FIT_PADDING: f32 = 20.0;

pub struct HeadlessHost {
    canvas: Size,
    graph: RefCell<GraphData>,
    layout: RefCell<Option<LayoutConfig>>,
    events: RefCell<Vec<LayoutEvent>>,
    refreshes: Cell<usize>,
}

impl HeadlessHost {
    pub fn new(graph: GraphData, canvas: Size) -> Self {
        Self {
            canvas,
            graph: RefCell::new(graph),
            layout: RefCell::new(None),
            events: RefCell::new(Vec::new()),
            refreshes: Cell::new(0),
        }
    }

    pub fn with_layout_config(self, config: Option<LayoutConfig>) -> Self {
        *self.layout.borrow_mut() = config;
        self
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    /// Positions of visible nodes that have both coordinates, in declaration
    /// order.
    pub fn positions(&self) -> Vec<(Id, Point)> {
        self.graph
            .borrow()
            .nodes
            .iter()
            .filter(|node| node.visible)
            .filter_map(|node| Some((node.id, node.position()?)))
            .collect()
    }

    /// Events emitted so far.
    pub fn events(&self) -> Vec<LayoutEvent> {
        self.events.borrow().clone()
    }

    /// Number of position refreshes received.
    pub fn refreshes(&self) -> usize {
        self.refreshes.get()
    }

    fn transform_positions(&self, f: impl Fn(Point) -> Point) {
        let mut graph = self.graph.borrow_mut();
        for node in graph.nodes.iter_mut().filter(|node| node.visible) {
            if let Some(point) = node.position() {
                let moved = f(point);
                node.x = Some(moved.x());
                node.y = Some(moved.y());
            }
        }
    }

    fn bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(self.positions().into_iter().map(|(_, point)| point))
    }
}

impl RenderBridge for HeadlessHost {
    fn refresh_positions(&self, nodes: &[NodeRecord]) {
        let mut graph = self.graph.borrow_mut();
        for record in nodes {
            let Some(node) = graph.node_mut(record.id()) else {
                continue;
            };
            if let Some(x) = record.x() {
                node.x = Some(x);
            }
            if let Some(y) = record.y() {
                node.y = Some(y);
            }
        }
        self.refreshes.set(self.refreshes.get() + 1);
        trace!(nodes = nodes.len(); "Positions refreshed");
    }

    /// Scales uniformly so the graph fits inside the padded canvas and
    /// centers it.
    fn fit_view(&self) {
        let Some(bounds) = self.bounds() else {
            return;
        };
        let avail_w = (self.canvas.width() - 2.0 * FIT_PADDING).max(1.0);
        let avail_h = (self.canvas.height() - 2.0 * FIT_PADDING).max(1.0);
        let scale = (avail_w / bounds.width().max(1.0)).min(avail_h / bounds.height().max(1.0));

        let from = bounds.center();
        let to = self.canvas.center();
        debug!(scale; "Fitting graph to canvas");
        self.transform_positions(|point| point.sub_point(from).scale(scale).add_point(to));
    }

    fn fit_center(&self) {
        let Some(bounds) = self.bounds() else {
            return;
        };
        let shift = self.canvas.center().sub_point(bounds.center());
        self.transform_positions(|point| point.add_point(shift));
    }
}

impl GraphHost for HeadlessHost {
    fn width(&self) -> f32 {
        self.canvas.width()
    }

    fn height(&self) -> f32 {
        self.canvas.height()
    }

    fn layout_config(&self) -> Option<LayoutConfig> {
        self.layout.borrow().clone()
    }

    fn set_layout_config(&self, config: Option<LayoutConfig>) {
        *self.layout.borrow_mut() = config;
    }

    fn combo_trees(&self) -> Vec<ComboTree> {
        ComboTree::build(&self.graph.borrow())
    }

    fn graph_data(&self) -> GraphData {
        self.graph.borrow().clone()
    }

    fn emit(&self, event: LayoutEvent) {
        debug!(event = event.name(); "Layout event");
        self.events.borrow_mut().push(event);
    }
}
