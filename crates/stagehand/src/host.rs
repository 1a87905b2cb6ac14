//! Interfaces the controller uses to talk to its host.
//!
//! The host owns the live graph and the paint surface. The controller only
//! reads from it ([`GraphHost`]), announces milestones to it
//! ([`GraphHost::emit`]) and pushes computed coordinates through the
//! [`RenderBridge`]. The host never calls back into the controller from these
//! methods.
//!
//! All methods take `&self`; hosts that record state use interior mutability.

use stagehand_core::model::{ComboTree, GraphData};

use crate::{config::LayoutConfig, event::LayoutEvent, snapshot::NodeRecord};

/// Boundary through which computed positions reach the paint surface.
pub trait RenderBridge {
    /// Pushes the current node coordinates to the paint surface.
    ///
    /// This is the only path through which a layout run changes the host's
    /// node positions.
    fn refresh_positions(&self, nodes: &[NodeRecord]);

    /// Fits the whole graph into the viewport.
    fn fit_view(&self) {}

    /// Centers the graph in the viewport without scaling.
    fn fit_center(&self) {}
}

/// The graph a controller lays out.
pub trait GraphHost: RenderBridge {
    /// Current canvas width.
    fn width(&self) -> f32;

    /// Current canvas height.
    fn height(&self) -> f32;

    /// Layout options the host was declared with.
    fn layout_config(&self) -> Option<LayoutConfig>;

    /// Replaces the host's declared layout options.
    fn set_layout_config(&self, _config: Option<LayoutConfig>) {}

    /// Current combo hierarchy.
    fn combo_trees(&self) -> Vec<ComboTree>;

    /// Current nodes, edges and combos, including render-only state.
    fn graph_data(&self) -> GraphData;

    /// Announces a lifecycle milestone.
    fn emit(&self, event: LayoutEvent);
}
