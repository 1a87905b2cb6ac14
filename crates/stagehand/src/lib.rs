//! Stagehand - layout orchestration for interactive node-link diagrams.
//!
//! A [`LayoutController`] owns the lifecycle of a pluggable layout strategy
//! for one host graph: it projects the graph into a [`LayoutSnapshot`], seeds
//! nodes without positions, runs the strategy (at once, tick by tick, or on a
//! worker thread) and pushes the result through the host's [`RenderBridge`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::rc::Rc;
//!
//! use stagehand::{GraphHost, LayoutConfig, LayoutController, LayoutEvent, RenderBridge};
//! use stagehand::snapshot::NodeRecord;
//! use stagehand_core::model::{ComboTree, EdgeModel, GraphData, NodeModel};
//!
//! struct Canvas;
//!
//! impl RenderBridge for Canvas {
//!     fn refresh_positions(&self, nodes: &[NodeRecord]) {
//!         for node in nodes {
//!             println!("{} at {:?}", node.id(), node.position());
//!         }
//!     }
//! }
//!
//! impl GraphHost for Canvas {
//!     fn width(&self) -> f32 { 800.0 }
//!     fn height(&self) -> f32 { 600.0 }
//!     fn layout_config(&self) -> Option<LayoutConfig> { Some(LayoutConfig::new("circular")) }
//!     fn combo_trees(&self) -> Vec<ComboTree> { Vec::new() }
//!     fn graph_data(&self) -> GraphData {
//!         GraphData::new(
//!             vec![NodeModel::new("a"), NodeModel::new("b")],
//!             vec![EdgeModel::new("a", "b")],
//!         )
//!     }
//!     fn emit(&self, event: LayoutEvent) { println!("{event}"); }
//! }
//!
//! let canvas = Rc::new(Canvas);
//! let mut controller = LayoutController::new(&canvas);
//! controller.layout(None);
//! controller.run_to_completion(500);
//! ```

pub mod callback;
pub mod config;
pub mod controller;
pub mod event;
pub mod host;
pub mod position;
pub mod projector;
pub mod slot;
pub mod snapshot;
pub mod strategy;
pub mod worker;

mod error;

pub use stagehand_core::{geometry, identifier, model, value};

pub use config::LayoutConfig;
pub use controller::{ControllerState, LayoutController, TickStatus};
pub use error::LayoutError;
pub use event::LayoutEvent;
pub use host::{GraphHost, RenderBridge};
pub use snapshot::LayoutSnapshot;
