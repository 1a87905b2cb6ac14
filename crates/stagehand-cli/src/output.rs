//! Positions file written after a run.

use serde::Serialize;

use stagehand::identifier::Id;

use crate::{error::CliError, host::HeadlessHost};

#[derive(Debug, Serialize)]
pub struct PositionsFile {
    /// Strategy that produced the positions, absent when only scattered.
    #[serde(skip_serializing_if = "Option::is_none")]
    layout: Option<String>,
    nodes: Vec<NodePosition>,
}

#[derive(Debug, Serialize)]
struct NodePosition {
    id: Id,
    x: f32,
    y: f32,
}

impl PositionsFile {
    pub fn from_host(host: &HeadlessHost, layout: Option<&str>) -> Self {
        let nodes = host
            .positions()
            .into_iter()
            .map(|(id, point)| NodePosition {
                id,
                x: point.x(),
                y: point.y(),
            })
            .collect();
        Self {
            layout: layout.map(str::to_string),
            nodes,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
