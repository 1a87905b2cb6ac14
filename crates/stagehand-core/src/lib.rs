//! Stagehand Core Types
//!
//! This crate provides the foundational types shared by the Stagehand layout
//! controller and its hosts. It includes:
//!
//! - **Identifiers**: String-interned identifiers ([`identifier::Id`])
//! - **Geometry**: Points, sizes and bounds ([`geometry`] module)
//! - **Values**: Loosely typed option and data values ([`value::OptionValue`])
//! - **Model**: The host-side graph model a controller projects from ([`model`] module)

pub mod geometry;
pub mod identifier;
pub mod model;
pub mod value;
