#![doc = include_str!("../README.md")]

pub mod context;
pub mod descriptor;
pub mod error;
pub mod node;
pub mod output;
pub mod params;

pub use error::NodeError;
pub use node::DocumentIntelligenceNode;
pub use output::{OutputItem, PairedItem};
