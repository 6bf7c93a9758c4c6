//! Engine data structures: scene graphs, transforms and vertex data.
//!
//! - `geometry` holds position attributes, packed or interleaved, and plain vertex buffers
//! - `instance` is a node's local translation, rotation and scale
//! - `scene_graph` enables hierarchical scene organization and glTF conversion

pub mod geometry;
pub mod instance;
pub mod scene_graph;
