//! flow-collide
//!
//! Turns a loaded glTF model into a single kinematic collision body made of
//! one convex hull per mesh, steps it in a rapier world and draws the world's
//! debug wireframe. Runs natively and in the browser.
//!
//! High-level modules
//! - `camera`: perspective camera and its uniform
//! - `config`: runtime configuration with the viewer's defaults
//! - `context`: GPU and window context that owns device, queue and the line pipeline
//! - `data_structures`: scene graph, transforms and vertex attributes
//! - `debug_draw`: physics debug lines written into fixed-capacity arrays
//! - `flow`: the `GraphicsFlow` trait, the simulation state and the application event loop
//! - `physics`: vertex extraction, hull shapes, compound bodies and the physics world
//! - `pipelines`: the debug line render pipeline
//! - `render`: upload and drawing of the debug lines
//! - `resources`: asynchronous model loading
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod debug_draw;
pub mod flow;
pub mod physics;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use config::Config;
pub use flow::{FlowEvent, GraphicsFlow, Simulation, run};
pub use rapier3d::prelude::{Isometry, Real};
