//! Render pipelines. Only the debug line list is drawn.

pub mod lines;
