//! Runtime configuration.
//!
//! Everything has a default matching the stock viewer: a zero-gravity world
//! stepped at 0.01s with up to 10 sub-steps, wireframe debug drawing and the
//! usual mesh exclusions for annotation and floor geometry.

use crate::debug_draw::{DEFAULT_BUFFER_SIZE, DebugMode};

#[derive(Clone, Debug)]
pub struct Config {
    /// Model to load, relative to the asset root.
    pub model_path: String,
    pub physics: PhysicsConfig,
    pub debug: DebugDrawConfig,
    pub filter: MeshFilter,
    pub camera: CameraConfig,
    pub clear_colour: wgpu::Color,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: "Sofa.glb".to_string(),
            physics: PhysicsConfig::default(),
            debug: DebugDrawConfig::default(),
            filter: MeshFilter::default(),
            camera: CameraConfig::default(),
            clear_colour: wgpu::Color::BLACK,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    pub gravity: [f32; 3],
    /// Simulated time advanced per frame.
    pub time_step: f32,
    /// Upper bound of fixed steps per frame; `0` switches to one variable step.
    pub max_sub_steps: u32,
    pub fixed_time_step: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0, 0.0],
            time_step: 0.01,
            max_sub_steps: 10,
            fixed_time_step: 1.0 / 60.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DebugDrawConfig {
    pub mode: DebugMode,
    /// Capacity of each of the position and color arrays, in floats.
    pub buffer_size: usize,
}

impl Default for DebugDrawConfig {
    fn default() -> Self {
        Self {
            mode: DebugMode::WIREFRAME,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Decides which scene nodes contribute collision geometry.
#[derive(Clone, Debug)]
pub struct MeshFilter {
    /// Meshes whose material name contains this (case-sensitive) are annotations.
    pub excluded_material_pattern: String,
    /// Meshes with exactly this name are floor/reference geometry.
    pub floor_sentinel: String,
}

impl Default for MeshFilter {
    fn default() -> Self {
        Self {
            excluded_material_pattern: "imension".to_string(),
            floor_sentinel: "position_rug".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fovy_deg: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [1.0, 1.0, 2.0],
            target: [0.0, 0.0, 0.0],
            fovy_deg: 75.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }
}
