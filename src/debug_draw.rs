//! Debug wireframes of the physics world.
//!
//! The [`DebugDrawBridge`] owns a [`LineSegments`] renderable whose position
//! and color arrays have a fixed capacity. Each step the [`DebugDrawer`]
//! overwrites a prefix of both arrays with the current line vertices and
//! reports how many it wrote. Only that prefix is valid for rendering.

use std::ops::Range;

use bitflags::bitflags;
use rapier3d::prelude::{
    DebugRenderBackend, DebugRenderMode, DebugRenderObject, DebugRenderPipeline,
    DebugRenderStyle, Point, Real,
};

use crate::physics::PhysicsWorld;

/// Floats per debug array: room for one million vertices.
pub const DEFAULT_BUFFER_SIZE: usize = 3 * 1_000_000;

bitflags! {
    /// Categories of debug output, with Bullet's bit values.
    ///
    /// The empty set disables drawing. Bits not listed here are ignored.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DebugMode: u32 {
        const WIREFRAME = 1;
        const AABB = 1 << 1;
        const CONTACT_POINTS = 1 << 3;
        const CONSTRAINTS = 1 << 11;
    }
}

impl DebugMode {
    pub fn from_raw(bits: u32) -> Self {
        Self::from_bits_truncate(bits)
    }

    fn to_render_mode(self) -> DebugRenderMode {
        let mut mode = DebugRenderMode::empty();
        if self.contains(DebugMode::WIREFRAME) {
            mode |= DebugRenderMode::COLLIDER_SHAPES;
        }
        if self.contains(DebugMode::AABB) {
            mode |= DebugRenderMode::COLLIDER_AABBS;
        }
        if self.contains(DebugMode::CONTACT_POINTS) {
            mode |= DebugRenderMode::CONTACTS | DebugRenderMode::SOLVER_CONTACTS;
        }
        if self.contains(DebugMode::CONSTRAINTS) {
            mode |= DebugRenderMode::JOINTS;
        }
        mode
    }
}

/// A float array the renderer uploads whenever `needs_update` is set.
#[derive(Debug)]
pub struct BufferAttribute {
    pub array: Vec<f32>,
    pub item_size: usize,
    pub needs_update: bool,
}

impl BufferAttribute {
    pub fn new(capacity: usize, item_size: usize) -> Self {
        Self {
            array: vec![0.0; capacity],
            item_size,
            needs_update: false,
        }
    }

    /// Number of whole items the array can hold.
    pub fn capacity(&self) -> usize {
        self.array.len() / self.item_size
    }

    /// Clears the dirty flag, returning whether it was set.
    pub fn take_needs_update(&mut self) -> bool {
        std::mem::take(&mut self.needs_update)
    }
}

#[derive(Debug)]
pub struct LineGeometry {
    pub position: BufferAttribute,
    pub color: BufferAttribute,
    draw_range: Range<usize>,
}

impl LineGeometry {
    pub fn set_draw_range(&mut self, start: usize, count: usize) {
        self.draw_range = start..start + count;
    }

    /// Vertices to draw.
    pub fn draw_range(&self) -> Range<usize> {
        self.draw_range.clone()
    }
}

/// Line list with per-vertex colors; every two vertices form one segment.
#[derive(Debug)]
pub struct LineSegments {
    pub geometry: LineGeometry,
    /// Debug lines span the whole world, so they are never culled.
    pub frustum_culled: bool,
}

impl LineSegments {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            geometry: LineGeometry {
                position: BufferAttribute::new(buffer_size, 3),
                color: BufferAttribute::new(buffer_size, 3),
                draw_range: 0..0,
            },
            frustum_culled: false,
        }
    }

    /// Positions of the vertices inside the draw range.
    pub fn visible_positions(&self) -> &[f32] {
        let range = self.geometry.draw_range();
        &self.geometry.position.array[range.start * 3..range.end * 3]
    }

    /// Colors of the vertices inside the draw range.
    pub fn visible_colors(&self) -> &[f32] {
        let range = self.geometry.draw_range();
        &self.geometry.color.array[range.start * 3..range.end * 3]
    }
}

/// The drawer's output target: both arrays of a [`LineSegments`] plus the write cursor.
struct LineWriter<'a> {
    positions: &'a mut [f32],
    colors: &'a mut [f32],
    index: usize,
    dropped: usize,
}

impl LineWriter<'_> {
    fn push_vertex(&mut self, point: &Point<Real>, rgb: [f32; 3]) {
        let at = self.index * 3;
        self.positions[at..at + 3].copy_from_slice(&[point.x, point.y, point.z]);
        self.colors[at..at + 3].copy_from_slice(&rgb);
        self.index += 1;
    }
}

impl DebugRenderBackend for LineWriter<'_> {
    fn draw_line(
        &mut self,
        _object: DebugRenderObject,
        a: Point<Real>,
        b: Point<Real>,
        color: [f32; 4],
    ) {
        let capacity = self.positions.len().min(self.colors.len()) / 3;
        if self.index + 2 > capacity {
            self.dropped += 1;
            return;
        }
        let rgb = hsl_to_rgb(color[0], color[1], color[2]);
        self.push_vertex(&a, rgb);
        self.push_vertex(&b, rgb);
    }
}

/// Rapier colors are HSLA with the hue in degrees.
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h = (h.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    [r + m, g + m, b + m]
}

/// Renders the physics world into line vertex arrays.
pub struct DebugDrawer {
    pipeline: DebugRenderPipeline,
    mode: DebugMode,
    enabled: bool,
    index: usize,
}

impl DebugDrawer {
    pub fn new(mode: DebugMode) -> Self {
        Self {
            pipeline: DebugRenderPipeline::new(DebugRenderStyle::default(), mode.to_render_mode()),
            mode,
            enabled: true,
            index: 0,
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn set_debug_mode(&mut self, mode: DebugMode) {
        self.mode = mode;
        self.pipeline.mode = mode.to_render_mode();
    }

    pub fn debug_mode(&self) -> DebugMode {
        self.mode
    }

    /// Vertices written by the last update.
    pub fn index(&self) -> usize {
        self.index
    }

    /**
     * Overwrites the start of `lines`' arrays with the world's current debug lines.
     *
     * Returns the number of vertices written. A disabled drawer or an empty mode
     * writes nothing.
     */
    pub fn update(&mut self, world: &PhysicsWorld, lines: &mut LineSegments) -> usize {
        self.index = 0;
        if !self.enabled || self.mode.is_empty() {
            return 0;
        }
        let geometry = &mut lines.geometry;
        let mut writer = LineWriter {
            positions: &mut geometry.position.array,
            colors: &mut geometry.color.array,
            index: 0,
            dropped: 0,
        };
        self.pipeline.render(
            &mut writer,
            &world.bodies,
            &world.colliders,
            &world.impulse_joints,
            &world.multibody_joints,
            &world.narrow_phase,
        );
        if writer.dropped > 0 {
            log::warn!(
                "debug buffer full, dropped {} lines; increase the debug buffer size",
                writer.dropped
            );
        }
        self.index = writer.index;
        self.index
    }
}

/// Keeps a [`LineSegments`] renderable in sync with the physics world.
pub struct DebugDrawBridge {
    pub drawer: DebugDrawer,
    pub lines: LineSegments,
}

impl DebugDrawBridge {
    pub fn new(buffer_size: usize, mode: DebugMode) -> Self {
        let mut drawer = DebugDrawer::new(mode);
        drawer.enable();
        Self {
            drawer,
            lines: LineSegments::new(buffer_size),
        }
    }

    /**
     * Redraws the debug lines for the current simulation state.
     *
     * Attributes are only flagged for upload when something was written; the draw range
     * is always reset so that an empty frame draws nothing.
     */
    pub fn update(&mut self, world: &PhysicsWorld) {
        let index = self.drawer.update(world, &mut self.lines);
        let geometry = &mut self.lines.geometry;
        if index != 0 {
            geometry.position.needs_update = true;
            geometry.color.needs_update = true;
        }
        geometry.set_draw_range(0, index);
    }
}
