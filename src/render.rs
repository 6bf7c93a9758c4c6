//! GPU side of the debug wireframe.
//!
//! [`DebugLinesGpu`] mirrors the two arrays of a [`LineSegments`] in vertex
//! buffers of the same capacity. Only the visible prefix is uploaded, and only
//! when the attributes were flagged dirty.

use std::ops::Range;

use crate::{context::Context, debug_draw::LineSegments};

pub struct DebugLinesGpu {
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    vertices: Range<u32>,
}

impl DebugLinesGpu {
    /// Allocates both vertex buffers for `buffer_size` floats each.
    pub fn new(device: &wgpu::Device, buffer_size: usize) -> Self {
        let mk_buffer = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: (buffer_size * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        Self {
            positions: mk_buffer("Debug Line Positions"),
            colors: mk_buffer("Debug Line Colors"),
            vertices: 0..0,
        }
    }

    /// Uploads dirty attributes and adopts the current draw range.
    pub fn upload(&mut self, queue: &wgpu::Queue, lines: &mut LineSegments) {
        let range = lines.geometry.draw_range();
        let offset = (range.start * 3 * std::mem::size_of::<f32>()) as wgpu::BufferAddress;
        if lines.geometry.position.take_needs_update() && !range.is_empty() {
            queue.write_buffer(
                &self.positions,
                offset,
                bytemuck::cast_slice(lines.visible_positions()),
            );
        }
        if lines.geometry.color.take_needs_update() && !range.is_empty() {
            queue.write_buffer(
                &self.colors,
                offset,
                bytemuck::cast_slice(lines.visible_colors()),
            );
        }
        self.vertices = range.start as u32..range.end as u32;
    }

    pub fn draw<'pass>(&self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'pass>) {
        if self.vertices.is_empty() {
            return;
        }
        render_pass.set_pipeline(&ctx.line_pipeline);
        render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.positions.slice(..));
        render_pass.set_vertex_buffer(1, self.colors.slice(..));
        render_pass.draw(self.vertices.clone(), 0..1);
    }
}

/**
 * Clears the frame and draws the debug lines on top.
 *
 * Returns the surface error so the caller can reconfigure a lost or outdated surface.
 */
pub fn render_frame(ctx: &Context, lines: &DebugLinesGpu) -> Result<(), wgpu::SurfaceError> {
    let output = ctx.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ctx.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        lines.draw(ctx, &mut render_pass);
    }

    ctx.queue.submit(std::iter::once(encoder.finish()));
    output.present();
    Ok(())
}
