use crate::buffer::DynamicBuffer;
use crate::pipeline::{Uniforms, create_pipeline, create_uniform_layout};
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    pub polygon_mode: PolygonMode,
    pub clear_color: [f64; 3],
    pub line_color: [f32; 4],
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            polygon_mode: PolygonMode::Line,
            clear_color: [0.0, 0.2, 0.2],
            line_color: [1.0, 0.5, 0.2, 1.0],
        }
    }
}

/// Draws one flat vertex/index buffer pair with a single uniform transform.
pub struct SceneRenderer {
    pub render_pipeline: RenderPipeline,
    pub uniform_bg: BindGroup,
    pub uniform_buf: Buffer,
    vertices: DynamicBuffer,
    indices: DynamicBuffer,
    index_count: u32,
    clear_color: Color,
}

impl SceneRenderer {
    pub fn new(device: &Device, surface_format: TextureFormat, options: RenderOptions) -> Self {
        let uniform_bgl = create_uniform_layout(device);
        let render_pipeline =
            create_pipeline(device, surface_format, &uniform_bgl, options.polygon_mode);

        let uniform_buf = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("uniform_buf"),
            contents: bytemuck::bytes_of(&Uniforms::new(options.line_color)),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        let uniform_bg = device.create_bind_group(&BindGroupDescriptor {
            label: Some("uniform_bg"),
            layout: &uniform_bgl,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: uniform_buf.as_entire_binding(),
            }],
        });

        let [r, g, b] = options.clear_color;
        Self {
            render_pipeline,
            uniform_bg,
            uniform_buf,
            vertices: DynamicBuffer::new(device, "scene_vbuf", BufferUsages::VERTEX),
            indices: DynamicBuffer::new(device, "scene_ibuf", BufferUsages::INDEX),
            index_count: 0,
            clear_color: Color { r, g, b, a: 1.0 },
        }
    }

    /// Uploads this frame's packed positions and `u32` indices.
    pub fn upload(&mut self, device: &Device, queue: &Queue, vertices: &[u8], indices: &[u8]) {
        self.vertices.write(device, queue, vertices);
        self.indices.write(device, queue, indices);
        self.index_count = (indices.len() / std::mem::size_of::<u32>()) as u32;
    }

    pub fn render(&self, encoder: &mut CommandEncoder, target_view: &TextureView) {
        let mut r_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("scene_pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: target_view,
                depth_slice: None,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(self.clear_color),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if self.index_count == 0 {
            return;
        }

        r_pass.set_pipeline(&self.render_pipeline);
        r_pass.set_bind_group(0, &self.uniform_bg, &[]);
        r_pass.set_vertex_buffer(0, self.vertices.slice());
        r_pass.set_index_buffer(self.indices.slice(), IndexFormat::Uint32);
        r_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
