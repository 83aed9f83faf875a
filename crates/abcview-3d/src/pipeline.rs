use bytemuck::{Pod, Zeroable};
use wgpu::*;

/// Layout of the single uniform block. The camera writes `wvp` every frame;
/// `color` is written once.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Uniforms {
    pub wvp: [f32; 16],
    pub color: [f32; 4],
}

impl Uniforms {
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            wvp: glam::Mat4::IDENTITY.to_cols_array(),
            color,
        }
    }
}

const POSITION_ATTRS: [VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

pub fn create_uniform_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("uniform_bgl"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: BufferSize::new(std::mem::size_of::<Uniforms>() as u64),
            },
            count: None,
        }],
    })
}

/// Triangle-list pipeline over packed `vec3<f32>` positions, no culling and
/// no depth test.
pub fn create_pipeline(
    device: &Device,
    surface_format: TextureFormat,
    uniform_bgl: &BindGroupLayout,
    polygon_mode: PolygonMode,
) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
    });

    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("scene_pipeline_layout"),
        bind_group_layouts: &[uniform_bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("scene_pipeline"),
        layout: Some(&layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: PipelineCompilationOptions::default(),
            buffers: &[VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 3]>() as BufferAddress,
                step_mode: VertexStepMode::Vertex,
                attributes: &POSITION_ATTRS,
            }],
        },
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode,
            conservative: false,
        },
        depth_stencil: None,
        multisample: MultisampleState::default(),
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: PipelineCompilationOptions::default(),
            targets: &[Some(ColorTargetState {
                format: surface_format,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        // mat4x4<f32> then vec4<f32>, no padding.
        assert_eq!(std::mem::size_of::<Uniforms>(), 80);
        let u = Uniforms::new([1.0, 0.5, 0.2, 1.0]);
        let bytes: &[u8] = bytemuck::bytes_of(&u);
        assert_eq!(&bytes[64..68], &1.0f32.to_ne_bytes());
    }
}
