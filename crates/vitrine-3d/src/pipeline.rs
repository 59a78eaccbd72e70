use crate::depth::DEPTH_FORMAT;
use crate::model::Vertex;
use bytemuck::{Pod, Zeroable};
use wgpu::*;

pub struct Layouts {
    pub camera_bgl: BindGroupLayout,
    pub model_bgl: BindGroupLayout,
    pub material_bgl: BindGroupLayout,
    pub light_bgl: BindGroupLayout,
    pub backdrop_bgl: BindGroupLayout,
}

fn uniform_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub fn create_bind_group_layouts(device: &Device) -> Layouts {
    let camera_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("camera_bgl"),
        entries: &[uniform_entry(0, ShaderStages::VERTEX | ShaderStages::FRAGMENT)],
    });

    let model_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("model_bgl"),
        entries: &[uniform_entry(0, ShaderStages::VERTEX)],
    });

    let material_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("material_bgl"),
        entries: &[uniform_entry(0, ShaderStages::FRAGMENT)],
    });

    let light_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("light_bgl"),
        entries: &[
            uniform_entry(0, ShaderStages::VERTEX | ShaderStages::FRAGMENT),
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Depth,
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 2,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Comparison),
                count: None,
            },
        ],
    });

    let backdrop_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("backdrop_bgl"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    Layouts {
        camera_bgl,
        model_bgl,
        material_bgl,
        light_bgl,
        backdrop_bgl,
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

/// Vertex of a grid line: position plus straight RGBA.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    const ATTRIBUTES: [VertexAttribute; 2] = vertex_attr_array![0 => Float32x3, 1 => Float32x4];

    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<LineVertex>() as BufferAddress,
        step_mode: VertexStepMode::Vertex,
        attributes: &Self::ATTRIBUTES,
    };
}

fn depth_state(write: bool, compare: CompareFunction) -> DepthStencilState {
    DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: StencilState::default(),
        bias: DepthBiasState::default(),
    }
}

pub fn create_pipeline(
    device: &Device,
    surface_format: TextureFormat,
    layouts: &Layouts,
) -> RenderPipeline {
    let shader = device.create_shader_module(include_wgsl!("shaders/mesh.wgsl"));

    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("mesh_layout"),
        bind_group_layouts: &[
            &layouts.camera_bgl,
            &layouts.model_bgl,
            &layouts.material_bgl,
            &layouts.light_bgl,
        ],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("mesh_pipeline"),
        layout: Some(&layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: PipelineCompilationOptions::default(),
            buffers: &[Vertex::LAYOUT],
        },
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
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            front_face: FrontFace::Ccw,
            // Imported assets do not agree on winding.
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(depth_state(true, CompareFunction::Less)),
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

pub fn create_shadow_pipeline(device: &Device, layouts: &Layouts) -> RenderPipeline {
    let shader = device.create_shader_module(include_wgsl!("shaders/shadow.wgsl"));

    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("shadow_layout"),
        bind_group_layouts: &[&layouts.camera_bgl, &layouts.model_bgl],
        push_constant_ranges: &[],
    });

    let mut depth = depth_state(true, CompareFunction::LessEqual);
    depth.bias = DepthBiasState {
        constant: 2,
        slope_scale: 2.0,
        clamp: 0.0,
    };

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("shadow_pipeline"),
        layout: Some(&layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: PipelineCompilationOptions::default(),
            buffers: &[Vertex::LAYOUT],
        },
        fragment: None,
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(depth),
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

pub fn create_backdrop_pipeline(
    device: &Device,
    surface_format: TextureFormat,
    layouts: &Layouts,
) -> RenderPipeline {
    let shader = device.create_shader_module(include_wgsl!("shaders/backdrop.wgsl"));

    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("backdrop_layout"),
        bind_group_layouts: &[&layouts.backdrop_bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("backdrop_pipeline"),
        layout: Some(&layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: PipelineCompilationOptions::default(),
            buffers: &[],
        },
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
        primitive: PrimitiveState::default(),
        depth_stencil: Some(depth_state(false, CompareFunction::Always)),
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

pub fn create_grid_pipeline(
    device: &Device,
    surface_format: TextureFormat,
    layouts: &Layouts,
) -> RenderPipeline {
    let shader = device.create_shader_module(include_wgsl!("shaders/grid.wgsl"));

    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("grid_layout"),
        bind_group_layouts: &[&layouts.camera_bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("grid_pipeline"),
        layout: Some(&layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: PipelineCompilationOptions::default(),
            buffers: &[LineVertex::LAYOUT],
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: PipelineCompilationOptions::default(),
            targets: &[Some(ColorTargetState {
                format: surface_format,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::LineList,
            ..Default::default()
        },
        depth_stencil: Some(depth_state(false, CompareFunction::LessEqual)),
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
