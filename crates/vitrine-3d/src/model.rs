use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use wgpu::{BindGroup, BindGroupLayout, Buffer, Device};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }

    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &Self::ATTRIBUTES,
    };
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MaterialData {
    pub base_color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
}

impl MaterialData {
    pub fn from_hex(rgb: u32, roughness: f32, metalness: f32) -> Self {
        let r = ((rgb >> 16) & 0xff) as f32 / 255.0;
        let g = ((rgb >> 8) & 0xff) as f32 / 255.0;
        let b = (rgb & 0xff) as f32 / 255.0;
        Self {
            base_color: [r, g, b, 1.0],
            metalness,
            roughness,
        }
    }
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            metalness: 0.0,
            roughness: 1.0,
        }
    }
}

/// One drawable piece of a model: triangles sharing a single material.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material: usize,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// CPU-side model, independent of any GPU device.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelData {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
}

impl ModelData {
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.meshes
            .iter()
            .flat_map(|mesh| mesh.vertices.iter())
            .map(|v| Vec3::from_array(v.position))
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }

    pub fn material_of(&self, mesh: &MeshData) -> MaterialData {
        self.materials
            .get(mesh.material)
            .copied()
            .unwrap_or_default()
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl ModelUniform {
    /// A collapsed transform (zero scale) has no inverse; its normals fall
    /// back to the identity.
    pub fn from_matrix(model: Mat4) -> Self {
        let normal = if model.determinant().abs() > 1e-12 {
            model.inverse().transpose()
        } else {
            Mat4::IDENTITY
        };
        Self {
            model: model.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub receive_shadow: f32,
    pub _pad: f32,
}

impl MaterialUniform {
    pub fn new(material: &MaterialData, receive_shadow: bool) -> Self {
        Self {
            base_color: material.base_color,
            metalness: material.metalness,
            roughness: material.roughness,
            receive_shadow: if receive_shadow { 1.0 } else { 0.0 },
            _pad: 0.0,
        }
    }
}

pub struct GpuMesh {
    pub vbuf: Buffer,
    pub ibuf: Buffer,
    pub index_count: u32,
    pub cast_shadow: bool,
    pub material_buf: Buffer,
    pub material_bg: BindGroup,
}

pub struct Model {
    pub meshes: Vec<GpuMesh>,
}

impl Model {
    pub fn upload(device: &Device, material_bgl: &BindGroupLayout, data: &ModelData) -> Self {
        let meshes = data
            .meshes
            .iter()
            .enumerate()
            .filter(|(_, mesh)| !mesh.indices.is_empty())
            .map(|(i, mesh)| {
                let vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("mesh_{i}_vertices")),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let ibuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("mesh_{i}_indices")),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

                let uniform = MaterialUniform::new(&data.material_of(mesh), mesh.receive_shadow);
                let material_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("mesh_{i}_material")),
                    contents: bytemuck::cast_slice(&[uniform]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                let material_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("material_bg"),
                    layout: material_bgl,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: material_buf.as_entire_binding(),
                    }],
                });

                GpuMesh {
                    vbuf,
                    ibuf,
                    index_count: mesh.indices.len() as u32,
                    cast_shadow: mesh.cast_shadow,
                    material_buf,
                    material_bg,
                }
            })
            .collect();

        Self { meshes }
    }
}

pub fn create_model_ubo(
    device: &Device,
    model_bgl: &BindGroupLayout,
    xform: Mat4,
) -> (Buffer, BindGroup) {
    let model_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("model_ubo"),
        contents: bytemuck::cast_slice(&[ModelUniform::from_matrix(xform)]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let model_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("model_bg"),
        layout: model_bgl,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: model_buf.as_entire_binding(),
        }],
    });

    (model_buf, model_bg)
}
