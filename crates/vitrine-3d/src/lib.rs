pub mod backdrop;
pub mod depth;
pub mod lights;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod shadow;

pub use depth::create_depth;
pub use lights::{Light, LightUniforms, ShadowSettings, color_from_hex};
pub use model::{GpuMesh, MaterialData, MeshData, Model, ModelData, Vertex, create_model_ubo};
pub use pipeline::{CameraUniform, Layouts, LineVertex, create_bind_group_layouts, create_pipeline};
pub use render::Renderer3D;
