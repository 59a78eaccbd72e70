use crate::backdrop::{Backdrop, GridLines};
use crate::depth::create_depth;
use crate::lights::{Light, LightUniforms};
use crate::model::{Model, ModelData, ModelUniform, create_model_ubo};
use crate::pipeline::{
    CameraUniform, Layouts, LineVertex, create_backdrop_pipeline, create_grid_pipeline,
    create_pipeline, create_shadow_pipeline,
};
use crate::shadow::ShadowMap;
use bytemuck::Zeroable;
use glam::Mat4;
use wgpu::util::DeviceExt;
use wgpu::*;

pub struct Renderer3D {
    pub render_pipeline: RenderPipeline,
    pub depth_view: TextureView,
    pub depth_tex: Texture,
    pub camera_bg: BindGroup,
    pub camera_buf: Buffer,
    pub model_bg: BindGroup,
    pub model_buf: Buffer,
    pub layouts: Layouts,
    shadow_pipeline: RenderPipeline,
    backdrop_pipeline: RenderPipeline,
    grid_pipeline: RenderPipeline,
    shadow_camera_bg: BindGroup,
    shadow_camera_buf: Buffer,
    light_buf: Buffer,
    light_bg: BindGroup,
    shadow: ShadowMap,
    shadows_enabled: bool,
    backdrop: Option<Backdrop>,
    grid: Option<GridLines>,
    model: Option<Model>,
}

fn create_camera_ubo(device: &Device, layouts: &Layouts, label: &str) -> (Buffer, BindGroup) {
    let buf = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&[CameraUniform::zeroed()]),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });
    let bg = device.create_bind_group(&BindGroupDescriptor {
        label: Some(label),
        layout: &layouts.camera_bgl,
        entries: &[BindGroupEntry {
            binding: 0,
            resource: buf.as_entire_binding(),
        }],
    });
    (buf, bg)
}

fn create_light_bg(
    device: &Device,
    layouts: &Layouts,
    light_buf: &Buffer,
    shadow: &ShadowMap,
) -> BindGroup {
    device.create_bind_group(&BindGroupDescriptor {
        label: Some("light_bg"),
        layout: &layouts.light_bgl,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: light_buf.as_entire_binding(),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::TextureView(&shadow.view),
            },
            BindGroupEntry {
                binding: 2,
                resource: BindingResource::Sampler(&shadow.sampler),
            },
        ],
    })
}

impl Renderer3D {
    pub fn new(
        device: &Device,
        surface_format: TextureFormat,
        width: u32,
        height: u32,
        layouts: Layouts,
    ) -> Self {
        let (depth_view, depth_tex) = create_depth(device, width, height);

        let render_pipeline = create_pipeline(device, surface_format, &layouts);
        let shadow_pipeline = create_shadow_pipeline(device, &layouts);
        let backdrop_pipeline = create_backdrop_pipeline(device, surface_format, &layouts);
        let grid_pipeline = create_grid_pipeline(device, surface_format, &layouts);

        let (camera_buf, camera_bg) = create_camera_ubo(device, &layouts, "camera_ubo");
        let (shadow_camera_buf, shadow_camera_bg) =
            create_camera_ubo(device, &layouts, "shadow_camera_ubo");
        let (model_buf, model_bg) = create_model_ubo(device, &layouts.model_bgl, Mat4::IDENTITY);

        let light_buf = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some("light_ubo"),
            contents: bytemuck::cast_slice(&[LightUniforms::from_lights(&[])]),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let shadow = ShadowMap::new(device, 1);
        let light_bg = create_light_bg(device, &layouts, &light_buf, &shadow);

        Self {
            render_pipeline,
            depth_view,
            depth_tex,
            camera_bg,
            camera_buf,
            model_bg,
            model_buf,
            layouts,
            shadow_pipeline,
            backdrop_pipeline,
            grid_pipeline,
            shadow_camera_bg,
            shadow_camera_buf,
            light_buf,
            light_bg,
            shadow,
            shadows_enabled: false,
            backdrop: None,
            grid: None,
            model: None,
        }
    }

    pub fn set_lights(&mut self, device: &Device, queue: &Queue, lights: &[Light]) {
        let uniforms = LightUniforms::from_lights(lights);
        queue.write_buffer(&self.light_buf, 0, bytemuck::cast_slice(&[uniforms]));

        let shadow_settings = lights.iter().find_map(|light| match light {
            Light::Directional {
                shadow: Some(shadow),
                ..
            } => Some(*shadow),
            _ => None,
        });
        self.shadows_enabled = shadow_settings.is_some();

        let max_size = device.limits().max_texture_dimension_2d;
        let map_size = shadow_settings.map_or(1, |s| s.map_size.min(max_size));
        if map_size != self.shadow.size {
            log::debug!("shadow map resized to {map_size}");
            self.shadow = ShadowMap::new(device, map_size);
            self.light_bg = create_light_bg(device, &self.layouts, &self.light_buf, &self.shadow);
        }

        let shadow_camera = CameraUniform {
            view_proj: uniforms.shadow_view_proj,
            eye: [0.0; 4],
        };
        queue.write_buffer(
            &self.shadow_camera_buf,
            0,
            bytemuck::cast_slice(&[shadow_camera]),
        );
    }

    pub fn set_backdrop(
        &mut self,
        device: &Device,
        queue: &Queue,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) {
        self.backdrop = Some(Backdrop::new(
            device,
            queue,
            &self.layouts,
            width,
            height,
            rgba,
        ));
    }

    pub fn set_grid(&mut self, device: &Device, vertices: &[LineVertex]) {
        self.grid = (!vertices.is_empty()).then(|| GridLines::new(device, vertices));
    }

    pub fn set_model(&mut self, device: &Device, data: &ModelData) {
        self.model = Some(Model::upload(device, &self.layouts.material_bgl, data));
    }

    pub fn set_model_transform(&self, queue: &Queue, xform: Mat4) {
        queue.write_buffer(
            &self.model_buf,
            0,
            bytemuck::cast_slice(&[ModelUniform::from_matrix(xform)]),
        );
    }

    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        let (dv, dt) = create_depth(device, width, height);
        self.depth_view = dv;
        self.depth_tex = dt;
    }

    fn render_shadows(&self, encoder: &mut CommandEncoder, model: &Model) {
        let mut s_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("shadow_pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: &self.shadow.view,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        s_pass.set_pipeline(&self.shadow_pipeline);
        s_pass.set_bind_group(0, &self.shadow_camera_bg, &[]);
        s_pass.set_bind_group(1, &self.model_bg, &[]);

        for mesh in model.meshes.iter().filter(|m| m.cast_shadow) {
            s_pass.set_vertex_buffer(0, mesh.vbuf.slice(..));
            s_pass.set_index_buffer(mesh.ibuf.slice(..), IndexFormat::Uint32);
            s_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    pub fn render(&self, encoder: &mut CommandEncoder, target_view: &TextureView) {
        if let (true, Some(model)) = (self.shadows_enabled, &self.model) {
            self.render_shadows(encoder, model);
        }

        let mut r_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("scene_pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: target_view,
                depth_slice: None,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(Color::BLACK),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Some(backdrop) = &self.backdrop {
            r_pass.set_pipeline(&self.backdrop_pipeline);
            r_pass.set_bind_group(0, &backdrop.bind_group, &[]);
            r_pass.draw(0..3, 0..1);
        }

        if let Some(model) = &self.model {
            r_pass.set_pipeline(&self.render_pipeline);
            r_pass.set_bind_group(0, &self.camera_bg, &[]);
            r_pass.set_bind_group(1, &self.model_bg, &[]);
            r_pass.set_bind_group(3, &self.light_bg, &[]);

            for mesh in &model.meshes {
                r_pass.set_bind_group(2, &mesh.material_bg, &[]);
                r_pass.set_vertex_buffer(0, mesh.vbuf.slice(..));
                r_pass.set_index_buffer(mesh.ibuf.slice(..), IndexFormat::Uint32);
                r_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        if let Some(grid) = &self.grid {
            r_pass.set_pipeline(&self.grid_pipeline);
            r_pass.set_bind_group(0, &self.camera_bg, &[]);
            r_pass.set_vertex_buffer(0, grid.vbuf.slice(..));
            r_pass.draw(0..grid.vertex_count, 0..1);
        }
    }
}
