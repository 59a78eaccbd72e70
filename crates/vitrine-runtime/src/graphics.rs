use crate::context::RenderTarget;
use anyhow::Context;
use std::sync::Arc;
use vitrine_3d::{Renderer3D, create_bind_group_layouts};
use vitrine_camera::{OrbitCamera, update_camera_buffer};
use vitrine_scene::Scene;
use wgpu::{
    Adapter, CommandEncoder, CommandEncoderDescriptor, Device, ExperimentalFeatures, Features,
    Instance, Limits, MemoryHints, PowerPreference, Queue, RequestAdapterOptions, Surface,
    SurfaceConfiguration, SurfaceError, Texture, TextureFormat, TextureView,
    TextureViewDescriptor,
};
use winit::{event_loop::EventLoopProxy, window::Window};

pub type RcWindow = Arc<Window>;

/// Offscreen color target the scene is rendered into and the UI samples.
pub struct Viewport {
    _color: Texture,
    pub color_view: TextureView,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl Viewport {
    pub fn new(device: &Device, format: TextureFormat, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("viewport_color"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color_view = color.create_view(&TextureViewDescriptor::default());

        Self {
            _color: color,
            color_view,
            width,
            height,
            format,
        }
    }

    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        *self = Viewport::new(device, self.format, width, height);
    }
}

/// Acquires the GPU for `window` and hands the finished backend to the event
/// loop through `proxy`.
pub async fn create_graphics(
    window: RcWindow,
    proxy: EventLoopProxy<Graphics>,
) -> anyhow::Result<()> {
    let instance = Instance::default();
    let surface = instance
        .create_surface(Arc::clone(&window))
        .context("creating window surface")?;

    let adapter = instance
        .request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .context("no suitable GPU adapter")?;
    log::info!("using adapter {:?}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: Features::empty(),
            required_limits: Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
            memory_hints: MemoryHints::Performance,
            trace: Default::default(),
            experimental_features: ExperimentalFeatures::disabled(),
        })
        .await
        .context("requesting GPU device")?;

    let size = window.inner_size();
    let surface_config = surface
        .get_default_config(&adapter, size.width.max(1), size.height.max(1))
        .context("surface is not supported by the adapter")?;
    surface.configure(&device, &surface_config);

    let viewport = Viewport::new(
        &device,
        surface_config.format,
        surface_config.width,
        surface_config.height,
    );
    let renderer = Renderer3D::new(
        &device,
        surface_config.format,
        viewport.width,
        viewport.height,
        create_bind_group_layouts(&device),
    );

    let gfx = Graphics {
        window,
        viewport,
        _instance: instance,
        _adapter: adapter,
        surface,
        surface_config,
        device,
        queue,
        renderer,
        uploaded_revision: None,
    };

    if proxy.send_event(gfx).is_err() {
        log::warn!("event loop closed before graphics were ready");
    }
    Ok(())
}

pub struct Graphics {
    window: RcWindow,
    viewport: Viewport,
    _instance: Instance,
    _adapter: Adapter,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    device: Device,
    queue: Queue,
    renderer: Renderer3D,
    uploaded_revision: Option<u64>,
}

impl Graphics {
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    pub fn viewport_view(&self) -> &TextureView {
        &self.viewport.color_view
    }

    pub fn resize_surface(&mut self, width: u32, height: u32) {
        self.surface_config.width = width.max(1);
        self.surface_config.height = height.max(1);
        self.configure_surface();
    }

    fn configure_surface(&mut self) {
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Draws the UI pass on top of the swap chain image and presents it.
    pub fn present<F>(&mut self, overlay: F)
    where
        F: FnOnce(&mut Self, &TextureView, &mut CommandEncoder),
    {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                log::debug!("surface lost, reconfiguring");
                self.configure_surface();
                return;
            }
            Err(err) => {
                log::warn!("skipping frame: {err}");
                return;
            }
        };

        let swap_view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("overlay_encoder"),
            });
        overlay(self, &swap_view, &mut encoder);
        self.queue.submit(Some(encoder.finish()));
        frame.present();
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn surface_config(&self) -> &SurfaceConfiguration {
        &self.surface_config
    }

    fn upload_model(&mut self, scene: &Scene) {
        let active = scene.active();
        self.renderer.set_model(&self.device, &active.data);
        self.uploaded_revision = Some(scene.revision());
        log::debug!(
            "uploaded {:?} model ({} triangles)",
            active.kind,
            active.data.triangle_count()
        );
    }
}

impl RenderTarget for Graphics {
    fn size(&self) -> (u32, u32) {
        (self.viewport.width, self.viewport.height)
    }

    /// Resizes the offscreen scene target only. The swap chain follows the
    /// window through `resize_surface`.
    fn resize(&mut self, width: u32, height: u32) {
        self.viewport.resize(&self.device, width, height);
        self.renderer
            .resize(&self.device, self.viewport.width, self.viewport.height);
    }

    fn prepare(&mut self, scene: &Scene) {
        self.renderer
            .set_lights(&self.device, &self.queue, &scene.lights);
        if let Some(background) = &scene.background {
            self.renderer.set_backdrop(
                &self.device,
                &self.queue,
                background.width(),
                background.height(),
                background.rgba(),
            );
        }
        if let Some(grid) = &scene.grid {
            self.renderer.set_grid(&self.device, &grid.line_vertices());
        }
        self.upload_model(scene);
    }

    fn render(&mut self, scene: &Scene, camera: &OrbitCamera) {
        if self.uploaded_revision != Some(scene.revision()) {
            self.upload_model(scene);
        }

        update_camera_buffer(&self.queue, &self.renderer.camera_buf, camera);
        self.renderer
            .set_model_transform(&self.queue, scene.active().transform.matrix());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });
        self.renderer.render(&mut encoder, &self.viewport.color_view);
        self.queue.submit(Some(encoder.finish()));
    }
}
