use crate::settings::{Settings, Theme, ThemeStore};
use egui::Sense;
use egui::load::SizedTexture;
use glam::Vec2;
use std::time::{Duration, Instant};
use vitrine_gltf::spawn_load;
use vitrine_runtime::{Graphics, Overlay, RcWindow, RenderTarget, ViewerContext, create_graphics};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

const MAX_FRAME_DT: f32 = 0.1;
/// Scroll points per zoom step.
const SCROLL_PER_STEP: f32 = 50.0;

enum State {
    Ready(Box<ReadyState>),
    Init(Option<EventLoopProxy<Graphics>>),
}

struct ReadyState {
    viewer: ViewerContext<Graphics>,
    ui_ctx: egui::Context,
    ui_input: egui_winit::State,
    ui_renderer: egui_wgpu::Renderer,
    scene_texture: egui::TextureId,
    /// Physical size of the central panel measured by the last UI pass.
    panel_size: Option<(u32, u32)>,
    last_frame: Instant,
}

pub struct App {
    state: State,
    settings: Settings,
    themes: ThemeStore,
    frame_time: Duration,
    next_frame: Instant,
}

/// Pixel size of a panel measured in points. `None` while it is collapsed.
fn panel_pixels(points: egui::Vec2, pixels_per_point: f32) -> Option<(u32, u32)> {
    if points.x <= 0.0 || points.y <= 0.0 {
        return None;
    }
    let pixels = points * pixels_per_point;
    Some((
        (pixels.x.round() as u32).max(1),
        (pixels.y.round() as u32).max(1),
    ))
}

fn visuals_for(theme: Theme) -> egui::Visuals {
    match theme {
        Theme::Light => egui::Visuals::light(),
        Theme::Dark => egui::Visuals::dark(),
    }
}

impl App {
    pub fn new(event_loop: &EventLoop<Graphics>, settings: Settings, themes: ThemeStore) -> Self {
        let frame_time = Duration::from_nanos(1_000_000_000 / settings.viewer.fps.max(1));
        Self {
            state: State::Init(Some(event_loop.create_proxy())),
            settings,
            themes,
            frame_time,
            next_frame: Instant::now(),
        }
    }

    fn ui_for_graphics(
        gfx: &Graphics,
        theme: Theme,
    ) -> (
        egui::Context,
        egui_winit::State,
        egui_wgpu::Renderer,
        egui::TextureId,
    ) {
        let ui_ctx = egui::Context::default();
        ui_ctx.set_visuals(visuals_for(theme));
        let viewport_id = ui_ctx.viewport_id();

        let ui_input = egui_winit::State::new(
            ui_ctx.clone(),
            viewport_id,
            gfx.window(),
            None,
            None,
            None,
        );

        let mut ui_renderer = egui_wgpu::Renderer::new(
            gfx.device(),
            gfx.surface_config().format,
            egui_wgpu::RendererOptions::default(),
        );

        let scene_texture = ui_renderer.register_native_texture(
            gfx.device(),
            gfx.viewport_view(),
            wgpu::FilterMode::Linear,
        );

        (ui_ctx, ui_input, ui_renderer, scene_texture)
    }

    fn draw(&mut self) {
        if let State::Ready(ready) = &mut self.state {
            Self::draw_viewer(ready, &mut self.themes);
        }
    }

    fn resized(&mut self, size: PhysicalSize<u32>) {
        if let State::Ready(ready) = &mut self.state {
            ready
                .viewer
                .target_mut()
                .resize_surface(size.width, size.height);
        }
    }

    /// Matches the scene target to the panel it is shown in, so the camera
    /// aspect follows the panel rather than the window.
    fn sync_viewport(ready: &mut ReadyState) {
        let Some((width, height)) = ready.panel_size else {
            return;
        };
        if ready.viewer.target().size() == (width, height) {
            return;
        }

        ready.viewer.resize(width, height);
        ready.ui_renderer.free_texture(&ready.scene_texture);
        let gfx = ready.viewer.target();
        ready.scene_texture = ready.ui_renderer.register_native_texture(
            gfx.device(),
            gfx.viewport_view(),
            wgpu::FilterMode::Linear,
        );
    }

    fn request_redraw(&self) {
        if let State::Ready(ready) = &self.state {
            ready.viewer.target().request_redraw();
        }
    }

    fn draw_overlay(ctx: &egui::Context, overlay: &Overlay) {
        if !overlay.visible {
            return;
        }
        egui::Window::new("loading_overlay")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.set_min_width(240.0);
                ui.vertical_centered(|ui| {
                    ui.heading(&overlay.text);
                    ui.add(egui::ProgressBar::new(overlay.progress));
                    ui.small(&overlay.details);
                });
            });
    }

    fn draw_viewer(ready: &mut ReadyState, themes: &mut ThemeStore) {
        let now = Instant::now();
        let dt = (now - ready.last_frame).as_secs_f32().min(MAX_FRAME_DT);
        ready.last_frame = now;
        Self::sync_viewport(ready);
        ready.viewer.frame(dt);

        let raw_input = ready
            .ui_input
            .take_egui_input(ready.viewer.target().window());
        let scene_texture = ready.scene_texture;
        let mut panel_size = ready.panel_size;
        let mut theme = themes.theme();
        let viewer = &mut ready.viewer;

        let full_output = ready.ui_ctx.run(raw_input, |ctx| {
            egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
                egui::MenuBar::new().ui(ui, |ui| {
                    ui.menu_button("View", |ui| {
                        let label = match theme {
                            Theme::Light => "Dark theme",
                            Theme::Dark => "Light theme",
                        };
                        if ui.button(label).clicked() {
                            theme = theme.toggled();
                            ui.close();
                        }
                    });

                    ui.menu_button("Help", |ui| {
                        ui.label("Drag to orbit, scroll to zoom.");
                    });
                });
            });

            egui::CentralPanel::default()
                .frame(egui::Frame::NONE)
                .show(ctx, |ui| {
                    let available = ui.available_size();
                    let Some(pixels) = panel_pixels(available, ctx.pixels_per_point()) else {
                        return;
                    };
                    panel_size = Some(pixels);

                    let sized = SizedTexture::new(scene_texture, available);
                    let image = egui::Image::from_texture(sized).sense(Sense::click_and_drag());
                    let response = ui.add(image);

                    if response.dragged_by(egui::PointerButton::Primary) {
                        let delta = response.drag_delta();
                        viewer
                            .controller
                            .rotate(Vec2::new(delta.x, delta.y), response.rect.height());
                    }
                    if response.hovered() {
                        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
                        if scroll != 0.0 {
                            viewer.controller.zoom(scroll / SCROLL_PER_STEP);
                        }
                    }
                });

            Self::draw_overlay(ctx, &viewer.overlay);
        });

        ready.panel_size = panel_size;
        if theme != themes.theme() {
            ready.ui_ctx.set_visuals(visuals_for(theme));
            if let Err(err) = themes.set(theme) {
                log::warn!("could not persist theme: {err:#}");
            }
        }

        let egui::FullOutput {
            platform_output,
            textures_delta,
            shapes,
            pixels_per_point,
            ..
        } = full_output;

        ready
            .ui_input
            .handle_platform_output(ready.viewer.target().window(), platform_output);

        let paint_jobs = ready.ui_ctx.tessellate(shapes, pixels_per_point);
        let ui_renderer = &mut ready.ui_renderer;

        ready
            .viewer
            .target_mut()
            .present(|gfx, swap_view, encoder| {
                for (id, image_delta) in &textures_delta.set {
                    ui_renderer.update_texture(gfx.device(), gfx.queue(), *id, image_delta);
                }
                for id in &textures_delta.free {
                    ui_renderer.free_texture(id);
                }

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [gfx.surface_config().width, gfx.surface_config().height],
                    pixels_per_point,
                };

                ui_renderer.update_buffers(
                    gfx.device(),
                    gfx.queue(),
                    encoder,
                    &paint_jobs,
                    &screen_descriptor,
                );

                let rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("ui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: swap_view,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                let mut rpass = rpass.forget_lifetime();
                ui_renderer.render(&mut rpass, &paint_jobs, &screen_descriptor);
            });
    }
}

impl ApplicationHandler<Graphics> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let State::Init(proxy) = &mut self.state else {
            return;
        };
        let Some(proxy) = proxy.take() else {
            return;
        };

        let attributes = Window::default_attributes().with_title(self.settings.viewer.title.clone());
        let window: RcWindow = match event_loop.create_window(attributes) {
            Ok(window) => std::sync::Arc::new(window),
            Err(err) => {
                log::error!("could not create window: {err}");
                event_loop.exit();
                return;
            }
        };

        if let Err(err) = pollster::block_on(create_graphics(window, proxy)) {
            log::error!("could not initialize graphics: {err:#}");
            event_loop.exit();
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, graphics: Graphics) {
        let (ui_ctx, ui_input, ui_renderer, scene_texture) =
            App::ui_for_graphics(&graphics, self.themes.theme());

        let mut viewer = ViewerContext::bootstrap(graphics);
        let asset_path = self.settings.asset_path();
        log::info!("loading {}", asset_path.display());
        viewer.start_load(spawn_load(asset_path));

        viewer.target().request_redraw();
        self.state = State::Ready(Box::new(ReadyState {
            viewer,
            ui_ctx,
            ui_input,
            ui_renderer,
            scene_texture,
            panel_size: None,
            last_frame: Instant::now(),
        }));
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, _cause: StartCause) {
        if self.next_frame <= Instant::now() {
            self.next_frame += self.frame_time;
            self.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::Resized(size) => self.resized(size),
            WindowEvent::RedrawRequested => {
                self.draw();
                let now = Instant::now();
                if self.next_frame <= now {
                    self.next_frame = now + self.frame_time;
                    self.request_redraw();
                }
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            other => {
                if let State::Ready(ready) = &mut self.state {
                    let response = ready
                        .ui_input
                        .on_window_event(ready.viewer.target().window(), &other);
                    if response.repaint {
                        ready.viewer.target().request_redraw();
                    }
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_pixels_scale_with_dpi() {
        assert_eq!(panel_pixels(egui::vec2(800.0, 576.0), 1.0), Some((800, 576)));
        assert_eq!(panel_pixels(egui::vec2(400.0, 287.5), 2.0), Some((800, 575)));
        assert_eq!(panel_pixels(egui::vec2(0.2, 0.2), 1.0), Some((1, 1)));
    }

    #[test]
    fn test_collapsed_panel_has_no_size() {
        assert_eq!(panel_pixels(egui::vec2(0.0, 300.0), 1.0), None);
        assert_eq!(panel_pixels(egui::vec2(300.0, -1.0), 1.5), None);
    }
}
