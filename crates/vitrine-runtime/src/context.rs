use crate::overlay::Overlay;
use crate::session::LoadSession;
use glam::Vec3;
use vitrine_camera::{OrbitCamera, OrbitController};
use vitrine_gltf::LoadHandle;
use vitrine_scene::lights::standard_rig;
use vitrine_scene::{Background, GroundGrid, Scene, SceneModel};

pub const CAMERA_EYE: Vec3 = Vec3::new(0.0, 9.0, 15.0);
pub const CAMERA_FOV_DEGREES: f32 = 80.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;

pub const ORBIT_DAMPING: f32 = 0.05;
pub const ORBIT_MIN_DISTANCE: f32 = 6.0;
pub const ORBIT_MAX_DISTANCE: f32 = 25.0;

/// Whatever the scene is drawn into. Implemented by the GPU backend and by
/// test doubles.
pub trait RenderTarget {
    fn size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);
    /// Called once after bootstrap with the static parts of the scene.
    fn prepare(&mut self, scene: &Scene);
    fn render(&mut self, scene: &Scene, camera: &OrbitCamera);
}

pub struct ViewerContext<T: RenderTarget> {
    pub scene: Scene,
    pub camera: OrbitCamera,
    pub controller: OrbitController,
    pub overlay: Overlay,
    target: T,
    session: LoadSession,
}

impl<T: RenderTarget> ViewerContext<T> {
    /// Builds the full scene around `target` with the placeholder model
    /// already active, so the very first frame has something to show.
    pub fn bootstrap(mut target: T) -> Self {
        let (width, height) = target.size();

        let mut camera = OrbitCamera::looking_at(
            CAMERA_EYE,
            Vec3::ZERO,
            CAMERA_FOV_DEGREES,
            CAMERA_NEAR,
            CAMERA_FAR,
        );
        camera.set_viewport(width, height);

        let mut scene = Scene::new(SceneModel::fallback());
        for light in standard_rig() {
            scene.add_light(light);
        }
        scene.background = Some(Background::default());
        scene.grid = Some(GroundGrid::default());

        target.prepare(&scene);
        log::info!(
            "viewer bootstrapped at {width}x{height} with {} lights",
            scene.lights.len()
        );

        Self {
            scene,
            camera,
            controller: OrbitController::new(
                ORBIT_DAMPING,
                ORBIT_MIN_DISTANCE,
                ORBIT_MAX_DISTANCE,
            ),
            overlay: Overlay::default(),
            target,
            session: LoadSession::new(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.camera.set_viewport(width, height);
        self.target.resize(width, height);
    }

    pub fn frame(&mut self, dt: f32) {
        self.controller.update(&mut self.camera, dt);
        self.session
            .advance(&mut self.scene, &mut self.overlay, dt);
        self.target.render(&self.scene, &self.camera);
    }

    /// Starts swapping in the asset behind `handle`. Rejected when a load was
    /// already started on this context.
    pub fn start_load(&mut self, handle: LoadHandle) -> bool {
        self.session.start(handle, &mut self.overlay)
    }

    pub fn session(&self) -> &LoadSession {
        &self.session
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{FAILURE_HIDE_DELAY, SessionPhase};
    use vitrine_gltf::channel;
    use vitrine_scene::ModelKind;

    #[derive(Default)]
    struct FakeTarget {
        size: (u32, u32),
        prepared: usize,
        resizes: Vec<(u32, u32)>,
        frames: Vec<(ModelKind, u64)>,
    }

    impl RenderTarget for FakeTarget {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.resizes.push(self.size);
        }

        fn prepare(&mut self, _scene: &Scene) {
            self.prepared += 1;
        }

        fn render(&mut self, scene: &Scene, _camera: &OrbitCamera) {
            self.frames.push((scene.active().kind, scene.revision()));
        }
    }

    fn context() -> ViewerContext<FakeTarget> {
        ViewerContext::bootstrap(FakeTarget {
            size: (1280, 720),
            ..Default::default()
        })
    }

    #[test]
    fn test_bootstrap_builds_scene() {
        let ctx = context();
        assert_eq!(ctx.target().prepared, 1);
        assert_eq!(ctx.scene.lights.len(), 6);
        assert!(ctx.scene.background.is_some());
        assert!(ctx.scene.grid.is_some());
        assert_eq!(ctx.scene.active().kind, ModelKind::Fallback);
        assert!((ctx.camera.aspect - 1280.0 / 720.0).abs() < 1e-6);
        assert!((ctx.camera.eye() - CAMERA_EYE).length() < 1e-4);
        assert!(!ctx.overlay.visible);
    }

    #[test]
    fn test_every_frame_has_active_model() {
        let mut ctx = context();
        for _ in 0..10 {
            ctx.frame(1.0 / 60.0);
        }
        assert_eq!(ctx.target().frames.len(), 10);
        assert!(
            ctx.target()
                .frames
                .iter()
                .all(|(kind, _)| *kind == ModelKind::Fallback)
        );
    }

    #[test]
    fn test_resize_updates_aspect_on_same_target() {
        let mut ctx = context();
        ctx.resize(800, 600);
        assert!((ctx.camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        ctx.resize(400, 300);
        assert!((ctx.camera.aspect - 400.0 / 300.0).abs() < 1e-6);
        assert_eq!(ctx.target().resizes, vec![(800, 600), (400, 300)]);
        assert_eq!(ctx.target().size(), (400, 300));
    }

    #[test]
    fn test_failed_load_hides_overlay_and_keeps_fallback() {
        let mut ctx = context();
        let (sender, handle) = channel();
        assert!(ctx.start_load(handle));
        assert!(ctx.overlay.visible);

        sender.finish(Err(anyhow::anyhow!("network unreachable")));

        let mut elapsed = 0.0;
        while ctx.overlay.visible && elapsed < 10.0 {
            ctx.frame(1.0 / 60.0);
            elapsed += 1.0 / 60.0;
        }
        assert!(elapsed <= FAILURE_HIDE_DELAY + 0.1);
        assert_eq!(ctx.scene.active().kind, ModelKind::Fallback);
        assert_eq!(ctx.session().phase(), SessionPhase::Done);
        assert!(ctx.target().frames.iter().all(|(_, revision)| *revision == 0));
    }

    #[test]
    fn test_second_load_is_rejected() {
        let mut ctx = context();
        let (_a, first) = channel();
        let (_b, second) = channel();
        assert!(ctx.start_load(first));
        assert!(!ctx.start_load(second));
    }

    #[test]
    fn test_zero_size_resize_is_clamped() {
        let mut ctx = context();
        ctx.resize(0, 0);
        assert_eq!(ctx.target().size(), (1, 1));
        assert_eq!(ctx.camera.aspect, 1.0);
    }
}
