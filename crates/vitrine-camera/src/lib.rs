use glam::{Mat4, Vec2, Vec3};
use vitrine_3d::CameraUniform;
use wgpu::{Buffer, Queue};

const MIN_POLAR: f32 = 0.000_001;

/// Perspective camera orbiting a target, stored in spherical coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    /// Azimuth around +Y, zero on +Z.
    pub theta: f32,
    /// Polar angle from +Y.
    pub phi: f32,
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    pub fn looking_at(eye: Vec3, target: Vec3, fov_y_degrees: f32, near: f32, far: f32) -> Self {
        let offset = eye - target;
        let radius = offset.length().max(f32::EPSILON);
        let theta = offset.x.atan2(offset.z);
        let phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        Self {
            target,
            radius,
            theta,
            phi,
            fov_y_degrees,
            aspect: 1.0,
            near,
            far,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + self.radius
                * Vec3::new(
                    sin_phi * self.theta.sin(),
                    self.phi.cos(),
                    sin_phi * self.theta.cos(),
                )
    }

    /// Recomputes the aspect ratio from a pixel size. Zero dimensions count as one.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        );
        proj * view
    }
}

/// Pointer-driven orbit controls with inertia.
pub struct OrbitController {
    pending: Vec2,
    zoom_scale: f32,
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl OrbitController {
    pub fn new(damping: f32, min_distance: f32, max_distance: f32) -> Self {
        Self {
            pending: Vec2::ZERO,
            zoom_scale: 1.0,
            damping,
            min_distance,
            max_distance,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }

    /// Queues a drag of `delta` pixels over a viewport `viewport_height` pixels tall.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        let k = std::f32::consts::TAU * self.rotate_speed / height;
        self.pending.x -= delta.x * k;
        self.pending.y -= delta.y * k;
    }

    /// Positive steps zoom in.
    pub fn zoom(&mut self, steps: f32) {
        if steps != 0.0 {
            self.zoom_scale *= 0.95_f32.powf(steps * self.zoom_speed);
        }
    }

    pub fn update(&mut self, cam: &mut OrbitCamera, dt: f32) {
        // Damping is tuned per 60 Hz frame.
        let k = (self.damping * dt * 60.0).clamp(0.0, 1.0);

        cam.theta += self.pending.x * k;
        cam.phi += self.pending.y * k;
        cam.phi = cam.phi.clamp(MIN_POLAR, std::f32::consts::PI - MIN_POLAR);
        self.pending *= 1.0 - k;

        cam.radius = (cam.radius * self.zoom_scale).clamp(self.min_distance, self.max_distance);
        self.zoom_scale = 1.0;
    }
}

pub fn camera_uniform(camera: &OrbitCamera) -> CameraUniform {
    CameraUniform {
        view_proj: camera.view_proj().to_cols_array_2d(),
        eye: camera.eye().extend(1.0).to_array(),
    }
}

pub fn update_camera_buffer(queue: &Queue, camera_buf: &Buffer, camera: &OrbitCamera) {
    queue.write_buffer(camera_buf, 0, bytemuck::cast_slice(&[camera_uniform(camera)]));
}
