pub mod background;
pub mod bounds;
pub mod fallback;
pub mod grid;
pub mod lights;
pub mod showcase;

pub use background::Background;
pub use bounds::Aabb;
pub use grid::GroundGrid;

use glam::{Mat4, Vec3};
use std::sync::Arc;
use vitrine_3d::{Light, ModelData};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModelKind {
    Fallback,
    Loaded,
}

/// `translation * scale * pivot`: the pivot offset is applied before the
/// uniform scale, so scaling always happens around the model's own center.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ModelTransform {
    pub translation: Vec3,
    pub scale: f32,
    pub pivot: Vec3,
}

impl ModelTransform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_scale(Vec3::splat(self.scale))
            * Mat4::from_translation(self.pivot)
    }
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: 1.0,
            pivot: Vec3::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneModel {
    pub kind: ModelKind,
    pub data: Arc<ModelData>,
    pub transform: ModelTransform,
}

impl SceneModel {
    pub fn fallback() -> Self {
        Self {
            kind: ModelKind::Fallback,
            data: Arc::new(fallback::build_fallback()),
            transform: ModelTransform::from_translation(Vec3::new(
                0.0,
                fallback::FALLBACK_ELEVATION,
                0.0,
            )),
        }
    }

    pub fn world_bounds(&self) -> Option<Aabb> {
        let m = self.transform.matrix();
        Aabb::from_points(self.data.positions().map(|p| m.transform_point3(p)))
    }
}

pub struct Scene {
    pub lights: Vec<Light>,
    pub background: Option<Background>,
    pub grid: Option<GroundGrid>,
    active: SceneModel,
    revision: u64,
}

impl Scene {
    pub fn new(active: SceneModel) -> Self {
        Self {
            lights: Vec::new(),
            background: None,
            grid: None,
            active,
            revision: 0,
        }
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn active(&self) -> &SceneModel {
        &self.active
    }

    /// Mutable access for animating the transform. The geometry itself only
    /// changes through `replace_active`.
    pub fn active_transform_mut(&mut self) -> &mut ModelTransform {
        &mut self.active.transform
    }

    /// Swaps in a new active model and hands back the detached one.
    pub fn replace_active(&mut self, model: SceneModel) -> SceneModel {
        self.revision += 1;
        std::mem::replace(&mut self.active, model)
    }

    /// Bumped every time the active model is replaced.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_active_detaches_previous() {
        let mut scene = Scene::new(SceneModel::fallback());
        assert_eq!(scene.active().kind, ModelKind::Fallback);

        let loaded = SceneModel {
            kind: ModelKind::Loaded,
            data: Arc::new(ModelData::default()),
            transform: ModelTransform::default(),
        };
        let previous = scene.replace_active(loaded);

        assert_eq!(previous.kind, ModelKind::Fallback);
        assert_eq!(scene.active().kind, ModelKind::Loaded);
        assert_eq!(scene.revision(), 1);
    }

    #[test]
    fn test_fallback_sits_above_origin() {
        let model = SceneModel::fallback();
        let bounds = model.world_bounds().unwrap();
        assert!((bounds.center() - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_transform_scales_around_pivot() {
        let t = ModelTransform {
            translation: Vec3::new(0.0, 1.0, 0.0),
            scale: 2.0,
            pivot: Vec3::new(-5.0, 0.0, 0.0),
        };
        assert_eq!(t.matrix().transform_point3(Vec3::new(5.0, 0.0, 0.0)), Vec3::Y);
        assert_eq!(
            t.matrix().transform_point3(Vec3::new(6.0, 0.0, 0.0)),
            Vec3::new(2.0, 1.0, 0.0)
        );
    }
}
