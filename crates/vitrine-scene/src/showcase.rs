use crate::bounds::Aabb;
use crate::{ModelKind, ModelTransform, SceneModel};
use glam::Vec3;
use std::sync::Arc;
use vitrine_3d::ModelData;

/// Largest dimension of a loaded model after framing.
pub const TARGET_SIZE: f32 = 12.0;
/// Height of the model's center above the origin once framed.
pub const LIFT: f32 = 1.5;

pub const SHOWCASE_METALNESS: f32 = 0.3;
pub const SHOWCASE_ROUGHNESS: f32 = 0.4;
pub const COLOR_BOOST: f32 = 1.2;

/// Makes every mesh cast and receive shadows and normalizes its material so
/// arbitrary assets read well under the studio rig.
pub fn apply_showcase_materials(data: &mut ModelData) {
    for mesh in &mut data.meshes {
        mesh.cast_shadow = true;
        mesh.receive_shadow = true;
    }
    for material in &mut data.materials {
        material.metalness = SHOWCASE_METALNESS;
        material.roughness = SHOWCASE_ROUGHNESS;
        for channel in &mut material.base_color[..3] {
            *channel *= COLOR_BOOST;
        }
    }
}

/// Transform that centers `bounds` on the origin, scales its largest side to
/// `target_size` and raises it by `lift`. A zero-sized box keeps scale 1.
pub fn frame_to_size(bounds: &Aabb, target_size: f32, lift: f32) -> ModelTransform {
    let extent = bounds.max_extent();
    let scale = if extent > f32::EPSILON {
        target_size / extent
    } else {
        1.0
    };

    ModelTransform {
        translation: Vec3::new(0.0, lift, 0.0),
        scale,
        pivot: -bounds.center(),
    }
}

/// Turns freshly parsed asset data into the model that replaces the
/// placeholder. Returns `None` when the asset has no vertices.
pub fn prepare_loaded(mut data: ModelData) -> Option<SceneModel> {
    let bounds = Aabb::from_points(data.positions())?;
    apply_showcase_materials(&mut data);

    Some(SceneModel {
        kind: ModelKind::Loaded,
        data: Arc::new(data),
        transform: frame_to_size(&bounds, TARGET_SIZE, LIFT),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_3d::{MaterialData, MeshData, Vertex};

    fn box_model(min: Vec3, max: Vec3) -> ModelData {
        let corners = [min, max, Vec3::new(min.x, max.y, min.z)];
        ModelData {
            meshes: vec![MeshData {
                vertices: corners.iter().map(|p| Vertex::new(*p, Vec3::Y)).collect(),
                indices: vec![0, 1, 2],
                material: 0,
                cast_shadow: false,
                receive_shadow: false,
            }],
            materials: vec![MaterialData {
                base_color: [0.5, 0.25, 1.0, 0.5],
                metalness: 1.0,
                roughness: 0.0,
            }],
        }
    }

    #[test]
    fn test_framing_centers_and_scales() {
        let cases = [
            (Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)),
            (Vec3::new(100.0, 20.0, -5.0), Vec3::new(400.0, 30.0, 5.0)),
            (Vec3::new(0.001, 0.002, 0.0), Vec3::new(0.004, 0.003, 0.001)),
            (Vec3::new(-3.0, 7.0, 2.0), Vec3::new(-3.0, 9.0, 2.0)),
        ];

        for (min, max) in cases {
            let model = prepare_loaded(box_model(min, max)).unwrap();
            let bounds = model.world_bounds().unwrap();
            let center = bounds.center() - Vec3::new(0.0, LIFT, 0.0);
            let tolerance = 1e-4 * TARGET_SIZE;

            assert!(center.abs().max_element() < tolerance, "{center:?}");
            assert!((bounds.max_extent() - TARGET_SIZE).abs() < tolerance);
        }
    }

    #[test]
    fn test_zero_extent_keeps_unit_scale() {
        let p = Vec3::new(2.0, 3.0, 4.0);
        let t = frame_to_size(&Aabb::new(p, p), TARGET_SIZE, LIFT);
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.matrix().transform_point3(p), Vec3::new(0.0, LIFT, 0.0));
    }

    #[test]
    fn test_materials_are_normalized() {
        let model = prepare_loaded(box_model(Vec3::ZERO, Vec3::ONE)).unwrap();
        let material = model.data.materials[0];
        assert_eq!(material.metalness, SHOWCASE_METALNESS);
        assert_eq!(material.roughness, SHOWCASE_ROUGHNESS);
        assert!((material.base_color[0] - 0.6).abs() < 1e-6);
        assert!((material.base_color[2] - 1.2).abs() < 1e-6);
        assert_eq!(material.base_color[3], 0.5);
        assert!(model.data.meshes.iter().all(|m| m.cast_shadow && m.receive_shadow));
        assert_eq!(model.kind, ModelKind::Loaded);
    }

    #[test]
    fn test_empty_asset_is_rejected() {
        assert!(prepare_loaded(ModelData::default()).is_none());
    }
}
