use glam::Vec3;
use vitrine_3d::{Light, ShadowSettings, color_from_hex};

pub const KEY_SHADOW: ShadowSettings = ShadowSettings {
    map_size: 2048,
    extent: 15.0,
    near: 0.5,
    far: 30.0,
};

/// Studio rig lighting the model from above: a shadow-casting key light, a
/// frontal fill, two mirrored side lights, a cool ambient and a top point light.
pub fn standard_rig() -> Vec<Light> {
    let side = color_from_hex(0x66aaff);

    vec![
        Light::Directional {
            color: Vec3::ONE,
            intensity: 1.8,
            position: Vec3::new(0.0, 15.0, 5.0),
            shadow: Some(KEY_SHADOW),
        },
        Light::Directional {
            color: color_from_hex(0x4d94ff),
            intensity: 1.0,
            position: Vec3::new(0.0, 3.0, 10.0),
            shadow: None,
        },
        Light::Directional {
            color: side,
            intensity: 0.6,
            position: Vec3::new(8.0, 3.0, 0.0),
            shadow: None,
        },
        Light::Directional {
            color: side,
            intensity: 0.6,
            position: Vec3::new(-8.0, 3.0, 0.0),
            shadow: None,
        },
        Light::Ambient {
            color: color_from_hex(0x6699ff),
            intensity: 0.6,
        },
        Light::Point {
            color: Vec3::ONE,
            intensity: 1.2,
            position: Vec3::new(0.0, 10.0, 0.0),
            range: 25.0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rig_composition() {
        let rig = standard_rig();
        let directional = rig
            .iter()
            .filter(|l| matches!(l, Light::Directional { .. }))
            .count();
        let ambient = rig
            .iter()
            .filter(|l| matches!(l, Light::Ambient { .. }))
            .count();
        let point = rig
            .iter()
            .filter(|l| matches!(l, Light::Point { .. }))
            .count();

        assert_eq!((directional, ambient, point), (4, 1, 1));
        assert_eq!(rig.iter().filter(|l| l.casts_shadow()).count(), 1);
        assert!(rig[0].casts_shadow());
    }

    #[test]
    fn test_side_lights_are_mirrored() {
        let rig = standard_rig();
        let (Light::Directional { position: a, .. }, Light::Directional { position: b, .. }) =
            (rig[2], rig[3])
        else {
            panic!("side lights must be directional");
        };
        assert_eq!(a.x, -b.x);
        assert_eq!((a.y, a.z), (b.y, b.z));
    }
}
