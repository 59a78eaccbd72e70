use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Orthographic shadow frustum for a directional light.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShadowSettings {
    pub map_size: u32,
    pub extent: f32,
    pub near: f32,
    pub far: f32,
}

impl ShadowSettings {
    pub fn view_proj(&self, light_position: Vec3) -> Mat4 {
        let view = Mat4::look_at_rh(light_position, Vec3::ZERO, Vec3::Y);
        let proj = Mat4::orthographic_rh(
            -self.extent,
            self.extent,
            -self.extent,
            self.extent,
            self.near,
            self.far,
        );
        proj * view
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Light {
    Directional {
        color: Vec3,
        intensity: f32,
        position: Vec3,
        shadow: Option<ShadowSettings>,
    },
    Ambient {
        color: Vec3,
        intensity: f32,
    },
    Point {
        color: Vec3,
        intensity: f32,
        position: Vec3,
        range: f32,
    },
}

impl Light {
    pub fn casts_shadow(&self) -> bool {
        matches!(self, Light::Directional { shadow: Some(_), .. })
    }
}

pub fn color_from_hex(rgb: u32) -> Vec3 {
    Vec3::new(
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    )
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct DirectionalLightRaw {
    /// Unit vector pointing from the surface towards the light.
    pub direction: [f32; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct PointLightRaw {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightUniforms {
    pub directional: [DirectionalLightRaw; MAX_DIRECTIONAL_LIGHTS],
    pub point: PointLightRaw,
    pub ambient: [f32; 4],
    /// x: directional count, y: point count, z: shadow enabled.
    pub counts: [u32; 4],
    pub shadow_view_proj: [[f32; 4]; 4],
}

impl LightUniforms {
    /// Packs a light list into the uniform layout. Extra directional lights past
    /// the fixed capacity and extra point lights are dropped with a warning;
    /// ambient lights accumulate.
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut uniforms = Self {
            directional: [DirectionalLightRaw::default(); MAX_DIRECTIONAL_LIGHTS],
            point: PointLightRaw::default(),
            ambient: [0.0; 4],
            counts: [0; 4],
            shadow_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let mut ambient = Vec3::ZERO;

        for light in lights {
            match *light {
                Light::Directional {
                    color,
                    intensity,
                    position,
                    shadow,
                } => {
                    let slot = uniforms.counts[0] as usize;
                    if slot >= MAX_DIRECTIONAL_LIGHTS {
                        log::warn!("dropping directional light beyond {MAX_DIRECTIONAL_LIGHTS}");
                        continue;
                    }
                    let dir = position.normalize_or(Vec3::Y);
                    uniforms.directional[slot] = DirectionalLightRaw {
                        direction: dir.extend(0.0).to_array(),
                        color: color.extend(intensity).to_array(),
                    };
                    uniforms.counts[0] += 1;

                    if let Some(shadow) = shadow {
                        if uniforms.counts[2] == 0 {
                            uniforms.counts[2] = 1;
                            uniforms.shadow_view_proj =
                                shadow.view_proj(position).to_cols_array_2d();
                        }
                    }
                }
                Light::Ambient { color, intensity } => {
                    ambient += color * intensity;
                }
                Light::Point {
                    color,
                    intensity,
                    position,
                    range,
                } => {
                    if uniforms.counts[1] > 0 {
                        log::warn!("dropping extra point light");
                        continue;
                    }
                    uniforms.point = PointLightRaw {
                        position: position.extend(range).to_array(),
                        color: color.extend(intensity).to_array(),
                    };
                    uniforms.counts[1] = 1;
                }
            }
        }

        uniforms.ambient = ambient.extend(1.0).to_array();
        uniforms
    }
}
