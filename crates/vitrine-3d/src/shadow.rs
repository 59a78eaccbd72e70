use crate::depth::create_depth_texture;
use wgpu::{Device, Sampler, Texture, TextureView};

pub struct ShadowMap {
    pub view: TextureView,
    pub sampler: Sampler,
    pub size: u32,
    _texture: Texture,
}

impl ShadowMap {
    pub fn new(device: &Device, size: u32) -> Self {
        let size = size.max(1);
        let (view, texture) = create_depth_texture(
            device,
            "shadow_map",
            size,
            size,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            view,
            sampler,
            size,
            _texture: texture,
        }
    }
}
