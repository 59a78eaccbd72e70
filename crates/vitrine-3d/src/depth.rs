use wgpu::{Device, Texture, TextureView};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub fn create_depth(device: &Device, width: u32, height: u32) -> (TextureView, Texture) {
    create_depth_texture(
        device,
        "depth",
        width,
        height,
        wgpu::TextureUsages::RENDER_ATTACHMENT,
    )
}

pub fn create_depth_texture(
    device: &Device,
    label: &str,
    width: u32,
    height: u32,
    usage: wgpu::TextureUsages,
) -> (TextureView, Texture) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (view, texture)
}
