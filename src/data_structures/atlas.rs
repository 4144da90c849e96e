//! Texture atlas grid math and its GPU uniform.
//!
//! The atlas is a single image cut into a `cols` x `rows` grid of equally
//! sized tiles. Instances carry a tile index; the fragment shader maps the
//! cube's local UVs into the selected tile's sub-rectangle. [`AtlasLayout`]
//! keeps the CPU-side mirror of that lookup so it can be tested without a
//! GPU.

use wgpu::util::DeviceExt;

/// The tile grid of the atlas image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasLayout {
    pub cols: u32,
    pub rows: u32,
}

impl AtlasLayout {
    pub fn new(cols: u32, rows: u32) -> Self {
        debug_assert!(cols > 0 && rows > 0);
        Self { cols, rows }
    }

    pub fn tile_count(&self) -> u32 {
        self.cols * self.rows
    }

    /// UV offset and scale of a tile, row-major from the top-left cell.
    ///
    /// This mirrors the lookup in `cube_shader.wgsl`: the shader computes
    /// `(vec2(col, row) + local_uv) * scale`, which equals
    /// `offset + local_uv * scale`. Indices wrap around the tile count.
    pub fn uv_rect(&self, tile: u32) -> ([f32; 2], [f32; 2]) {
        let tile = tile % self.tile_count();
        let col = tile % self.cols;
        let row = tile / self.cols;
        let scale = [1.0 / self.cols as f32, 1.0 / self.rows as f32];
        let offset = [col as f32 * scale[0], row as f32 * scale[1]];
        (offset, scale)
    }
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self { cols: 4, rows: 4 }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AtlasUniform {
    cols: f32,
    rows: f32,
    // Uniforms require 16 byte (4 float) spacing, so we pad the vec2 out
    _padding: [f32; 2],
}

impl From<AtlasLayout> for AtlasUniform {
    fn from(layout: AtlasLayout) -> Self {
        Self {
            cols: layout.cols as f32,
            rows: layout.rows as f32,
            _padding: [0.0; 2],
        }
    }
}

pub fn mk_atlas_buffer(device: &wgpu::Device, layout: AtlasLayout) -> wgpu::Buffer {
    let uniform: AtlasUniform = layout.into();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Atlas Uniform Buffer"),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn atlas_bind_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("atlas_bind_group_layout"),
    })
}
