use cgmath::Vector3;
use instant::Duration;
use wgpu::util::DeviceExt;

use crate::data_structures::{
    atlas::{self, AtlasLayout},
    instance::Instance,
    model,
    texture::Texture,
};
use crate::resources;

/**
 * A `CubeField` is the instanced cube population of the viewer.
 *
 * It starts empty; once the model load delivers the node positions, one
 * instance is created per position and from then on the instance count never
 * changes. Every frame the instances drift toward their targets and the
 * instance buffer is rewritten in one pass.
 */
pub struct CubeField {
    pub model: model::Model,
    pub instances: Vec<Instance>,
    targets: Vec<Instance>,
    pub instance_buffer: wgpu::Buffer,
    atlas_buffer: wgpu::Buffer,
    atlas: AtlasLayout,
    approach_rate: f32,
    buffer_size_needs_change: bool,
}

impl CubeField {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        atlas: AtlasLayout,
        approach_rate: f32,
    ) -> Self {
        let atlas_buffer = atlas::mk_atlas_buffer(device, atlas);
        let layout = atlas::atlas_bind_layout(device);

        // A grey stand-in until the real atlas arrives.
        let placeholder = Texture::create_placeholder(1, 1, device, queue);
        let material =
            model::Material::new(device, "atlas placeholder", placeholder, &atlas_buffer, &layout);

        let mesh = resources::mesh::cube_mesh(device, "cube");
        let model = model::Model {
            meshes: vec![mesh],
            materials: vec![material],
        };

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: &[],
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            model,
            instances: Vec::new(),
            targets: Vec::new(),
            instance_buffer,
            atlas_buffer,
            atlas,
            approach_rate,
            buffer_size_needs_change: false,
        }
    }

    /// Build one instance per extracted node position.
    ///
    /// Instance `i` spawns at its source position with zero scale and seeks
    /// the target `position * spread` at `cube_scale`; its atlas tile cycles
    /// through the grid. The instance count equals `positions.len()` from
    /// here on.
    pub fn populate(&mut self, positions: Vec<Vector3<f32>>, spread: f32, cube_scale: f32) {
        let tiles = self.atlas.tile_count();
        self.instances = positions
            .iter()
            .enumerate()
            .map(|(i, position)| Instance {
                position: *position,
                scale: Vector3::new(0.0, 0.0, 0.0),
                tile: i as u32 % tiles,
                ..Default::default()
            })
            .collect();
        self.targets = positions
            .into_iter()
            .enumerate()
            .map(|(i, position)| Instance {
                position: position * spread,
                scale: Vector3::new(cube_scale, cube_scale, cube_scale),
                tile: i as u32 % tiles,
                ..Default::default()
            })
            .collect();
        self.buffer_size_needs_change = true;
        log::info!("cube field populated with {} instances", self.instances.len());
    }

    /// Swap the placeholder material for the loaded atlas texture.
    pub fn set_atlas(&mut self, device: &wgpu::Device, texture: Texture) {
        self.model
            .set_material(device, "atlas", texture, &self.atlas_buffer);
    }

    /// Advance every instance a fraction of the way toward its target.
    pub fn step(&mut self, dt: Duration) {
        let alpha = (self.approach_rate * dt.as_secs_f32()).min(1.0);
        self.instances
            .iter_mut()
            .zip(self.targets.iter())
            .for_each(|(instance, target)| instance.step_toward(target, alpha));
    }

    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        if self.instances.is_empty() {
            return;
        }
        let raw_instances = self
            .instances
            .iter()
            .map(Instance::to_raw)
            .collect::<Vec<_>>();
        if self.buffer_size_needs_change {
            self.instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Instance Buffer"),
                contents: bytemuck::cast_slice(&raw_instances),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
            self.buffer_size_needs_change = false;
        } else {
            queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&raw_instances),
            );
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
