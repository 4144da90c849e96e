//! Orbit camera, controller and uniforms for view/projection.
//!
//! The camera is parameterized as an orbit around a focal point: yaw and
//! pitch select a point on a sphere of `distance` around `target`, and the
//! view matrix always looks back at the target. [`OrbitController`]
//! accumulates mouse/wheel input between frames and applies it once per
//! frame in [`OrbitController::update`], optionally drifting the yaw while
//! the user is idle so the scene keeps orbiting on its own.

use instant::Duration;
use wgpu::util::DeviceExt;
use winit::event::{MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

// Keep the pitch off the poles, otherwise look_at degenerates.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.05;
const MIN_DISTANCE: f32 = 1.0;
const MAX_DISTANCE: f32 = 400.0;

/// An orbiting camera: a focal target plus spherical coordinates around it.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub target: cgmath::Point3<f32>,
    pub yaw: cgmath::Rad<f32>,
    pub pitch: cgmath::Rad<f32>,
    pub distance: f32,
}

impl Camera {
    pub fn new<T, Y, P>(target: T, yaw: Y, pitch: P, distance: f32) -> Self
    where
        T: Into<cgmath::Point3<f32>>,
        Y: Into<cgmath::Rad<f32>>,
        P: Into<cgmath::Rad<f32>>,
    {
        Self {
            target: target.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
            distance,
        }
    }

    /// The camera's world position on its orbit sphere.
    pub fn position(&self) -> cgmath::Point3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let offset = cgmath::Vector3::new(
            cos_pitch * cos_yaw,
            sin_pitch,
            cos_pitch * sin_yaw,
        ) * self.distance;
        self.target + offset
    }

    pub fn calc_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::look_at_rh(self.position(), self.target, cgmath::Vector3::unit_y())
    }
}

/// Perspective projection, resized together with the surface.
#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: cgmath::Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<cgmath::Rad<f32>>>(
        width: u32,
        height: u32,
        fovy: F,
        znear: f32,
        zfar: f32,
    ) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> cgmath::Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// The camera data as it is laid out in the uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates orbit input between frames and applies it once per frame.
///
/// Mouse deltas and wheel ticks arrive at event rate; they are summed here
/// and consumed by [`update`](Self::update) during the redraw so the camera
/// moves at most once per frame regardless of input frequency.
#[derive(Debug)]
pub struct OrbitController {
    rotate_speed: f32,
    zoom_speed: f32,
    pan_speed: f32,
    rotate_delta: (f32, f32),
    pan_delta: (f32, f32),
    scroll_delta: f32,
    /// Keep orbiting slowly while no drag input arrives.
    pub auto_rotate: bool,
}

impl OrbitController {
    const AUTO_ROTATE_RATE: f32 = 0.25; // radians per second

    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.0015,
            rotate_delta: (0.0, 0.0),
            pan_delta: (0.0, 0.0),
            scroll_delta: 0.0,
            auto_rotate: true,
        }
    }

    /// Accumulate a rotation drag (mouse motion while the rotate button is held).
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.rotate_delta.0 += dx as f32;
        self.rotate_delta.1 += dy as f32;
    }

    /// Accumulate a pan drag (mouse motion while the pan button is held).
    pub fn handle_pan(&mut self, dx: f64, dy: f64) {
        self.pan_delta.0 += dx as f32;
        self.pan_delta.1 += dy as f32;
    }

    /// Route window events the controller cares about (currently the wheel).
    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            self.scroll_delta += match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 60.0,
            };
        }
    }

    /// Apply the accumulated input to `camera` and reset the accumulators.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        let idle = self.rotate_delta == (0.0, 0.0)
            && self.pan_delta == (0.0, 0.0)
            && self.scroll_delta == 0.0;
        let (rot_x, rot_y) = self.rotate_delta;
        if idle && self.auto_rotate {
            camera.yaw += cgmath::Rad(Self::AUTO_ROTATE_RATE * dt.as_secs_f32());
        } else {
            camera.yaw += cgmath::Rad(rot_x * self.rotate_speed);
            camera.pitch += cgmath::Rad(rot_y * self.rotate_speed);
            camera.pitch.0 = camera.pitch.0.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.rotate_delta = (0.0, 0.0);

        // Exponential zoom so a wheel tick feels the same near and far.
        if self.scroll_delta != 0.0 {
            camera.distance = (camera.distance * (1.0 - self.scroll_delta * self.zoom_speed))
                .clamp(MIN_DISTANCE, MAX_DISTANCE);
            self.scroll_delta = 0.0;
        }

        // Pan moves the focal target in the camera's screen plane.
        let (pan_x, pan_y) = self.pan_delta;
        if pan_x != 0.0 || pan_y != 0.0 {
            let (sin_yaw, cos_yaw) = camera.yaw.0.sin_cos();
            let right = cgmath::Vector3::new(-sin_yaw, 0.0, cos_yaw);
            let up = cgmath::Vector3::unit_y();
            let scale = camera.distance * self.pan_speed;
            camera.target += (right * pan_x + up * pan_y) * scale;
            self.pan_delta = (0.0, 0.0);
        }
    }
}

/// GPU-side camera state: the camera itself plus its uniform buffer and bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

pub fn camera_bind_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

pub fn mk_camera_resources(
    device: &wgpu::Device,
    camera: Camera,
    controller: OrbitController,
    projection: &Projection,
) -> CameraResources {
    let mut uniform = CameraUniform::new();
    uniform.update_view_proj(&camera, projection);

    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Camera Buffer"),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let bind_group_layout = camera_bind_layout(device);
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some("camera_bind_group"),
    });

    CameraResources {
        camera,
        controller,
        uniform,
        buffer,
        bind_group,
        bind_group_layout,
    }
}
