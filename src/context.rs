use std::sync::Arc;

use winit::window::Window;

use crate::{
    camera::{self, CameraResources, OrbitController, Projection},
    data_structures::texture,
    pipelines::cube::mk_cube_pipeline,
};

/// Which mouse button is currently held, for routing drags to the orbit
/// controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButtonState {
    Left,
    Right,
    None,
}

#[derive(Debug)]
pub struct MouseState {
    pub coords: winit::dpi::PhysicalPosition<f64>,
    pub pressed: MouseButtonState,
}

impl Default for MouseState {
    fn default() -> Self {
        Self {
            coords: (0.0, 0.0).into(),
            pressed: MouseButtonState::None,
        }
    }
}

/// Device/queue handles passed into async loader tasks.
///
/// The clones leverage the internal Arcs of Device and Queue and thus only
/// clone the refs.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
        }
    }
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub clear_colour: wgpu::Color,
    pub mouse: MouseState,
    pub cube_pipeline: wgpu::RenderPipeline,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        log::info!("surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // The shader assumes an Srgb surface texture; using a different one
        // would make all colours come out darker.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        // The camera orbits the origin; yaw/pitch select the start of the orbit.
        let camera_start = camera::Camera::new(
            (0.0, 0.0, 0.0),
            cgmath::Deg(-90.0),
            cgmath::Deg(20.0),
            40.0,
        );
        let projection =
            Projection::new(config.width, config.height, cgmath::Deg(45.0), 0.1, 500.0);
        let controller = OrbitController::new(0.005, 0.1);

        let camera = camera::mk_camera_resources(&device, camera_start, controller, &projection);

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        let cube_pipeline = mk_cube_pipeline(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            clear_colour: wgpu::Color {
                r: 0.02,
                g: 0.02,
                b: 0.04,
                a: 1.0,
            },
            mouse: MouseState::default(),
            window,
            depth_texture,
            cube_pipeline,
        })
    }
}
