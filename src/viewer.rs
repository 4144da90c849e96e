//! The viewer component and its event loop.
//!
//! This module wires the single component of the crate: a viewer that owns
//! the GPU context, the instanced cube field and the orbit camera, and runs
//! a perpetual redraw-driven loop. On startup it kicks off one-shot async
//! loads for the model and the atlas image; their results arrive back in the
//! event loop as [`ViewerEvent`]s.
//!
//! # Lifecycle
//!
//! The event loop follows this pattern each frame:
//! 1. Collect window/device events and route drags/wheel to the orbit controller
//! 2. Render the current frame (clear + instanced cube draw)
//! 3. Apply accumulated orbit input and rewrite the camera uniform
//! 4. Step every instance toward its target and rewrite the instance buffer
//! 5. Request the next redraw

use std::{fmt::Debug, iter, sync::Arc};

#[cfg(feature = "integration-tests")]
use instant::Duration;
use instant::Instant;

#[cfg(feature = "integration-tests")]
use tokio::runtime::Runtime;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, InitContext, MouseButtonState},
    data_structures::{
        atlas::AtlasLayout,
        cube_field::CubeField,
        model::DrawModel,
        texture::Texture,
    },
    resources,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Everything the viewer needs to know up front: the fixed asset paths and
/// the numeric knobs of the per-frame interpolation.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// glTF/GLB asset whose nodes supply the cube positions.
    pub model_file: String,
    /// Atlas image the cube faces sample from.
    pub atlas_file: String,
    /// Tile grid of the atlas image.
    pub atlas: AtlasLayout,
    /// Factor applied to each source position to derive its target.
    pub spread: f32,
    /// Edge length each cube grows toward.
    pub cube_scale: f32,
    /// Fraction of the remaining distance covered per second.
    pub approach_rate: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model_file: "scene.glb".to_string(),
            atlas_file: "atlas.png".to_string(),
            atlas: AtlasLayout::default(),
            spread: 2.5,
            cube_scale: 1.0,
            approach_rate: 3.0,
        }
    }
}

#[cfg(feature = "integration-tests")]
pub enum FrameProbeResult {
    Passed,
    Waiting,
}

/// Per-frame validation hook for golden-image style tests: receives the
/// rendered frame and decides whether the run may stop.
#[cfg(feature = "integration-tests")]
pub type FrameProbe = Box<
    dyn FnMut(
        &Context,
        u32,
        &image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<FrameProbeResult, anyhow::Error>,
>;

/// User events delivered back into the winit loop.
pub enum ViewerEvent {
    /// WASM initialization handoff: the context is built in a spawned future
    /// and sent here once ready.
    #[allow(dead_code)]
    Initialized(AppState),
    /// The model finished loading; payload is one position per scene node.
    ModelLoaded(Vec<cgmath::Vector3<f32>>),
    /// The atlas image finished loading and is already uploaded to the GPU.
    AtlasLoaded(Texture),
    #[allow(dead_code)]
    Exit,
}

impl Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized(AppState)"),
            Self::ModelLoaded(positions) => f
                .debug_tuple("ModelLoaded")
                .field(&positions.len())
                .finish(),
            Self::AtlasLoaded(_) => f.write_str("AtlasLoaded(Texture)"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

/// Application state bundle: GPU context, cube field, and surface status.
pub struct AppState {
    pub(crate) ctx: Context,
    cubes: CubeField,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &ViewerConfig) -> Self {
        let ctx = Context::new(window).await;
        let ctx = match ctx {
            Ok(ctx) => ctx,
            Err(e) => panic!(
                "App initialization failed. Cannot create the main context: {}",
                e
            ),
        };
        let cubes = CubeField::new(&ctx.device, &ctx.queue, config.atlas, config.approach_rate);
        let is_surface_configured = false;
        Self {
            ctx,
            cubes,
            is_surface_configured,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_texture(&self, extent3d: wgpu::Extent3d) -> wgpu::Texture {
        self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Probe Output Texture"),
            size: extent3d,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.ctx.config.format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_depth_texture(&self, extent3d: wgpu::Extent3d) -> wgpu::Texture {
        self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Probe Depth Texture"),
            size: extent3d,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    #[cfg(feature = "integration-tests")]
    fn get_width_height(&self) -> (u32, u32) {
        // The img lib requires divisibility of 256...
        let width = self.ctx.config.width;
        let height = self.ctx.config.height;
        let width = width + (256 - (width % 256));
        let height = height + (256 - (height % 256));
        (width, height)
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_3d_extent(&self) -> wgpu::Extent3d {
        let (width, height) = self.get_width_height();
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    fn render(
        &mut self,
        #[cfg(feature = "integration-tests")] probe: &mut Option<FrameProbe>,
        #[cfg(feature = "integration-tests")] frame: u32,
        #[cfg(feature = "integration-tests")] async_runtime: &Runtime,
        #[cfg(feature = "integration-tests")] event_loop: &winit::event_loop::EventLoopProxy<
            ViewerEvent,
        >,
    ) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        #[cfg(not(feature = "integration-tests"))]
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        #[cfg(feature = "integration-tests")]
        let (tex, depth) = {
            let extent3d = self.get_test_3d_extent();
            let tex = self.get_test_texture(extent3d);
            let depth = self.get_test_depth_texture(extent3d);
            (tex, depth)
        };

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        #[cfg(feature = "integration-tests")]
                        view: &tex.create_view(&wgpu::TextureViewDescriptor::default()),
                        #[cfg(not(feature = "integration-tests"))]
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        #[cfg(feature = "integration-tests")]
                        view: &depth.create_view(&wgpu::TextureViewDescriptor::default()),
                        #[cfg(not(feature = "integration-tests"))]
                        view: &self.ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

            // Actual rendering: a single instanced draw, skipped while the
            // asset load has not delivered any positions yet.
            if !self.cubes.is_empty() {
                render_pass.set_pipeline(&self.ctx.cube_pipeline);
                render_pass.set_vertex_buffer(1, self.cubes.instance_buffer.slice(..));
                render_pass.draw_model_instanced(
                    &self.cubes.model,
                    0..self.cubes.len() as u32,
                    &self.ctx.camera.bind_group,
                );
            }
        }

        #[cfg(feature = "integration-tests")]
        let output_buffer = {
            let u32_size = std::mem::size_of::<u32>() as u32;
            let (width, height) = self.get_width_height();
            let output_buffer_size = (u32_size * width * height) as wgpu::BufferAddress;
            let output_buffer_desc = wgpu::BufferDescriptor {
                size: output_buffer_size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                label: None,
                mapped_at_creation: false,
            };
            let output_buffer = self.ctx.device.create_buffer(&output_buffer_desc);
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &tex,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: &output_buffer,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(u32_size * width),
                        rows_per_image: Some(height),
                    },
                },
                self.get_test_3d_extent(),
            );
            output_buffer
        };

        self.ctx.queue.submit(iter::once(encoder.finish()));

        #[cfg(feature = "integration-tests")]
        {
            let fut_img = async {
                let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
                let buffer_slice = output_buffer.slice(..);
                buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
                    tx.send(result).unwrap();
                });
                self.ctx
                    .device
                    .poll(wgpu::PollType::Wait {
                        submission_index: None,
                        timeout: Some(Duration::from_secs(3)),
                    })
                    .unwrap();
                rx.receive().await.unwrap().unwrap();
                let data = buffer_slice.get_mapped_range();
                let (width, height) = self.get_width_height();
                image::ImageBuffer::<image::Rgba<u8>, _>::from_raw(width, height, data).unwrap()
            };
            let img: image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView> =
                async_runtime.block_on(fut_img);
            if let Some(probe) = probe {
                match probe(&self.ctx, frame, &img) {
                    Err(e) => panic!("{}", e),
                    Ok(FrameProbeResult::Passed) => {
                        event_loop
                            .send_event(ViewerEvent::Exit)
                            .expect("Probe passed but the winit event-loop could not safely exit");
                    }
                    Ok(FrameProbeResult::Waiting) => (),
                }
            }
        }

        output.present();
        Ok(())
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<ViewerEvent>,
    state: Option<AppState>,
    config: ViewerConfig,
    last_time: Instant,
    #[cfg(feature = "integration-tests")]
    probe: Option<FrameProbe>,
    #[cfg(feature = "integration-tests")]
    frame: u32,
}

impl App {
    fn new(
        event_loop: &EventLoop<ViewerEvent>,
        config: ViewerConfig,
        #[cfg(feature = "integration-tests")] probe: Option<FrameProbe>,
    ) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().unwrap();
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            config,
            last_time: Instant::now(),
            #[cfg(feature = "integration-tests")]
            probe,
            #[cfg(feature = "integration-tests")]
            frame: 0,
        }
    }

    /// Kick off the one-shot model and atlas loads.
    ///
    /// Each load sends exactly one event on success; a failure is logged and
    /// absorbed, leaving the field unpopulated / the placeholder bound.
    fn spawn_asset_loads(&self, init: InitContext) {
        let config = self.config.clone();
        let proxy = self.proxy.clone();
        let load = async move {
            let model = resources::load_node_positions(&config.model_file);
            let atlas =
                resources::texture::load_texture(&config.atlas_file, &init.device, &init.queue, None);
            let (model, atlas) = futures::join!(model, atlas);
            match model {
                Ok(positions) => {
                    if let Err(e) = proxy.send_event(ViewerEvent::ModelLoaded(positions)) {
                        log::error!("{}", e);
                    }
                }
                Err(e) => log::error!("failed to load model {}: {}", config.model_file, e),
            }
            match atlas {
                Ok(texture) => {
                    if let Err(e) = proxy.send_event(ViewerEvent::AtlasLoaded(texture)) {
                        log::error!("{}", e);
                    }
                }
                Err(e) => log::error!("failed to load atlas {}: {}", config.atlas_file, e),
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(load);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(load);
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let config = self.config.clone();
            let state = self
                .async_runtime
                .block_on(AppState::new(window, &config));
            self.spawn_asset_loads((&state.ctx).into());
            self.state = Some(state);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            let config = self.config.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = AppState::new(window, &config).await;
                assert!(proxy.send_event(ViewerEvent::Initialized(state)).is_ok());
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                self.state = Some(state);

                // Important: Trigger a resize and redraw now that we are initialized
                let state = self.state.as_mut().unwrap();
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                let init: InitContext = (&state.ctx).into();
                state.ctx.window.request_redraw();
                self.spawn_asset_loads(init);
            }
            ViewerEvent::ModelLoaded(positions) => {
                if let Some(state) = &mut self.state {
                    state
                        .cubes
                        .populate(positions, self.config.spread, self.config.cube_scale);
                }
            }
            ViewerEvent::AtlasLoaded(texture) => {
                if let Some(state) = &mut self.state {
                    state.cubes.set_atlas(&state.ctx.device, texture);
                }
            }
            ViewerEvent::Exit => {
                event_loop.exit();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            match state.ctx.mouse.pressed {
                MouseButtonState::Left => {
                    state.ctx.camera.controller.handle_mouse(dx, dy);
                }
                MouseButtonState::Right => {
                    state.ctx.camera.controller.handle_pan(dx, dy);
                }
                MouseButtonState::None => (),
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        // general stuff
        state.ctx.camera.controller.handle_window_events(&event);

        if let WindowEvent::CursorMoved {
            device_id: _,
            position,
        } = event
        {
            state.ctx.mouse.coords = position;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                #[cfg(feature = "integration-tests")]
                {
                    self.frame += 1;
                }

                match state.render(
                    #[cfg(feature = "integration-tests")]
                    &mut self.probe,
                    #[cfg(feature = "integration-tests")]
                    self.frame,
                    #[cfg(feature = "integration-tests")]
                    &self.async_runtime,
                    #[cfg(feature = "integration-tests")]
                    &self.proxy,
                ) {
                    Ok(_) => {
                        // Update the camera
                        state
                            .ctx
                            .camera
                            .controller
                            .update(&mut state.ctx.camera.camera, dt);
                        state
                            .ctx
                            .camera
                            .uniform
                            .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
                        state.ctx.queue.write_buffer(
                            &state.ctx.camera.buffer,
                            0,
                            bytemuck::cast_slice(&[state.ctx.camera.uniform]),
                        );
                        // Update the cube field
                        state.cubes.step(dt);
                        state.cubes.write_to_buffer(&state.ctx.queue, &state.ctx.device);
                    }
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                state.ctx.mouse.pressed = match (button, button_state.is_pressed()) {
                    (MouseButton::Left, true) => MouseButtonState::Left,
                    (MouseButton::Right, true) => MouseButtonState::Right,
                    _ => MouseButtonState::None,
                };
            }
            _ => {}
        }
    }
}

fn mk_event_loop() -> anyhow::Result<EventLoop<ViewerEvent>> {
    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<ViewerEvent> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()?
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<ViewerEvent> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()?
    };

    #[cfg(not(feature = "integration-tests"))]
    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;

    Ok(event_loop)
}

fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }
}

pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    init_logging();

    let event_loop = mk_event_loop()?;
    let mut app = App::new(
        &event_loop,
        config,
        #[cfg(feature = "integration-tests")]
        None,
    );

    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Like [`run`], but validates every rendered frame with `probe` and exits
/// once the probe reports `Passed`.
#[cfg(feature = "integration-tests")]
pub fn run_with_probe(config: ViewerConfig, probe: FrameProbe) -> anyhow::Result<()> {
    init_logging();

    let event_loop = mk_event_loop()?;
    let mut app = App::new(&event_loop, config, Some(probe));

    event_loop.run_app(&mut app)?;

    Ok(())
}
