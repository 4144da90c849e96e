//! cube-drift
//!
//! A lightweight, cross-platform viewer that renders an instanced field of
//! atlas-textured cubes around an orbiting camera. The cube positions are
//! derived from the nodes of an asynchronously loaded glTF asset; every frame
//! each instance drifts toward its target transform while the camera orbits
//! the scene. Runs natively and in the browser via WASM.
//!
//! High-level modules
//! - `camera`: orbit camera, controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipeline
//! - `data_structures`: viewer data models (meshes, instances, textures, atlas)
//! - `pipelines`: render pipeline construction for the cube field
//! - `resources`: helpers to load the model/atlas and create GPU resources
//! - `viewer`: the viewer component and its event loop
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod resources;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use winit::dpi::PhysicalPosition;
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
pub use wgpu::*;
