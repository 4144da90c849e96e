//! Viewer data structures: models, textures, instances and the cube field.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `atlas` contains the texture-atlas grid math and its uniform
//! - `instance` holds per-instance transformation and attribute data
//! - `cube_field` is the instanced cube population driven every frame

pub mod atlas;
pub mod cube_field;
pub mod instance;
pub mod model;
pub mod texture;
