//! Definitions for the viewer's render pipelines.

pub mod cube;
