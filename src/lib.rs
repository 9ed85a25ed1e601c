//! Shadelab - interactive viewer for comparing shading models and light setups.
//!
//! The library holds everything that does not need a window: the shape catalog,
//! material and light resolution, texture and model loading, upload validation
//! and the scene assembler that ties them together. The binary adds the winit
//! shell, the egui controls and the preview renderer.

pub mod assets;
pub mod blobs;
pub mod color;
pub mod config;
pub mod geometry;
pub mod jobs;
pub mod lighting;
pub mod scene;
pub mod session;
pub mod shapes;
pub mod textures;
pub mod upload;
