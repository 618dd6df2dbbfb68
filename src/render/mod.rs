//! GPU rendering
//!
//! The scene draws into an HDR offscreen target; `tree` holds the
//! foliage/ornament/card pipelines, `post` turns the HDR image into the
//! presented frame (bloom + vignette).

pub mod mesh;
pub mod post;
pub mod tree;

/// Offscreen scene target format
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Scene depth format
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
