//! Core resource definitions
//!
//! Plain data structures shared by the loaders, the writer and the renderer,
//! independent of any GPU implementation:
//! - Vertex / Mesh: flat triangle-list geometry with per-vertex material ids
//! - Material: quantised PBR parameters and texture slot indices
//! - Image: decoded pixel data

pub mod mesh;
pub mod material;
pub mod image;
pub mod primitives;

pub use mesh::{Mesh, Vertex};
pub use material::{Material, TextureSlot};
pub use image::Image;
