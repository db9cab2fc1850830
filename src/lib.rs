#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod assets;
pub mod errors;
pub mod resources;
pub mod settings;

pub use assets::{AssetReader, FileAssetReader, LevelAssets, write_assets_to_gltf};
#[cfg(feature = "gltf")]
pub use assets::load_assets_from_gltf;
#[cfg(feature = "obj")]
pub use assets::load_static_scene;
pub use errors::{Result, TesseraError};
pub use resources::primitives::*;
pub use resources::{Image, Material, Mesh, TextureSlot, Vertex};
pub use settings::{ExportSettings, ImportSettings};
