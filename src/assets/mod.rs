//! Level asset pipeline
//!
//! Loading goes source file → [`accessor`] / [`scene_graph`] → [`geometry`] →
//! [`LevelAssets`], with textures and materials deduplicated on the way in.
//! Exporting goes [`LevelAssets`] → [`writers::components`] →
//! [`writers::gltf`].

pub mod accessor;
pub mod dedup;
pub mod geometry;
pub mod io;
pub mod level;
pub mod loaders;
pub mod scene_graph;
pub mod writers;

pub use accessor::{AccessorDesc, BufferSet, BufferViewDesc, ComponentType, DataAccess, Dimensions, IndexData, PrimitiveDesc, Topology};
pub use dedup::combined_source_key;
pub use geometry::{PrimitiveAccess, extract_mesh};
pub use io::{AssetReader, FileAssetReader, base_path_of, decode_image, save_image_png};
pub use level::{LevelAssets, PackedRoughnessMetallic};
pub use scene_graph::{ColorKey, ImportedMaterial, ImportedMesh, NodeTransform, SceneGraph, SceneNode, SceneWalker, TextureSemantic, load_scene_graph};
pub use writers::{MeshComponent, split, write_assets_to_gltf};

#[cfg(feature = "gltf")]
pub use loaders::load_assets_from_gltf;
#[cfg(feature = "obj")]
pub use loaders::{load_static_scene, read_obj_scene};
