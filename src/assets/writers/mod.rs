pub mod components;
pub mod gltf;

pub use self::components::{MeshComponent, split};
pub use self::gltf::write_assets_to_gltf;
