#[cfg(feature = "gltf")]
pub mod gltf;
#[cfg(feature = "obj")]
pub mod obj;

#[cfg(feature = "gltf")]
pub use self::gltf::load_assets_from_gltf;
#[cfg(feature = "obj")]
pub use self::obj::{load_static_scene, read_obj_scene};
