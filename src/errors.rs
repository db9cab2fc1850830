//! Error Types
//!
//! This module defines the error type used throughout the asset pipeline.
//!
//! # Overview
//!
//! [`TesseraError`] distinguishes three kinds of failure:
//! - **Structural** violations: the input is outside the subset of the
//!   interchange formats this crate supports (wrong topology, missing or
//!   mistyped attributes, unsupported strides, triangles spanning two
//!   materials). These are contract violations; callers are not expected to
//!   recover from them. See [`TesseraError::is_structural`].
//! - **Per-resource** failures such as an image that cannot be decoded. The
//!   loaders absorb these: the affected texture slot is left empty and loading
//!   continues.
//! - **I/O and format** errors while reading or writing files.
//!
//! All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, TesseraError>`.

use thiserror::Error;

/// The main error type for the asset pipeline.
#[derive(Error, Debug)]
pub enum TesseraError {
    // ========================================================================
    // Structural Errors
    // ========================================================================
    /// A primitive uses a topology other than a triangle list.
    #[error("Unsupported primitive topology: {0:?} (only triangle lists are supported)")]
    UnsupportedTopology(crate::assets::accessor::Topology),

    /// A required vertex attribute or the index accessor is missing.
    #[error("Missing required attribute: {0}")]
    MissingAttribute(&'static str),

    /// An attribute exists but has the wrong component type or dimensions.
    #[error("Attribute {attribute} has format {found}, expected {expected}")]
    AttributeFormat {
        /// Attribute name (e.g. `POSITION`)
        attribute: &'static str,
        /// Expected format description
        expected: &'static str,
        /// Actual format description
        found: String,
    },

    /// Two per-vertex attributes disagree on the vertex count.
    #[error("Attribute count mismatch: {attribute} has {found} elements, expected {expected}")]
    AttributeCountMismatch {
        /// Attribute name
        attribute: &'static str,
        /// Vertex count implied by positions
        expected: usize,
        /// Element count of the attribute
        found: usize,
    },

    /// A buffer view declares padding between elements.
    #[error("Unsupported buffer view stride {stride} for accessor {accessor} (element size {element_size})")]
    UnsupportedStride {
        /// Accessor index
        accessor: usize,
        /// Declared byte stride
        stride: usize,
        /// Tightly packed element size
        element_size: usize,
    },

    /// An accessor addresses bytes outside its buffer.
    #[error("Accessor {accessor} reads {required} bytes past offset {offset}, buffer has {available}")]
    AccessorOutOfBounds {
        /// Accessor index
        accessor: usize,
        /// Absolute byte offset into the buffer
        offset: usize,
        /// Bytes the accessor needs
        required: usize,
        /// Buffer length
        available: usize,
    },

    /// The index buffer uses a component type other than u16 or u32.
    #[error("Unsupported index component type: {0:?}")]
    UnsupportedIndexType(crate::assets::accessor::ComponentType),

    /// A triangle references a vertex that does not exist.
    #[error("Vertex index {index} out of range (vertex count {vertex_count})")]
    IndexOutOfRange {
        /// Offending index value
        index: u32,
        /// Number of vertices in the mesh
        vertex_count: usize,
    },

    /// A face list is not a multiple of three indices.
    #[error("Index count {0} is not a multiple of 3")]
    MalformedTriangleList(usize),

    /// Separate roughness and metallic maps cannot be packed together.
    #[error("Cannot combine roughness map \"{roughness}\" and metallic map \"{metallic}\": {reason}")]
    MismatchedRoughnessMetallic {
        /// Roughness source key
        roughness: String,
        /// Metallic source key
        metallic: String,
        /// What did not match
        reason: String,
    },

    /// A triangle's three vertices do not share one material.
    #[error("Triangle {triangle} spans materials {materials:?}")]
    MixedMaterialTriangle {
        /// Triangle number within the index buffer
        triangle: usize,
        /// Material index of each corner
        materials: [u32; 3],
    },

    // ========================================================================
    // Per-Resource Errors
    // ========================================================================
    /// Image decoding or encoding error.
    #[error("Image error: {0}")]
    ImageError(String),

    /// Data URI parsing error.
    #[error("Data URI error: {0}")]
    DataUriError(String),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    // ========================================================================
    // I/O & Format Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// glTF parsing or loading error.
    #[cfg(feature = "gltf")]
    #[error("glTF error: {0}")]
    GltfError(String),

    /// OBJ/MTL parsing error.
    #[cfg(feature = "obj")]
    #[error("OBJ error: {0}")]
    ObjError(String),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TesseraError {
    /// Returns `true` for violations of the supported input subset.
    ///
    /// Structural errors indicate malformed or unsupported content rather
    /// than a transient condition; retrying or skipping the resource is not
    /// meaningful.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedTopology(_)
                | Self::MissingAttribute(_)
                | Self::AttributeFormat { .. }
                | Self::AttributeCountMismatch { .. }
                | Self::UnsupportedStride { .. }
                | Self::AccessorOutOfBounds { .. }
                | Self::UnsupportedIndexType(_)
                | Self::IndexOutOfRange { .. }
                | Self::MalformedTriangleList(_)
                | Self::MismatchedRoughnessMetallic { .. }
                | Self::MixedMaterialTriangle { .. }
        )
    }
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for TesseraError {
    fn from(err: image::ImageError) -> Self {
        TesseraError::ImageError(err.to_string())
    }
}

#[cfg(feature = "gltf")]
impl From<gltf::Error> for TesseraError {
    fn from(err: gltf::Error) -> Self {
        TesseraError::GltfError(err.to_string())
    }
}

#[cfg(feature = "obj")]
impl From<tobj::LoadError> for TesseraError {
    fn from(err: tobj::LoadError) -> Self {
        TesseraError::ObjError(err.to_string())
    }
}

/// Alias for `Result<T, TesseraError>`.
pub type Result<T> = std::result::Result<T, TesseraError>;
