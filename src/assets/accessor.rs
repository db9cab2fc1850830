//! Typed Buffer Access
//!
//! Resolves an accessor → buffer view → buffer chain into a typed view over
//! raw bytes. The descriptors mirror the glTF data layout but are independent
//! of any parser, so the geometry extractor can be fed from other sources and
//! exercised directly in tests.
//!
//! Only tightly packed data is supported: a buffer view stride must be zero
//! (absent) or equal to the element size. Anything else is rejected rather
//! than silently producing corrupt geometry.

use bytemuck::Pod;
use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;

use crate::errors::{Result, TesseraError};

// ============================================================================
// Component Layout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    #[inline]
    #[must_use]
    pub const fn byte_size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }

    /// Maps an OpenGL component type enum (as stored in glTF) to a type.
    #[must_use]
    pub const fn from_gl(code: u32) -> Option<Self> {
        match code {
            5120 => Some(Self::I8),
            5121 => Some(Self::U8),
            5122 => Some(Self::I16),
            5123 => Some(Self::U16),
            5125 => Some(Self::U32),
            5126 => Some(Self::F32),
            _ => None,
        }
    }

    #[must_use]
    pub const fn gl_code(self) -> u32 {
        match self {
            Self::I8 => 5120,
            Self::U8 => 5121,
            Self::I16 => 5122,
            Self::U16 => 5123,
            Self::U32 => 5125,
            Self::F32 => 5126,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimensions {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl Dimensions {
    /// Number of components per element.
    #[inline]
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat2 => "MAT2",
            Self::Mat3 => "MAT3",
            Self::Mat4 => "MAT4",
        }
    }
}

/// Primitive topology. Only [`Topology::Triangles`] is accepted by the
/// geometry extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

// ============================================================================
// Descriptors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorDesc {
    pub buffer_view: Option<usize>,
    pub byte_offset: usize,
    pub count: usize,
    pub component_type: ComponentType,
    pub dimensions: Dimensions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferViewDesc {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    /// `None` or `Some(0)` means tightly packed.
    pub byte_stride: Option<usize>,
}

/// One primitive: named vertex attributes plus an index accessor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimitiveDesc {
    pub mode: Topology,
    pub attributes: FxHashMap<String, usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
}

impl PrimitiveDesc {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<usize> {
        self.attributes.get(name).copied()
    }
}

// ============================================================================
// DataAccess
// ============================================================================

/// Typed view over the bytes of one accessor.
#[derive(Debug, Clone, Copy)]
pub struct DataAccess<'a> {
    bytes: &'a [u8],
    pub count: usize,
    pub component_type: ComponentType,
    pub dimensions: Dimensions,
}

impl<'a> DataAccess<'a> {
    #[inline]
    #[must_use]
    pub fn element_size(&self) -> usize {
        self.dimensions.count() * self.component_type.byte_size()
    }

    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline]
    #[must_use]
    pub fn is(&self, component_type: ComponentType, dimensions: Dimensions) -> bool {
        self.component_type == component_type && self.dimensions == dimensions
    }

    #[must_use]
    pub fn format_name(&self) -> String {
        format!("{:?} {}", self.component_type, self.dimensions.as_str())
    }

    /// Reads element `index` as `T`. `T` must match the element size.
    #[inline]
    #[must_use]
    pub fn read<T: Pod>(&self, index: usize) -> T {
        let size = std::mem::size_of::<T>();
        debug_assert_eq!(size, self.element_size());
        let start = index * size;
        bytemuck::pod_read_unaligned(&self.bytes[start..start + size])
    }

    #[inline]
    #[must_use]
    pub fn vec3(&self, index: usize) -> Vec3 {
        Vec3::from_array(self.read::<[f32; 3]>(index))
    }

    #[inline]
    #[must_use]
    pub fn vec2(&self, index: usize) -> Vec2 {
        Vec2::from_array(self.read::<[f32; 2]>(index))
    }

    /// Interprets this accessor as an index buffer.
    pub fn as_indices(self) -> Result<IndexData<'a>> {
        if self.dimensions != Dimensions::Scalar {
            return Err(TesseraError::AttributeFormat {
                attribute: "indices",
                expected: "U16 or U32 SCALAR",
                found: self.format_name(),
            });
        }
        match self.component_type {
            ComponentType::U16 => Ok(IndexData::U16(self)),
            ComponentType::U32 => Ok(IndexData::U32(self)),
            other => Err(TesseraError::UnsupportedIndexType(other)),
        }
    }
}

/// Index buffer of either supported width.
#[derive(Debug, Clone, Copy)]
pub enum IndexData<'a> {
    U16(DataAccess<'a>),
    U32(DataAccess<'a>),
}

impl IndexData<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::U16(a) | Self::U32(a) => a.count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Canonical u32 indices. 16-bit data is widened element by element.
    #[must_use]
    pub fn to_u32(&self) -> Vec<u32> {
        match self {
            Self::U16(a) => a
                .bytes()
                .chunks_exact(2)
                .map(|b| u32::from(u16::from_le_bytes([b[0], b[1]])))
                .collect(),
            Self::U32(a) => a
                .bytes()
                .chunks_exact(4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        }
    }
}

// ============================================================================
// BufferSet
// ============================================================================

/// Accessor, buffer view and buffer tables of one loaded scene file.
#[derive(Debug, Clone, Default)]
pub struct BufferSet<'a> {
    pub accessors: Vec<AccessorDesc>,
    pub views: Vec<BufferViewDesc>,
    pub buffers: Vec<&'a [u8]>,
}

impl<'a> BufferSet<'a> {
    #[must_use]
    pub fn new(accessors: Vec<AccessorDesc>, views: Vec<BufferViewDesc>, buffers: Vec<&'a [u8]>) -> Self {
        Self { accessors, views, buffers }
    }

    /// Resolves accessor `index`.
    ///
    /// Returns `Ok(None)` when the accessor, its buffer view or its buffer
    /// does not exist. Fails when the view is strided or the accessor reads
    /// past the end of its data.
    pub fn access(&self, index: usize) -> Result<Option<DataAccess<'a>>> {
        let Some(accessor) = self.accessors.get(index) else {
            return Ok(None);
        };
        let Some(view) = accessor.buffer_view.and_then(|v| self.views.get(v)) else {
            return Ok(None);
        };
        let Some(&buffer) = self.buffers.get(view.buffer) else {
            return Ok(None);
        };

        let element_size = accessor.dimensions.count() * accessor.component_type.byte_size();
        if let Some(stride) = view.byte_stride.filter(|&s| s != 0 && s != element_size) {
            return Err(TesseraError::UnsupportedStride { accessor: index, stride, element_size });
        }

        let offset = view.byte_offset.saturating_add(accessor.byte_offset);
        let required = accessor.count.saturating_mul(element_size);
        let view_end = view.byte_offset.saturating_add(view.byte_length);
        let available = buffer.len().min(view_end);
        let end = offset.checked_add(required).filter(|&end| end <= available);
        let Some(end) = end else {
            return Err(TesseraError::AccessorOutOfBounds { accessor: index, offset, required, available });
        };

        Ok(Some(DataAccess {
            bytes: &buffer[offset..end],
            count: accessor.count,
            component_type: accessor.component_type,
            dimensions: accessor.dimensions,
        }))
    }

    /// Resolves a named attribute of `primitive`. An absent attribute yields
    /// `Ok(None)`.
    pub fn access_attribute(&self, primitive: &PrimitiveDesc, name: &str) -> Result<Option<DataAccess<'a>>> {
        match primitive.attribute(name) {
            Some(index) => self.access(index),
            None => Ok(None),
        }
    }
}
