//! Geometry extraction
//!
//! Turns one primitive's accessors into a [`Mesh`]. This is the ingestion
//! boundary: anything outside the supported subset (non-triangle topology,
//! missing or mistyped positions/normals, mismatched counts) is reported as a
//! structural error instead of being patched up.

use glam::Vec2;

use crate::assets::accessor::{BufferSet, ComponentType, DataAccess, Dimensions, IndexData, PrimitiveDesc, Topology};
use crate::errors::{Result, TesseraError};
use crate::resources::{Mesh, Vertex};
use crate::settings::ImportSettings;

pub const POSITION: &str = "POSITION";
pub const NORMAL: &str = "NORMAL";
pub const TEXCOORD_0: &str = "TEXCOORD_0";

/// Resolved accessors of one primitive.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveAccess<'a> {
    pub mode: Topology,
    pub positions: Option<DataAccess<'a>>,
    pub normals: Option<DataAccess<'a>>,
    pub texcoords: Option<DataAccess<'a>>,
    pub indices: Option<DataAccess<'a>>,
}

impl<'a> PrimitiveAccess<'a> {
    pub fn resolve(buffers: &BufferSet<'a>, primitive: &PrimitiveDesc) -> Result<Self> {
        let indices = match primitive.indices {
            Some(index) => buffers.access(index)?,
            None => None,
        };
        Ok(Self {
            mode: primitive.mode,
            positions: buffers.access_attribute(primitive, POSITION)?,
            normals: buffers.access_attribute(primitive, NORMAL)?,
            texcoords: buffers.access_attribute(primitive, TEXCOORD_0)?,
            indices,
        })
    }
}

fn require_format<'a>(
    access: Option<DataAccess<'a>>,
    attribute: &'static str,
    expected: &'static str,
    dimensions: Dimensions,
) -> Result<DataAccess<'a>> {
    let access = access.ok_or(TesseraError::MissingAttribute(attribute))?;
    if !access.is(ComponentType::F32, dimensions) {
        return Err(TesseraError::AttributeFormat {
            attribute,
            expected,
            found: access.format_name(),
        });
    }
    Ok(access)
}

/// Builds a mesh from `primitive`, assigning `material_index` to every vertex.
pub fn extract_mesh(primitive: &PrimitiveAccess<'_>, material_index: u32, settings: &ImportSettings) -> Result<Mesh> {
    if primitive.mode != Topology::Triangles {
        return Err(TesseraError::UnsupportedTopology(primitive.mode));
    }

    let indices: IndexData<'_> = primitive
        .indices
        .ok_or(TesseraError::MissingAttribute("indices"))?
        .as_indices()?;

    let positions = require_format(primitive.positions, POSITION, "F32 VEC3", Dimensions::Vec3)?;
    let normals = require_format(primitive.normals, NORMAL, "F32 VEC3", Dimensions::Vec3)?;
    if normals.count != positions.count {
        return Err(TesseraError::AttributeCountMismatch {
            attribute: NORMAL,
            expected: positions.count,
            found: normals.count,
        });
    }

    let texcoords = match primitive.texcoords {
        Some(access) => {
            let access = require_format(Some(access), TEXCOORD_0, "F32 VEC2", Dimensions::Vec2)?;
            if access.count != positions.count {
                return Err(TesseraError::AttributeCountMismatch {
                    attribute: TEXCOORD_0,
                    expected: positions.count,
                    found: access.count,
                });
            }
            Some(access)
        }
        None if settings.require_texcoords => return Err(TesseraError::MissingAttribute(TEXCOORD_0)),
        None => None,
    };

    let vertices: Vec<Vertex> = (0..positions.count)
        .map(|i| {
            let mut texcoord = texcoords.map_or(Vec2::ZERO, |t| t.vec2(i));
            if settings.flip_uvs {
                texcoord.y = 1.0 - texcoord.y;
            }
            Vertex::new(positions.vec3(i), normals.vec3(i), texcoord)
        })
        .collect();

    let mesh = Mesh {
        material_indices: vec![material_index; vertices.len()],
        vertices,
        indices: indices.to_u32(),
    };
    mesh.validate()?;
    Ok(mesh)
}
