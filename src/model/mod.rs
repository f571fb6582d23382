//! In-memory representation of a rigged base mesh.
//!
//! A [`BaseMesh`] is only ever produced by the document builder in
//! [`crate::parse::base_mesh_xml`]; once built it is read-only. All derived
//! views (flat vertex buffers, triangles, dense weights) are recomputed on
//! every call and owned by the caller. Named collections keep the order in
//! which the document declared them.

pub mod named;
pub mod rig;
pub mod sizing;
pub mod weights;

pub use named::NamedMap;
pub use rig::Bone;
pub use sizing::SizingParameter;
pub use weights::{WeightLayer, WeightMap, WeightRangeError};

/// Position in document units, `[x, y, z]`.
pub type Vector3 = [f64; 3];

/// Index into the vertex list; shared by faces and weight maps.
pub type VertexIndex = u32;

pub const DEFAULT_VERSION: &str = "1.0";
pub const DEFAULT_UNIT: &str = "meters";

#[derive(Debug, Clone, PartialEq)]
pub struct BaseMesh {
    name: String,
    version: String,
    metadata: NamedMap<String>,
    vertices: Vec<Vector3>,
    faces: Vec<Vec<VertexIndex>>,
    bones: NamedMap<Bone>,
    weight_layers: NamedMap<WeightLayer>,
    sizing: NamedMap<SizingParameter>,
    unit: String,
}

/// Validated pieces handed over by the builder in one go.
#[derive(Debug, Default)]
pub(crate) struct BaseMeshParts {
    pub name: String,
    pub version: String,
    pub metadata: NamedMap<String>,
    pub vertices: Vec<Vector3>,
    pub faces: Vec<Vec<VertexIndex>>,
    pub bones: NamedMap<Bone>,
    pub weight_layers: NamedMap<WeightLayer>,
    pub sizing: NamedMap<SizingParameter>,
    pub unit: String,
}

impl BaseMesh {
    pub(crate) fn from_parts(parts: BaseMeshParts) -> Self {
        let BaseMeshParts {
            name,
            version,
            metadata,
            vertices,
            faces,
            bones,
            weight_layers,
            sizing,
            unit,
        } = parts;
        Self {
            name,
            version,
            metadata,
            vertices,
            faces,
            bones,
            weight_layers,
            sizing,
            unit,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Linear unit of all positions (`"meters"` unless the document says otherwise).
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    #[must_use]
    pub fn metadata(&self) -> &NamedMap<String> {
        &self.metadata
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vector3] {
        &self.vertices
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Polygonal faces exactly as authored.
    #[must_use]
    pub fn faces(&self) -> &[Vec<VertexIndex>] {
        &self.faces
    }

    #[must_use]
    pub fn bones(&self) -> &NamedMap<Bone> {
        &self.bones
    }

    #[must_use]
    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.get(name)
    }

    /// Bones without a parent, in document order.
    pub fn root_bones(&self) -> impl Iterator<Item = &Bone> {
        self.bones.values().filter(|bone| bone.parent.is_none())
    }

    /// Direct children of `name`, in document order.
    ///
    /// Parent references are not validated, so a bone may name a parent that
    /// does not exist; such bones are simply never returned here.
    pub fn children_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Bone> {
        self.bones
            .values()
            .filter(move |bone| bone.parent.as_deref() == Some(name))
    }

    #[must_use]
    pub fn weight_layers(&self) -> &NamedMap<WeightLayer> {
        &self.weight_layers
    }

    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&WeightLayer> {
        self.weight_layers.get(name)
    }

    #[must_use]
    pub fn sizing(&self) -> &NamedMap<SizingParameter> {
        &self.sizing
    }

    #[must_use]
    pub fn sizing_parameter(&self, name: &str) -> Option<&SizingParameter> {
        self.sizing.get(name)
    }

    /// Returns the vertex list as a packed buffer: `[x0, y0, z0, x1, y1, z1, ...]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn vertex_array(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|vertex| vertex.iter().map(|&component| component as f32))
            .collect()
    }

    /// Fan-triangulates every face from its first vertex.
    pub fn triangulate(&self) -> impl Iterator<Item = [VertexIndex; 3]> + '_ {
        self.faces.iter().flat_map(|face| fan_triangles(face))
    }

    #[must_use]
    pub fn triangle_indices(&self) -> Vec<[VertexIndex; 3]> {
        self.triangulate().collect()
    }
}

/// `[v0, v1, ..., vk]` becomes `(v0, v1, v2), (v0, v2, v3), ...`; faces with
/// fewer than three vertices yield nothing.
pub fn fan_triangles(face: &[VertexIndex]) -> impl Iterator<Item = [VertexIndex; 3]> + '_ {
    let anchor = face.first().copied();
    face.windows(2)
        .skip(1)
        .filter_map(move |pair| anchor.map(|v0| [v0, pair[0], pair[1]]))
}
