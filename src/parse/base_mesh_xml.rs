//! Parser voor base-mesh XML-bestanden.
//!
//! Het document beschrijft geometrie, rig, gewichtslagen en sizing-parameters
//! van een basismesh. De secties worden in vaste volgorde verwerkt: de
//! topologie eerst, omdat de gewichtslagen tegen het aantal vertices
//! gevalideerd worden.

use std::cmp::Ordering;
use std::path::Path;

use super::coerce::{coerce_float, coerce_int, parse_vector3, split_index_list};
use super::xml_tree::{XmlElement, parse_document};
use super::{ParseError, ParseResult};
use crate::model::rig::DEFAULT_INHERIT_SCALE;
use crate::model::weights::DEFAULT_LAYER_TYPE;
use crate::model::{
    BaseMesh, BaseMeshParts, Bone, DEFAULT_UNIT, DEFAULT_VERSION, NamedMap, SizingParameter,
    Vector3, VertexIndex, WeightLayer, WeightMap, WeightRangeError,
};

/// Tag van het root element.
pub const ROOT_TAG: &str = "BaseMesh";

/// Maximaal aantal ontbrekende vertex ids dat per `<Vertex>` wordt opgevuld.
pub const MAX_VERTEX_ID_GAP: usize = 65_536;

/// Leest een base-mesh document uit tekst.
///
/// `fallback_name` wordt gebruikt wanneer de root geen `name` attribuut heeft;
/// bij bestanden is dat de bestandsnaam zonder extensie.
pub fn parse_str(input: &str, fallback_name: &str) -> ParseResult<BaseMesh> {
    let root = parse_document(input)?;
    build_base_mesh(&root, fallback_name)
}

/// Leest een base-mesh document van schijf.
pub fn parse_file(path: &Path) -> ParseResult<BaseMesh> {
    let input = std::fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_str(&input, &stem)
}

/// Zet een ingelezen elementboom om naar een [`BaseMesh`].
pub fn build_base_mesh(root: &XmlElement, fallback_name: &str) -> ParseResult<BaseMesh> {
    if root.name() != ROOT_TAG {
        return Err(ParseError::InvalidRoot {
            found: root.name().to_owned(),
        });
    }

    let name = root
        .non_empty_attribute("name")
        .unwrap_or(fallback_name)
        .to_owned();
    let version = root
        .attribute("version")
        .unwrap_or(DEFAULT_VERSION)
        .to_owned();
    log::debug!("Start parsing base mesh '{name}' (versie {version})");

    let metadata = parse_metadata(root.child("Metadata"));

    let topology = root.child("Topology").ok_or(ParseError::MissingTopology)?;
    let unit = topology.attribute("unit").unwrap_or(DEFAULT_UNIT).to_owned();
    let vertices_node = topology.child("Vertices").ok_or(ParseError::MissingVertices)?;
    let vertices = parse_vertices(vertices_node)?;
    let faces = parse_faces(topology.child("Faces"), vertices.len())?;
    log::debug!("Found {} vertices, {} faces", vertices.len(), faces.len());

    let bones = parse_rig(root.child("Rig"))?;
    let weight_layers = parse_weight_layers(root.child("WeightLayers"), vertices.len())?;
    let sizing = parse_sizing(root.child("Sizing"))?;
    log::debug!(
        "Found {} bones, {} weight layers, {} sizing parameters",
        bones.len(),
        weight_layers.len(),
        sizing.len()
    );

    Ok(BaseMesh::from_parts(BaseMeshParts {
        name,
        version,
        metadata,
        vertices,
        faces,
        bones,
        weight_layers,
        sizing,
        unit,
    }))
}

fn parse_metadata(node: Option<&XmlElement>) -> NamedMap<String> {
    let mut metadata = NamedMap::new();
    let Some(node) = node else {
        return metadata;
    };
    for child in node.children() {
        let key = child.name().trim();
        if key.is_empty() {
            continue;
        }
        metadata.insert(key.to_owned(), child.text().trim().to_owned());
    }
    metadata
}

fn parse_vertices(node: &XmlElement) -> ParseResult<Vec<Vector3>> {
    let mut vertices: Vec<Vector3> = Vec::new();
    for vertex in node.children_named("Vertex") {
        let id = coerce_int(vertex.attribute("id"), "id")?;
        let position = parse_vector3([
            vertex.attribute("x"),
            vertex.attribute("y"),
            vertex.attribute("z"),
        ])?;

        let current = i64::try_from(vertices.len()).unwrap_or(i64::MAX);
        match id.cmp(&current) {
            Ordering::Less => return Err(ParseError::DuplicateVertexId { id }),
            Ordering::Greater => pad_vertex_gap(&mut vertices, id)?,
            Ordering::Equal => {}
        }
        vertices.push(position);
    }
    Ok(vertices)
}

/// Vult de ids tussen de huidige lengte en `id` op met nulposities, zodat
/// elke id zijn arraypositie houdt.
fn pad_vertex_gap(vertices: &mut Vec<Vector3>, id: i64) -> ParseResult<()> {
    let previous = vertices.len();
    let gap = usize::try_from(id)
        .ok()
        .and_then(|target| target.checked_sub(previous))
        .filter(|&gap| gap <= MAX_VERTEX_ID_GAP)
        .ok_or(ParseError::VertexIdGapTooLarge {
            id,
            previous,
            limit: MAX_VERTEX_ID_GAP,
        })?;
    let target = VertexIndex::try_from(id).map_err(|_| ParseError::MalformedNumber {
        value: id.to_string(),
    })?;
    vertices
        .try_reserve(gap + 1)
        .map_err(|_| ParseError::VertexAllocation { count: previous + gap + 1 })?;

    log::warn!("vertex ids {previous}..{id} ontbreken; opgevuld met nulposities");
    vertices.resize(target as usize, [0.0, 0.0, 0.0]);
    Ok(())
}

fn parse_faces(
    node: Option<&XmlElement>,
    vertex_count: usize,
) -> ParseResult<Vec<Vec<VertexIndex>>> {
    let Some(node) = node else {
        return Ok(Vec::new());
    };

    let mut faces = Vec::new();
    for (face_index, face) in node.children_named("Face").enumerate() {
        let indices = split_index_list(face.attribute("verts").unwrap_or_default())?;
        if indices.len() < 3 {
            return Err(ParseError::DegenerateFace {
                face: face_index,
                count: indices.len(),
            });
        }
        let indices = indices
            .into_iter()
            .map(|index| {
                checked_vertex_index(index, vertex_count).ok_or(ParseError::FaceIndexOutOfRange {
                    face: face_index,
                    index,
                    vertex_count,
                })
            })
            .collect::<ParseResult<Vec<_>>>()?;
        faces.push(indices);
    }
    Ok(faces)
}

fn checked_vertex_index(index: i64, vertex_count: usize) -> Option<VertexIndex> {
    let vertex = VertexIndex::try_from(index).ok()?;
    (usize::try_from(vertex).ok()? < vertex_count).then_some(vertex)
}

/// Welk uiteinde van een bone gelezen wordt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoneEnd {
    Head,
    Tail,
}

/// Historische naamgevingen voor bone-posities in oudere documenten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointNaming {
    /// `head_x`, `tail_x`, ...
    SnakeCase,
    /// `headX`, `tailX`, ...
    CamelCase,
    /// `x`, `y`, `z` (alleen voor de head).
    Bare,
}

impl BoneEnd {
    /// Conventie die gelezen wordt (met nul-defaults) als geen enkele voorkeur aanwezig is.
    const fn fallback(self) -> PointNaming {
        match self {
            Self::Head => PointNaming::Bare,
            Self::Tail => PointNaming::SnakeCase,
        }
    }
}

impl PointNaming {
    /// Conventies in volgorde van voorkeur; de eerste die volledig aanwezig is wint.
    const PREFERRED: [Self; 2] = [Self::SnakeCase, Self::CamelCase];

    const fn keys(self, end: BoneEnd) -> [&'static str; 3] {
        match (self, end) {
            (Self::SnakeCase, BoneEnd::Head) => ["head_x", "head_y", "head_z"],
            (Self::SnakeCase, BoneEnd::Tail) => ["tail_x", "tail_y", "tail_z"],
            (Self::CamelCase, BoneEnd::Head) => ["headX", "headY", "headZ"],
            (Self::CamelCase, BoneEnd::Tail) => ["tailX", "tailY", "tailZ"],
            (Self::Bare, _) => ["x", "y", "z"],
        }
    }

    fn is_present(self, element: &XmlElement, end: BoneEnd) -> bool {
        self.keys(end).iter().all(|key| element.has_attribute(key))
    }

    fn read(self, element: &XmlElement, end: BoneEnd) -> ParseResult<Vector3> {
        parse_vector3(self.keys(end).map(|key| element.attribute(key)))
    }
}

fn read_bone_point(element: &XmlElement, end: BoneEnd) -> ParseResult<Vector3> {
    let naming = PointNaming::PREFERRED
        .into_iter()
        .find(|naming| naming.is_present(element, end))
        .unwrap_or(end.fallback());
    naming.read(element, end)
}

fn parse_rig(node: Option<&XmlElement>) -> ParseResult<NamedMap<Bone>> {
    let mut bones = NamedMap::new();
    let Some(node) = node else {
        return Ok(bones);
    };

    for bone in node.children_named("Bone") {
        let name = bone
            .non_empty_attribute("name")
            .ok_or(ParseError::MissingBoneName)?
            .to_owned();
        let parent = bone.non_empty_attribute("parent").map(str::to_owned);
        let head = read_bone_point(bone, BoneEnd::Head)?;
        let tail = read_bone_point(bone, BoneEnd::Tail)?;
        let roll = coerce_float(bone.attribute("roll"), 0.0)?;
        let inherit_scale = bone
            .attribute("inheritScale")
            .unwrap_or(DEFAULT_INHERIT_SCALE)
            .to_owned();

        bones.insert(
            name.clone(),
            Bone {
                name,
                parent,
                head,
                tail,
                roll,
                inherit_scale,
            },
        );
    }
    Ok(bones)
}

fn parse_weight_layers(
    node: Option<&XmlElement>,
    vertex_count: usize,
) -> ParseResult<NamedMap<WeightLayer>> {
    let mut layers = NamedMap::new();
    let Some(node) = node else {
        return Ok(layers);
    };

    for layer_node in node.children_named("Layer") {
        let name = layer_node
            .non_empty_attribute("name")
            .ok_or(ParseError::MissingLayerName)?;
        let layer_type = layer_node.attribute("type").unwrap_or(DEFAULT_LAYER_TYPE);
        let normalised = !layer_node
            .attribute("normalised")
            .is_some_and(|value| value.eq_ignore_ascii_case("false"));
        let description = layer_node
            .child("Description")
            .and_then(XmlElement::trimmed_text)
            .map(str::to_owned);

        let mut layer = WeightLayer::new(name, layer_type, normalised, description);
        for bone_node in layer_node.children_named("Bone") {
            let bone_name = bone_node.non_empty_attribute("name").ok_or_else(|| {
                ParseError::MissingWeightBoneName {
                    layer: name.to_owned(),
                }
            })?;

            let mut weights = WeightMap::new();
            for weight in bone_node.children_named("Weight") {
                let index = coerce_int(weight.attribute("vertex"), "vertex")?;
                let value = coerce_float(weight.attribute("value"), 0.0)?;
                let vertex = checked_vertex_index(index, vertex_count).ok_or_else(|| {
                    WeightRangeError {
                        layer: name.to_owned(),
                        bone: bone_name.to_owned(),
                        index,
                        vertex_count,
                    }
                })?;
                weights.insert(vertex, value);
            }
            layer.insert_bone(bone_name, weights);
        }
        layers.insert(name.to_owned(), layer);
    }
    Ok(layers)
}

fn parse_sizing(node: Option<&XmlElement>) -> ParseResult<NamedMap<SizingParameter>> {
    let mut sizing = NamedMap::new();
    let Some(node) = node else {
        return Ok(sizing);
    };

    for parameter in node.children_named("Parameter") {
        let name = parameter
            .non_empty_attribute("name")
            .ok_or(ParseError::MissingParameterName)?
            .to_owned();
        let value = coerce_float(parameter.attribute("value"), 0.0)?;
        let unit = parameter.attribute("unit").unwrap_or_default().to_owned();
        let minimum = optional_bound(parameter, "min")?;
        let maximum = optional_bound(parameter, "max")?;
        let description = parameter.trimmed_text().map(str::to_owned);

        sizing.insert(
            name.clone(),
            SizingParameter {
                name,
                value,
                unit,
                minimum,
                maximum,
                description,
            },
        );
    }
    Ok(sizing)
}

fn optional_bound(parameter: &XmlElement, key: &str) -> ParseResult<Option<f64>> {
    parameter
        .non_empty_attribute(key)
        .map(|raw| coerce_float(Some(raw), 0.0))
        .transpose()
}
