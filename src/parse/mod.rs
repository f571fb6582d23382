//! Inlezen van base-mesh documenten.
//!
//! De parser werkt in twee stappen: [`xml_tree`] leest het ruwe XML-document
//! in een kleine elementboom, waarna [`base_mesh_xml`] die boom valideert en
//! omzet naar een [`BaseMesh`](crate::model::BaseMesh).

pub mod base_mesh_xml;
pub mod coerce;
pub mod xml_tree;

use thiserror::Error;

use crate::model::weights::WeightRangeError;

/// Result type voor het parsen van base-mesh documenten.
pub type ParseResult<T> = Result<T, ParseError>;

/// Beschrijft fouten tijdens het parsen.
///
/// De builder stopt bij de eerste fout; er wordt nooit een half gevulde mesh
/// teruggegeven.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Het XML-document kon niet getokeniseerd worden.
    #[error("XML parsefout: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Het document heeft geen (volledige) root.
    #[error("ongeldig document: {0}")]
    Document(String),
    /// Het document kon niet van schijf gelezen worden.
    #[error("kon document niet lezen: {0}")]
    Io(#[from] std::io::Error),
    /// Een numeriek attribuut kon niet geconverteerd worden.
    #[error("ongeldige numerieke waarde: {value:?}")]
    MalformedNumber { value: String },
    /// Een verplicht (integer) attribuut ontbreekt.
    #[error("verplicht attribuut `{field}` ontbreekt")]
    MissingRequiredField { field: String },
    /// Een face heeft een lege `verts` lijst.
    #[error("face vereist een `verts` attribuut met minstens één index")]
    EmptyIndexList,
    /// Een face bevat een index die geen geheel getal is.
    #[error("ongeldige vertex-indexlijst: {value:?}")]
    MalformedIndexList { value: String },
    /// De root is geen `<BaseMesh>`.
    #[error("root element moet <BaseMesh> zijn, kreeg <{found}>")]
    InvalidRoot { found: String },
    /// Een vertex-id werd al eerder toegekend.
    #[error("dubbele vertex id {id}")]
    DuplicateVertexId { id: i64 },
    /// Een vertex-id springt te ver vooruit om met nulposities op te vullen.
    #[error("vertex id {id} laat meer dan {limit} ids open na {previous} vertices")]
    VertexIdGapTooLarge {
        id: i64,
        previous: usize,
        limit: usize,
    },
    /// Er kon geen geheugen gereserveerd worden voor de vertexlijst.
    #[error("kon geen ruimte reserveren voor {count} vertices")]
    VertexAllocation { count: usize },
    /// Een face heeft minder dan drie indices.
    #[error("face {face} heeft {count} indices, minstens drie vereist")]
    DegenerateFace { face: usize, count: usize },
    /// Een face verwijst naar een vertex buiten de vertexlijst.
    #[error("face {face} verwijst naar vertex {index} buiten bereik 0..{vertex_count}")]
    FaceIndexOutOfRange {
        face: usize,
        index: i64,
        vertex_count: usize,
    },
    #[error("bone mist verplicht `name` attribuut")]
    MissingBoneName,
    #[error("weight layer mist verplicht `name` attribuut")]
    MissingLayerName,
    #[error("weight layer '{layer}' bevat een bone zonder naam")]
    MissingWeightBoneName { layer: String },
    #[error("sizing parameter mist verplicht `name` attribuut")]
    MissingParameterName,
    /// Een gewicht verwijst naar een vertex buiten de vertexlijst.
    #[error(transparent)]
    WeightIndexOutOfRange(#[from] WeightRangeError),
    #[error("<Topology> element ontbreekt")]
    MissingTopology,
    #[error("<Vertices> element ontbreekt")]
    MissingVertices,
}
