use basemesh_engine::Engine;
use basemesh_engine::catalog::{Catalog, CatalogConfig, CatalogError};
use basemesh_engine::parse::{ParseError, base_mesh_xml};
use basemesh_engine::summary::{SliderMetadata, summarize_layer, summarize_mesh};
use std::fs;
use time::macros::datetime;

const QUAD_SKIN: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/samples/quad_skin.xml"));
const HUMANOID: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/samples/humanoid_neutral.xml"
));

#[test]
fn engine_initializes() {
    let engine = Engine::new();
    assert!(engine.is_initialized());
}

#[test]
fn quad_skin_end_to_end() {
    let mesh = base_mesh_xml::parse_str(QUAD_SKIN, "quad_skin").expect("parse quad");
    assert_eq!(mesh.name(), "QuadSkin");
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.triangle_indices(), vec![[0, 1, 2], [0, 2, 3]]);

    let skin = mesh.layer("Skin").expect("skin layer");
    let summary = summarize_layer(skin, mesh.vertex_count());
    assert_eq!(summary.bone_count, 1);
    assert_eq!(summary.affected_vertices, 2);
    assert_eq!(summary.max_weight, 0.8);
    assert_eq!(summary.sliders.len(), 1);

    let slider = &summary.sliders[0];
    assert_eq!(slider.id, "Skin:Spine");
    assert!((slider.default_value - 0.6).abs() < 1e-9);
    assert_eq!(slider.minimum, 0.0);
    assert_eq!(slider.maximum, 1.0);
    assert_eq!(slider.label, "Skin · Spine");

    let metrics = summary.bone_metrics["Spine"];
    assert_eq!(metrics.max, 0.8);
    assert!((metrics.coverage - 0.5).abs() < 1e-12);
}

#[test]
fn humanoid_sample_keeps_vertex_ids_as_indices() {
    let mesh = base_mesh_xml::parse_str(HUMANOID, "humanoid_neutral").expect("parse humanoid");
    assert_eq!(mesh.name(), "HumanoidNeutral");
    assert_eq!(mesh.version(), "1.2");

    // One past the largest declared id, with zeroed gaps.
    assert_eq!(mesh.vertex_count(), 9);
    assert_eq!(mesh.vertices()[4], [0.0, 0.0, 1.55]);
    assert_eq!(mesh.vertices()[5], [0.0, 0.0, 0.0]);
    assert_eq!(mesh.vertices()[6], [0.0, 0.0, 0.0]);
    assert_eq!(mesh.vertices()[8], [0.10, 0.0, 0.0]);
    assert_eq!(mesh.vertex_array().len(), 27);

    let metadata = mesh.metadata();
    assert_eq!(metadata.get("Author").map(String::as_str), Some("Base mesh team"));
    assert_eq!(metadata.get("Notes").map(String::as_str), Some(""));
}

#[test]
fn humanoid_sample_rig_and_sizing() {
    let mesh = base_mesh_xml::parse_str(HUMANOID, "humanoid_neutral").expect("parse humanoid");

    let roots: Vec<&str> = mesh.root_bones().map(|bone| bone.name.as_str()).collect();
    assert_eq!(roots, vec!["Hips"]);
    let children: Vec<&str> = mesh
        .children_of("Hips")
        .map(|bone| bone.name.as_str())
        .collect();
    assert_eq!(children, vec!["Spine", "Legs"]);

    let spine = mesh.bone("Spine").expect("spine");
    assert_eq!(spine.head, [0.0, 0.0, 1.0]);
    assert_eq!(spine.tail, [0.0, 0.0, 1.3]);

    let head = mesh.bone("Head").expect("head");
    assert_eq!(head.head, [0.0, 0.0, 1.3]);
    assert_eq!(head.inherit_scale, "NONE");
    assert!((head.length() - 0.25).abs() < 1e-9);

    let height = mesh.sizing_parameter("Height").expect("height");
    assert_eq!(height.minimum, Some(1.40));
    assert_eq!(height.description.as_deref(), Some("Total standing height"));
    assert!(mesh.sizing().values().all(|parameter| parameter.is_within_bounds()));
}

#[test]
fn humanoid_sample_summary() {
    let mesh = base_mesh_xml::parse_str(HUMANOID, "humanoid_neutral").expect("parse humanoid");
    let summary = summarize_mesh(&mesh);

    let stats = summary.statistics;
    assert_eq!(stats.vertex_count, 9);
    assert_eq!(stats.face_count, 3);
    assert_eq!(stats.triangle_count, 5);
    assert_eq!(stats.bone_count, 4);
    assert_eq!(stats.weight_layer_count, 2);
    assert_eq!(stats.sizing_parameter_count, 3);

    let names: Vec<&str> = summary.layers.iter().map(|layer| layer.name.as_str()).collect();
    assert_eq!(names, vec!["skin", "fat"]);

    let fat = &summary.layers[1];
    assert!(!fat.normalised);
    assert_eq!(fat.bone_count, 1);
    assert_eq!(fat.affected_vertices, 2);
    assert_eq!(fat.max_weight, 1.6);
    assert_eq!(fat.sliders[0].label, "Fat · Spine");
    assert_eq!(fat.sliders[0].default_value, 0.0);
    assert!((fat.sliders[0].maximum - 2.4).abs() < 1e-9);

    let skin = &summary.layers[0];
    assert_eq!(skin.bone_count, 4);
    assert_eq!(skin.affected_vertices, 7);
    assert_eq!(skin.max_weight, 1.0);
    assert_eq!(
        skin.sliders[0].description.as_deref(),
        Some("Primary deformation weights")
    );
    let bones: Vec<&str> = skin.sliders.iter().map(|slider| slider.bone.as_str()).collect();
    assert_eq!(bones, vec!["Hips", "Spine", "Head", "Legs"]);
    let spine = skin.bone_metrics["Spine"];
    assert!((spine.mean - 1.6 / 3.0).abs() < 1e-9);
    assert!((spine.coverage - 3.0 / 9.0).abs() < 1e-12);

    assert_eq!(summarize_mesh(&mesh), summary);
}

#[test]
fn slider_metadata_payload_shape() {
    let mesh = base_mesh_xml::parse_str(QUAD_SKIN, "quad_skin").expect("parse quad");
    let metadata: SliderMetadata =
        summarize_mesh(&mesh).into_metadata("session-1", datetime!(2024-05-01 12:00 UTC));
    let json = metadata.to_json().expect("serialize");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    assert_eq!(value["base_mesh"], "QuadSkin");
    assert_eq!(value["session_id"], "session-1");
    assert!(value["generated"].is_f64());
    let layer = &value["layers"][0];
    assert_eq!(layer["name"], "Skin");
    assert_eq!(layer["type"], "skin");
    assert_eq!(layer["normalised"], true);
    assert_eq!(layer["bone_count"], 1);
    assert_eq!(layer["affected_vertices"], 2);
    let slider = &layer["sliders"][0];
    assert_eq!(slider["id"], "Skin:Spine");
    assert_eq!(slider["layer"], "Skin");
    assert_eq!(slider["bone"], "Spine");
    assert_eq!(slider["max"], 1.0);
}

#[test]
fn duplicate_vertex_id_is_rejected() {
    let xml = QUAD_SKIN.replace(r#"<Vertex id="3""#, r#"<Vertex id="2""#);
    assert!(matches!(
        base_mesh_xml::parse_str(&xml, "quad_skin"),
        Err(ParseError::DuplicateVertexId { id: 2 })
    ));
}

#[test]
fn huge_vertex_id_is_rejected_without_allocating() {
    let xml = QUAD_SKIN.replace(r#"<Vertex id="3""#, r#"<Vertex id="4294967295""#);
    assert!(matches!(
        base_mesh_xml::parse_str(&xml, "quad_skin"),
        Err(ParseError::VertexIdGapTooLarge { id: 4_294_967_295, previous: 3, .. })
    ));
}

#[test]
fn degenerate_face_is_rejected() {
    let xml = QUAD_SKIN.replace(r#"verts="0 1 2 3""#, r#"verts="0 1""#);
    assert!(matches!(
        base_mesh_xml::parse_str(&xml, "quad_skin"),
        Err(ParseError::DegenerateFace { count: 2, .. })
    ));
}

#[test]
fn weight_index_must_be_below_vertex_count() {
    let at_limit = QUAD_SKIN.replace(r#"vertex="1""#, r#"vertex="4""#);
    assert!(matches!(
        base_mesh_xml::parse_str(&at_limit, "quad_skin"),
        Err(ParseError::WeightIndexOutOfRange(_))
    ));
    let last = QUAD_SKIN.replace(r#"vertex="1""#, r#"vertex="3""#);
    assert!(base_mesh_xml::parse_str(&last, "quad_skin").is_ok());
}

#[test]
fn parse_file_falls_back_to_file_stem() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("Unnamed.xml");
    fs::write(&path, QUAD_SKIN.replace(r#" name="QuadSkin""#, "")).expect("write sample");
    let mesh = base_mesh_xml::parse_file(&path).expect("parse file");
    assert_eq!(mesh.name(), "Unnamed");

    assert!(matches!(
        base_mesh_xml::parse_file(&dir.path().join("absent.xml")),
        Err(ParseError::Io(_))
    ));
}

#[test]
fn samples_directory_forms_a_catalog() {
    let config = CatalogConfig::new(concat!(env!("CARGO_MANIFEST_DIR"), "/samples"));
    let catalog = Catalog::load(&config).expect("samples catalog");
    assert_eq!(catalog.available_ids(), vec!["HumanoidNeutral", "QuadSkin"]);
    let mesh = catalog.resolve_default(&config).expect("default mesh present");
    assert_eq!(mesh.name(), "HumanoidNeutral");
}

#[test]
fn catalog_collision_keeps_later_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let renamed = HUMANOID.replace(r#"name="HumanoidNeutral""#, r#"name="QuadSkin""#);
    fs::write(dir.path().join("a_quad.xml"), QUAD_SKIN).expect("write");
    fs::write(dir.path().join("b_humanoid.xml"), renamed).expect("write");

    let catalog = Catalog::load_dir(dir.path()).expect("catalog");
    assert_eq!(catalog.available_ids(), vec!["QuadSkin"]);
    assert_eq!(catalog.get("QuadSkin").map(|mesh| mesh.vertex_count()), Some(9));

    match catalog.resolve("HumanoidNeutral") {
        Err(CatalogError::UnavailableBaseMesh { available, .. }) => {
            assert_eq!(available, vec!["QuadSkin"]);
        }
        other => panic!("expected UnavailableBaseMesh, got {other:?}"),
    }
}

#[test]
fn engine_serves_buffers_for_sample() {
    let mut engine = Engine::new();
    assert!(engine.load_base_mesh(HUMANOID, None).is_ok());
    assert_eq!(engine.mesh_name().as_deref(), Some("HumanoidNeutral"));
    assert_eq!(engine.vertex_count(), 9);
    assert_eq!(engine.get_triangle_indices().map(|t| t.len()).ok(), Some(15));
    let weights = engine.get_weight_buffer("fat", "Spine").ok();
    assert_eq!(
        weights,
        Some(vec![0.0, 0.0, 1.6, 0.4, 0.0, 0.0, 0.0, 0.0, 0.0])
    );
}
