//! Weight-layer summaries and the slider metadata derived from them.
//!
//! Summaries are pure functions of a layer and the owning mesh's vertex
//! count: the same input always yields the same [`LayerSummary`], including
//! slider order, which follows the order bones are declared in the layer.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use time::OffsetDateTime;

use crate::model::{BaseMesh, WeightLayer};

/// Headroom applied to the authored maximum of un-normalised layers.
pub const UNNORMALISED_HEADROOM: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoneMetrics {
    pub max: f64,
    /// Mean over the weighted vertices only.
    pub mean: f64,
    /// Weighted vertices divided by the mesh's vertex count.
    pub coverage: f64,
}

/// A UI-facing scalar control derived from one bone of one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderDefinition {
    /// `"{layer}:{bone}"`
    pub id: String,
    pub label: String,
    pub layer: String,
    pub bone: String,
    #[serde(rename = "default")]
    pub default_value: f64,
    #[serde(rename = "min")]
    pub minimum: f64,
    #[serde(rename = "max")]
    pub maximum: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub layer_type: String,
    pub normalised: bool,
    /// Bones with at least one weight.
    pub bone_count: usize,
    /// Distinct vertices weighted by any bone of the layer.
    pub affected_vertices: usize,
    /// Largest weight over all bones, `0.0` for a layer without weights.
    pub max_weight: f64,
    pub sliders: Vec<SliderDefinition>,
    pub bone_metrics: BTreeMap<String, BoneMetrics>,
}

#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn summarize_layer(layer: &WeightLayer, vertex_count: usize) -> LayerSummary {
    let mut affected = BTreeSet::new();
    let mut max_weight = 0.0_f64;
    let mut sliders = Vec::with_capacity(layer.bone_count());
    let mut bone_metrics = BTreeMap::new();
    let label_prefix = title_case(&layer.name);

    for (bone, weights) in layer.weights().iter() {
        let (Some(max), Some(mean)) = (weights.max(), weights.mean()) else {
            continue;
        };
        affected.extend(weights.indices());
        max_weight = max_weight.max(max);

        let coverage = weights.len() as f64 / vertex_count.max(1) as f64;
        bone_metrics.insert(bone.to_owned(), BoneMetrics { max, mean, coverage });

        let (default_value, maximum) = if layer.normalised {
            (mean, max.max(1.0))
        } else {
            (0.0, (max * UNNORMALISED_HEADROOM).max(1.0))
        };
        sliders.push(SliderDefinition {
            id: format!("{}:{bone}", layer.name),
            label: format!("{label_prefix} · {bone}"),
            layer: layer.name.clone(),
            bone: bone.to_owned(),
            default_value,
            minimum: 0.0,
            maximum,
            description: layer.description.clone(),
        });
    }

    LayerSummary {
        name: layer.name.clone(),
        layer_type: layer.layer_type.clone(),
        normalised: layer.normalised,
        bone_count: bone_metrics.len(),
        affected_vertices: affected.len(),
        max_weight,
        sliders,
        bone_metrics,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeshStatistics {
    pub vertex_count: usize,
    pub face_count: usize,
    pub triangle_count: usize,
    pub bone_count: usize,
    pub weight_layer_count: usize,
    pub sizing_parameter_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshSummary {
    pub name: String,
    pub statistics: MeshStatistics,
    /// One entry per weight layer, in document order.
    pub layers: Vec<LayerSummary>,
}

impl MeshSummary {
    /// All sliders of all layers, layer by layer.
    pub fn sliders(&self) -> impl Iterator<Item = &SliderDefinition> {
        self.layers.iter().flat_map(|layer| layer.sliders.iter())
    }

    #[must_use]
    pub fn into_metadata(
        self,
        session_id: impl Into<String>,
        generated: OffsetDateTime,
    ) -> SliderMetadata {
        SliderMetadata::new(session_id, self.name, self.layers, generated)
    }
}

#[must_use]
pub fn summarize_mesh(mesh: &BaseMesh) -> MeshSummary {
    let vertex_count = mesh.vertex_count();
    let layers: Vec<LayerSummary> = mesh
        .weight_layers()
        .values()
        .map(|layer| summarize_layer(layer, vertex_count))
        .collect();

    MeshSummary {
        name: mesh.name().to_owned(),
        statistics: MeshStatistics {
            vertex_count,
            face_count: mesh.faces().len(),
            triangle_count: mesh.triangulate().count(),
            bone_count: mesh.bones().len(),
            weight_layer_count: mesh.weight_layers().len(),
            sizing_parameter_count: mesh.sizing().len(),
        },
        layers,
    }
}

/// The slider metadata document handed to persistence, keyed by session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderMetadata {
    pub session_id: String,
    pub base_mesh: String,
    /// Unix timestamp in seconds.
    pub generated: f64,
    pub layers: Vec<LayerSummary>,
}

impl SliderMetadata {
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        base_mesh: impl Into<String>,
        layers: Vec<LayerSummary>,
        generated: OffsetDateTime,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            base_mesh: base_mesh.into(),
            generated: generated.unix_timestamp_nanos() as f64 / 1e9,
            layers,
        }
    }

    /// Pretty JSON with object keys sorted alphabetically.
    pub fn to_json(&self) -> serde_json::Result<String> {
        // `serde_json::Map` is ordered by key, so going through `Value` sorts.
        let value = serde_json::to_value(self)?;
        serde_json::to_string_pretty(&value)
    }
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            titled.push(c);
            in_word = false;
        }
    }
    titled
}

#[cfg(test)]
mod tests {
    use super::{SliderMetadata, summarize_layer, title_case};
    use crate::model::{WeightLayer, WeightMap};
    use time::macros::datetime;

    fn layer(name: &str, normalised: bool, bones: &[(&str, &[(u32, f64)])]) -> WeightLayer {
        let mut layer = WeightLayer::new(name, "generic", normalised, None);
        for (bone, entries) in bones {
            let mut map = WeightMap::new();
            for &(vertex, weight) in *entries {
                map.insert(vertex, weight);
            }
            layer.insert_bone(*bone, map);
        }
        layer
    }

    #[test]
    fn coverage_is_relative_to_vertex_count() {
        let skin = layer("Skin", true, &[("Spine", &[(0, 1.0), (7, 0.5)])]);
        let summary = summarize_layer(&skin, 10);
        assert!((summary.bone_metrics["Spine"].coverage - 0.2).abs() < 1e-12);

        // An empty mesh divides by one instead of zero.
        let summary = summarize_layer(&skin, 0);
        assert!((summary.bone_metrics["Spine"].coverage - 2.0).abs() < 1e-12);
    }

    #[test]
    fn slider_defaults_follow_normalisation() {
        let bones: &[(&str, &[(u32, f64)])] = &[("Spine", &[(0, 0.8), (1, 0.4)])];

        let normalised = summarize_layer(&layer("Skin", true, bones), 4);
        let slider = &normalised.sliders[0];
        assert!((slider.default_value - 0.6).abs() < 1e-9);
        assert_eq!(slider.minimum, 0.0);
        assert_eq!(slider.maximum, 1.0);

        let raw = summarize_layer(&layer("Fat", false, bones), 4);
        let slider = &raw.sliders[0];
        assert_eq!(slider.default_value, 0.0);
        assert_eq!(slider.maximum, 1.0);

        let heavy = summarize_layer(&layer("Fat", false, &[("Belly", &[(0, 2.0)])]), 4);
        assert!((heavy.sliders[0].maximum - 3.0).abs() < 1e-12);
        let heavy = summarize_layer(&layer("Fat", true, &[("Belly", &[(0, 2.0)])]), 4);
        assert_eq!(heavy.sliders[0].maximum, 2.0);
    }

    #[test]
    fn affected_vertices_are_counted_once_across_bones() {
        let muscle = layer(
            "Muscle",
            true,
            &[("Arm", &[(0, 0.5), (1, 0.5)]), ("Chest", &[(1, 0.5), (2, 0.9)])],
        );
        let summary = summarize_layer(&muscle, 3);
        assert_eq!(summary.bone_count, 2);
        assert_eq!(summary.affected_vertices, 3);
        assert_eq!(summary.max_weight, 0.9);
        let ids: Vec<&str> = summary.sliders.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["Muscle:Arm", "Muscle:Chest"]);
    }

    #[test]
    fn sliders_follow_declaration_order() {
        let skin = layer("skin", true, &[("Spine", &[(0, 1.0)]), ("Arm", &[(1, 1.0)])]);
        let ids: Vec<String> = summarize_layer(&skin, 2)
            .sliders
            .into_iter()
            .map(|slider| slider.id)
            .collect();
        assert_eq!(ids, vec!["skin:Spine", "skin:Arm"]);
    }

    #[test]
    fn empty_layer_has_no_sliders() {
        let summary = summarize_layer(&layer("Skin", true, &[]), 4);
        assert_eq!(summary.bone_count, 0);
        assert_eq!(summary.affected_vertices, 0);
        assert_eq!(summary.max_weight, 0.0);
        assert!(summary.sliders.is_empty());
    }

    #[test]
    fn summaries_are_deterministic() {
        let skin = layer(
            "Skin",
            true,
            &[("Spine", &[(0, 0.8), (1, 0.4)]), ("Head", &[(3, 0.1)])],
        );
        assert_eq!(summarize_layer(&skin, 4), summarize_layer(&skin, 4));
    }

    #[test]
    fn labels_title_case_the_layer() {
        assert_eq!(title_case("skin"), "Skin");
        assert_eq!(title_case("upper body_fat"), "Upper Body_Fat");
        assert_eq!(title_case("MUSCLE2group"), "Muscle2Group");

        let mut skin = layer("soft skin", true, &[("Spine", &[(0, 1.0)])]);
        skin.description = Some("Primary".to_owned());
        let slider = &summarize_layer(&skin, 1).sliders[0];
        assert_eq!(slider.label, "Soft Skin · Spine");
        assert_eq!(slider.layer, "soft skin");
        assert_eq!(slider.bone, "Spine");
        assert_eq!(slider.description.as_deref(), Some("Primary"));
    }

    #[test]
    fn metadata_serializes_with_sorted_keys() {
        let summary = summarize_layer(&layer("Skin", true, &[("Spine", &[(0, 0.5)])]), 2);
        let metadata = SliderMetadata::new(
            "abc123",
            "HumanoidNeutral",
            vec![summary],
            datetime!(2024-01-01 0:00 UTC),
        );
        assert_eq!(metadata.generated, 1_704_067_200.0);

        let json = metadata.to_json().expect("serializable");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["session_id"], "abc123");
        assert_eq!(value["base_mesh"], "HumanoidNeutral");
        let layer = &value["layers"][0];
        assert_eq!(layer["type"], "generic");
        assert_eq!(layer["bone_metrics"]["Spine"]["max"], 0.5);
        let slider = &layer["sliders"][0];
        assert_eq!(slider["id"], "Skin:Spine");
        assert_eq!(slider["default"], 0.5);
        assert_eq!(slider["min"], 0.0);
        assert_eq!(slider["max"], 1.0);
        assert!(slider["description"].is_null());

        let base_mesh = json.find("\"base_mesh\"").expect("key present");
        let session = json.find("\"session_id\"").expect("key present");
        assert!(base_mesh < session);
    }
}
