//! Sparse per-bone weight maps and their dense views.

use std::collections::BTreeMap;

use thiserror::Error;

use super::{NamedMap, VertexIndex};

pub const DEFAULT_LAYER_TYPE: &str = "generic";

/// A weight referenced a vertex outside `0..vertex_count`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "gewicht-index {index} voor bone '{bone}' in layer '{layer}' valt buiten vertexbereik 0..{vertex_count}"
)]
pub struct WeightRangeError {
    pub layer: String,
    pub bone: String,
    pub index: i64,
    pub vertex_count: usize,
}

/// Sparse `vertex index -> weight` map for one bone, ordered by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightMap {
    weights: BTreeMap<VertexIndex, f64>,
}

impl WeightMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Later values for the same vertex replace earlier ones.
    pub fn insert(&mut self, vertex: VertexIndex, weight: f64) {
        self.weights.insert(vertex, weight);
    }

    #[must_use]
    pub fn get(&self, vertex: VertexIndex) -> Option<f64> {
        self.weights.get(&vertex).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VertexIndex, f64)> + '_ {
        self.weights.iter().map(|(&vertex, &weight)| (vertex, weight))
    }

    pub fn indices(&self) -> impl Iterator<Item = VertexIndex> + '_ {
        self.weights.keys().copied()
    }

    /// Largest weight, `None` for an empty map.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.weights.values().copied().reduce(f64::max)
    }

    /// Mean over the weighted vertices only.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Option<f64> {
        if self.weights.is_empty() {
            return None;
        }
        Some(self.weights.values().sum::<f64>() / self.weights.len() as f64)
    }

    /// First index that does not fit a mesh of `vertex_count` vertices.
    #[must_use]
    pub fn first_out_of_range(&self, vertex_count: usize) -> Option<VertexIndex> {
        self.indices()
            .find(|&vertex| usize::try_from(vertex).map_or(true, |v| v >= vertex_count))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn to_dense_unchecked(&self, vertex_count: usize) -> Vec<f32> {
        let mut dense = vec![0.0_f32; vertex_count];
        for (vertex, weight) in self.iter() {
            dense[vertex as usize] = weight as f32;
        }
        dense
    }
}

/// A named set of per-bone weight maps driving one deformation category
/// (skin, muscle, fat, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct WeightLayer {
    pub name: String,
    pub layer_type: String,
    /// Whether weights are expected to stay within `0..=1` per vertex.
    /// Not checked while parsing.
    pub normalised: bool,
    pub description: Option<String>,
    weights: NamedMap<WeightMap>,
}

impl WeightLayer {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        layer_type: impl Into<String>,
        normalised: bool,
        description: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            layer_type: layer_type.into(),
            normalised,
            description,
            weights: NamedMap::new(),
        }
    }

    /// Stores the map for `bone`, replacing an earlier one in its first
    /// position. Empty maps are dropped instead of stored.
    pub fn insert_bone(&mut self, bone: impl Into<String>, weights: WeightMap) {
        if !weights.is_empty() {
            self.weights.insert(bone.into(), weights);
        }
    }

    /// Bone name to weight map, in document order. Every map is non-empty.
    #[must_use]
    pub fn weights(&self) -> &NamedMap<WeightMap> {
        &self.weights
    }

    #[must_use]
    pub fn bone(&self, name: &str) -> Option<&WeightMap> {
        self.weights.get(name)
    }

    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.weights.len()
    }

    /// Dense weights for one bone; `Ok(None)` if the layer has no such bone.
    pub fn dense_bone(
        &self,
        bone: &str,
        vertex_count: usize,
    ) -> Result<Option<Vec<f32>>, WeightRangeError> {
        self.weights
            .get(bone)
            .map(|map| self.densify(bone, map, vertex_count))
            .transpose()
    }

    /// Dense weights for every bone, each buffer `vertex_count` long with
    /// zeros for unweighted vertices.
    pub fn dense(
        &self,
        vertex_count: usize,
    ) -> Result<NamedMap<Vec<f32>>, WeightRangeError> {
        self.weights
            .iter()
            .map(|(bone, map)| {
                self.densify(bone, map, vertex_count)
                    .map(|dense| (bone, dense))
            })
            .collect()
    }

    fn densify(
        &self,
        bone: &str,
        map: &WeightMap,
        vertex_count: usize,
    ) -> Result<Vec<f32>, WeightRangeError> {
        if let Some(index) = map.first_out_of_range(vertex_count) {
            return Err(WeightRangeError {
                layer: self.name.clone(),
                bone: bone.to_owned(),
                index: i64::from(index),
                vertex_count,
            });
        }
        Ok(map.to_dense_unchecked(vertex_count))
    }
}
