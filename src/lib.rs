#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod model;
pub mod parse;
pub mod summary;

use std::fmt;

use model::BaseMesh;
use serde::Serialize;
use summary::{MeshSummary, summarize_mesh};
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

/// Naam voor een mesh zonder `name` attribuut wanneer de aanroeper er geen opgeeft.
const UNNAMED_MESH: &str = "BaseMesh";

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[derive(Debug, Serialize)]
struct SizingExport<'a> {
    parameters: Vec<&'a model::SizingParameter>,
    out_of_bounds: Vec<&'a str>,
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    initialized: bool,
    mesh: Option<BaseMesh>,
    summary: Option<MeshSummary>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Engine {
        Engine {
            initialized: true,
            mesh: None,
            summary: None,
        }
    }

    /// Geeft terug of de engine de minimale initialisatie heeft doorlopen.
    #[wasm_bindgen]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Laad een base-mesh XML-document en bereken de laagsamenvattingen.
    ///
    /// `name` wordt gebruikt wanneer het document zelf geen naam heeft.
    #[wasm_bindgen]
    pub fn load_base_mesh(&mut self, xml: &str, name: Option<String>) -> Result<(), JsValue> {
        let fallback = name.as_deref().unwrap_or(UNNAMED_MESH);
        let mesh = parse::base_mesh_xml::parse_str(xml, fallback).map_err(to_js_error)?;
        let summary = summarize_mesh(&mesh);
        log::debug!(
            "Base mesh '{}' geladen: {} sliders",
            mesh.name(),
            summary.sliders().count()
        );

        self.mesh = Some(mesh);
        self.summary = Some(summary);
        Ok(())
    }

    /// Naam van de geladen mesh.
    #[wasm_bindgen]
    #[must_use]
    pub fn mesh_name(&self) -> Option<String> {
        self.mesh.as_ref().map(|mesh| mesh.name().to_owned())
    }

    #[wasm_bindgen]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, BaseMesh::vertex_count)
    }

    /// Vertexposities als platte `[x, y, z, ...]` buffer.
    #[wasm_bindgen]
    pub fn get_vertex_buffer(&self) -> Result<Vec<f32>, JsValue> {
        Ok(self.loaded_mesh()?.vertex_array())
    }

    /// Driehoeksindices (fan-triangulatie) als platte buffer.
    #[wasm_bindgen]
    pub fn get_triangle_indices(&self) -> Result<Vec<u32>, JsValue> {
        Ok(self
            .loaded_mesh()?
            .triangulate()
            .flatten()
            .collect())
    }

    /// Haal de samenvatting van alle gewichtslagen op.
    #[wasm_bindgen]
    pub fn get_layer_summaries(&self) -> Result<JsValue, JsValue> {
        let summary = self.loaded_summary()?;
        serde_wasm_bindgen::to_value(&summary.layers)
            .map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Haal slider-specificaties op voor UI-generatie.
    #[wasm_bindgen]
    pub fn get_sliders(&self) -> Result<JsValue, JsValue> {
        let summary = self.loaded_summary()?;
        let sliders: Vec<_> = summary.sliders().collect();
        serde_wasm_bindgen::to_value(&sliders).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Sizing-parameters plus de namen van parameters buiten hun grenzen.
    #[wasm_bindgen]
    pub fn get_sizing(&self) -> Result<JsValue, JsValue> {
        let export = sizing_export(self.loaded_mesh()?);
        serde_wasm_bindgen::to_value(&export).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Dichte gewichtsbuffer (één waarde per vertex) voor één bone in een laag.
    #[wasm_bindgen]
    pub fn get_weight_buffer(&self, layer: &str, bone: &str) -> Result<Vec<f32>, JsValue> {
        let mesh = self.loaded_mesh()?;
        let Some(weight_layer) = mesh.layer(layer) else {
            return Err(js_error(&format!("onbekende gewichtslaag '{layer}'")));
        };
        match weight_layer.dense_bone(bone, mesh.vertex_count()) {
            Ok(Some(buffer)) => Ok(buffer),
            Ok(None) => Err(js_error(&format!(
                "bone '{bone}' heeft geen gewichten in laag '{layer}'"
            ))),
            Err(err) => Err(to_js_error(err)),
        }
    }
}

impl Engine {
    fn loaded_mesh(&self) -> Result<&BaseMesh, JsValue> {
        self.mesh
            .as_ref()
            .ok_or_else(|| js_error("er is geen base mesh geladen"))
    }

    fn loaded_summary(&self) -> Result<&MeshSummary, JsValue> {
        self.summary
            .as_ref()
            .ok_or_else(|| js_error("er is geen base mesh geladen"))
    }
}

fn sizing_export(mesh: &BaseMesh) -> SizingExport<'_> {
    SizingExport {
        parameters: mesh.sizing().values().collect(),
        out_of_bounds: mesh
            .sizing()
            .values()
            .filter(|parameter| !parameter.is_within_bounds())
            .map(|parameter| parameter.name.as_str())
            .collect(),
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
