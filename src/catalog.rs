//! Discovery of base-mesh documents in a directory.
//!
//! Every file whose name ends in `.xml` (any case) is parsed. Files are
//! processed in sorted file-name order and keyed by the resolved mesh name,
//! so when two files resolve to the same name the later file wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use thiserror::Error;

use crate::model::BaseMesh;
use crate::parse::ParseError;
use crate::parse::base_mesh_xml;

pub const DEFAULT_BASE_MESH: &str = "HumanoidNeutral";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalogusmap '{}' bestaat niet", .0.display())]
    MissingDirectory(PathBuf),
    #[error("geen base meshes gevonden in '{}'", .0.display())]
    EmptyCatalog(PathBuf),
    #[error(
        "base mesh '{requested}' is niet beschikbaar; opties: {}{}",
        .available.join(", "),
        suggestion_hint(.suggestion.as_deref())
    )]
    UnavailableBaseMesh {
        requested: String,
        available: Vec<String>,
        suggestion: Option<String>,
    },
    #[error("fout bij lezen van catalogus: {0}")]
    Io(#[from] std::io::Error),
    #[error("fout in '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

fn suggestion_hint(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |name| format!(" (bedoelde je '{name}'?)"))
}

/// Where to look for base meshes and which one to use when none is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub directory: PathBuf,
    pub default_mesh: String,
}

impl CatalogConfig {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            default_mesh: DEFAULT_BASE_MESH.to_owned(),
        }
    }

    #[must_use]
    pub fn with_default_mesh(mut self, name: impl Into<String>) -> Self {
        self.default_mesh = name.into();
        self
    }
}

/// Parsed base meshes keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    directory: PathBuf,
    meshes: BTreeMap<String, BaseMesh>,
}

impl Catalog {
    /// Parses every `.xml` document in `directory`.
    ///
    /// A directory without documents yields an empty catalog; the first
    /// document that fails to parse aborts discovery.
    pub fn load_dir(directory: &Path) -> Result<Self, CatalogError> {
        if !directory.is_dir() {
            return Err(CatalogError::MissingDirectory(directory.to_path_buf()));
        }

        let paths = document_paths(directory)?;
        let mut meshes = BTreeMap::new();
        for mesh in parse_documents(paths)? {
            if let Some(previous) = meshes.insert(mesh.name().to_owned(), mesh) {
                log::debug!("base mesh '{}' overschreven door later bestand", previous.name());
            }
        }
        log::info!(
            "{} base mesh(es) gevonden in {}",
            meshes.len(),
            directory.display()
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            meshes,
        })
    }

    pub fn load(config: &CatalogConfig) -> Result<Self, CatalogError> {
        Self::load_dir(&config.directory)
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Mesh names in sorted order.
    #[must_use]
    pub fn available_ids(&self) -> Vec<&str> {
        self.meshes.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BaseMesh> {
        self.meshes.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BaseMesh> {
        self.meshes.values()
    }

    /// Looks up `name`, reporting the available alternatives when it is missing.
    pub fn resolve(&self, name: &str) -> Result<&BaseMesh, CatalogError> {
        if self.meshes.is_empty() {
            return Err(CatalogError::EmptyCatalog(self.directory.clone()));
        }
        self.meshes
            .get(name)
            .ok_or_else(|| CatalogError::UnavailableBaseMesh {
                requested: name.to_owned(),
                available: self.meshes.keys().cloned().collect(),
                suggestion: closest_name(name, self.meshes.keys()),
            })
    }

    pub fn resolve_default(&self, config: &CatalogConfig) -> Result<&BaseMesh, CatalogError> {
        self.resolve(&config.default_mesh)
    }
}

fn document_paths(directory: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        let is_xml = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().to_ascii_lowercase().ends_with(".xml"));
        if is_xml && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

fn parse_document(path: PathBuf) -> Result<BaseMesh, CatalogError> {
    log::debug!("Parsing base mesh document {}", path.display());
    base_mesh_xml::parse_file(&path).map_err(|source| CatalogError::Parse { path, source })
}

#[cfg(feature = "parallel")]
fn parse_documents(paths: Vec<PathBuf>) -> Result<Vec<BaseMesh>, CatalogError> {
    paths.into_par_iter().map(parse_document).collect()
}

#[cfg(not(feature = "parallel"))]
fn parse_documents(paths: Vec<PathBuf>) -> Result<Vec<BaseMesh>, CatalogError> {
    paths.into_iter().map(parse_document).collect()
}

fn closest_name<'a>(
    requested: &str,
    candidates: impl Iterator<Item = &'a String>,
) -> Option<String> {
    let requested = requested.to_lowercase();
    candidates
        .min_by_key(|candidate| levenshtein::levenshtein(&requested, &candidate.to_lowercase()))
        .cloned()
}
