//! Read resource declarations from a directory: one resource per YAML or JSON file.

use crate::config::{Catalog, ResourceConfig};
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(FileFormat::Yaml),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }
}

/// Parse one declaration. Blank input yields `None`.
pub fn parse_resource(text: &str, format: FileFormat, origin: &str) -> Result<Option<ResourceConfig>, ConfigError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let parsed = match format {
        FileFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        FileFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
    };
    parsed
        .map(Some)
        .map_err(|e| ConfigError::Load(format!("{}: {}", origin, e)))
}

/// Load every declaration in `dir`, in file-name order. Empty files and files with other
/// extensions are skipped.
pub async fn load_from_dir(dir: &Path) -> Result<Vec<ResourceConfig>, ConfigError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", dir.display(), e)))?;
    let mut paths: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", dir.display(), e)))?
    {
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut resources = Vec::new();
    for path in paths {
        let Some(format) = FileFormat::from_path(&path) else {
            tracing::debug!(path = %path.display(), "skipping non-resource file");
            continue;
        };
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        match parse_resource(&text, format, &path.display().to_string())? {
            Some(resource) => resources.push(resource),
            None => tracing::debug!(path = %path.display(), "skipping empty file"),
        }
    }
    tracing::info!(dir = %dir.display(), resources = resources.len(), "loaded resource declarations");
    Ok(resources)
}

/// [`load_from_dir`] followed by validation.
pub async fn load_catalog(dir: &Path) -> Result<Catalog, ConfigError> {
    Catalog::new(load_from_dir(dir).await?)
}
