//! Collection persistence
//!
//! Each collection is one JSON artifact, `<root>/<name>.json`. The root is
//! created on first write; writes are atomic (temp file, then rename).

mod artifact;

pub use artifact::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ingest::Ingestor;
use crate::models::{Chunk, Collection};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const ARTIFACT_EXTENSION: &str = "json";

/// File-backed store of named collections
#[derive(Debug, Clone)]
pub struct CollectionStore {
    root: PathBuf,
}

impl CollectionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.collections_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names map 1:1 to files, so they cannot escape the root or hide
    pub fn validate_name(name: &str) -> Result<()> {
        let invalid = name.trim().is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.contains(std::path::MAIN_SEPARATOR);

        if invalid {
            return Err(Error::InvalidCollectionName(name.to_string()));
        }
        Ok(())
    }

    fn artifact_path(&self, name: &str) -> Result<PathBuf> {
        Self::validate_name(name)?;
        Ok(self.root.join(format!("{}.{}", name, ARTIFACT_EXTENSION)))
    }

    /// Ingest `paths` in order and persist the result under `name`, replacing any previous collection
    pub async fn create(
        &self,
        name: &str,
        paths: &[PathBuf],
        ingestor: &Ingestor<'_>,
    ) -> Result<Collection> {
        Self::validate_name(name)?;

        let chunks = ingestor.ingest_paths(paths).await?;
        let collection = Collection::new(name, chunks);
        if collection.is_empty() {
            warn!("Collection '{}' has no chunks; no readable documents were found", name);
        }
        self.save(&collection, Some(ingestor.embedding_model()))?;
        Ok(collection)
    }

    /// Write a collection, replacing any artifact of the same name
    pub fn save(&self, collection: &Collection, embedding_model: Option<&str>) -> Result<PathBuf> {
        let path = self.artifact_path(&collection.name)?;
        std::fs::create_dir_all(&self.root)?;

        let artifact = CollectionArtifact::new(&collection.name, &collection.chunks, embedding_model);
        let content = serde_json::to_string_pretty(&artifact)?;

        let tmp_path = path.with_extension(format!("{}.tmp", ARTIFACT_EXTENSION));
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &path)?;

        info!(
            "Saved collection '{}' ({} chunks) to {}",
            collection.name,
            collection.len(),
            path.display()
        );
        Ok(path)
    }

    fn read_artifact(&self, name: &str) -> Result<Option<CollectionArtifact<'static>>> {
        let path = self.artifact_path(name)?;
        if !path.is_file() {
            debug!("No artifact at {}", path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let artifact: CollectionArtifact<'static> = serde_json::from_str(&content).map_err(|e| {
            Error::Parse(format!(
                "Corrupt collection artifact {}: {}",
                path.display(),
                e
            ))
        })?;

        if artifact.metadata.version != ARTIFACT_VERSION {
            return Err(Error::Parse(format!(
                "{}: unsupported artifact version {}",
                path.display(),
                artifact.metadata.version
            )));
        }
        Ok(Some(artifact))
    }

    /// Read a collection; `None` when no artifact exists under that name
    pub fn load(&self, name: &str) -> Result<Option<Collection>> {
        let Some(artifact) = self.read_artifact(name)? else {
            return Ok(None);
        };

        let chunks: Vec<Chunk> = artifact.chunks.into_owned();
        debug!(
            name,
            chunks = chunks.len(),
            model = ?artifact.metadata.embedding_model,
            "Loaded collection"
        );
        Ok(Some(Collection::new(name, chunks)))
    }

    /// Metadata header of a stored collection
    pub fn metadata(&self, name: &str) -> Result<Option<ArtifactMetadata>> {
        Ok(self.read_artifact(name)?.map(|artifact| artifact.metadata))
    }

    /// Names of all stored collections, in directory enumeration order
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if Self::validate_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        Ok(names)
    }
}
