//! On-disk format of a persisted collection

use crate::models::Chunk;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Current artifact format version
pub const ARTIFACT_VERSION: u32 = 1;

/// Descriptive header stored next to the chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default = "default_version")]
    pub version: u32,

    pub name: String,

    /// Embedding model the vectors came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,

    /// Vector length shared by every chunk (0 when empty)
    #[serde(default)]
    pub dimension: usize,

    /// Distinct chunk sources, in first-seen order
    #[serde(default)]
    pub sources: Vec<String>,

    pub created_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    ARTIFACT_VERSION
}

impl ArtifactMetadata {
    /// Describe a chunk sequence about to be written
    pub fn describe(name: &str, chunks: &[Chunk], embedding_model: Option<&str>) -> Self {
        let dimension = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);

        let mut sources: Vec<String> = Vec::new();
        for chunk in chunks {
            if !sources.contains(&chunk.source) {
                sources.push(chunk.source.clone());
            }
        }

        Self {
            version: ARTIFACT_VERSION,
            name: name.to_string(),
            embedding_model: embedding_model.map(str::to_string),
            dimension,
            sources,
            created_at: Utc::now(),
        }
    }
}

/// A collection exactly as written to disk; borrows its chunks when writing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionArtifact<'a> {
    pub metadata: ArtifactMetadata,
    pub chunks: Cow<'a, [Chunk]>,
}

impl<'a> CollectionArtifact<'a> {
    pub fn new(name: &str, chunks: &'a [Chunk], embedding_model: Option<&str>) -> Self {
        Self {
            metadata: ArtifactMetadata::describe(name, chunks, embedding_model),
            chunks: Cow::Borrowed(chunks),
        }
    }
}
