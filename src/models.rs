//! The unit of retrieval and the collection it belongs to.

use serde::{Deserialize, Serialize};

/// One retrievable span of a source document with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Originating document (path or logical name)
    pub source: String,

    /// Raw chunk text
    pub text: String,

    /// Embedding vector; one dimensionality per collection
    pub embedding: Vec<f32>,

    /// Score from the last ranking this copy came out of
    #[serde(default)]
    pub similarity: f32,
}

impl Chunk {
    pub fn new(source: impl Into<String>, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            embedding,
            similarity: 0.0,
        }
    }
}

/// A named, ordered set of chunks loaded into memory.
#[derive(Debug, Clone)]
pub struct Collection {
    pub name: String,
    pub chunks: Vec<Chunk>,
}

impl Collection {
    pub fn new(name: impl Into<String>, chunks: Vec<Chunk>) -> Self {
        Self {
            name: name.into(),
            chunks,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
