//! Similarity search over an in-memory collection
//!
//! This module handles:
//! - Dot-product scoring of chunk vectors against a query vector
//! - Stable descending ranking (ties keep collection order)
//! - Optional score floor
//! - Joining the top-k texts into a context string
//!
//! Ranking is pure: it returns a view over the collection and never touches
//! the stored chunks, so one loaded collection can serve concurrent searches.

use crate::error::Result;
use crate::models::Chunk;
use crate::provider::Embedder;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

/// A chunk paired with its score for one query
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoredChunk<'a> {
    #[serde(flatten)]
    pub chunk: &'a Chunk,
    pub score: f32,
}

impl ScoredChunk<'_> {
    /// Owned copy carrying this ranking's score
    pub fn to_chunk(&self) -> Chunk {
        Chunk {
            similarity: self.score,
            ..self.chunk.clone()
        }
    }
}

/// Raw dot product; extra components of the longer vector are ignored
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Score every chunk against the query vector and order by descending score
pub fn rank_chunks<'a>(query: &[f32], chunks: &'a [Chunk]) -> Vec<ScoredChunk<'a>> {
    let mut ranked: Vec<ScoredChunk<'a>> = chunks
        .iter()
        .map(|chunk| ScoredChunk {
            chunk,
            score: dot_product(&chunk.embedding, query),
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked
}

/// Drop results scoring below `min_score`
pub fn filter_by_score(ranked: Vec<ScoredChunk<'_>>, min_score: Option<f32>) -> Vec<ScoredChunk<'_>> {
    match min_score {
        Some(min) => ranked.into_iter().filter(|r| r.score >= min).collect(),
        None => ranked,
    }
}

/// Texts of the first `k` results, joined with single spaces
pub fn join_context(ranked: &[ScoredChunk<'_>], k: usize) -> String {
    ranked
        .iter()
        .take(k)
        .map(|r| r.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Query-time retrieval against one embedding model
pub struct Searcher<'a> {
    embedder: &'a Embedder<'a>,
    min_score: Option<f32>,
}

impl<'a> Searcher<'a> {
    pub fn new(embedder: &'a Embedder<'a>) -> Self {
        Self {
            embedder,
            min_score: None,
        }
    }

    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    /// Embed the query and return the top `k` chunks, best first.
    /// The query is embedded even when there is nothing to rank.
    pub async fn search<'c>(
        &self,
        query: &str,
        chunks: &'c [Chunk],
        k: usize,
    ) -> Result<Vec<ScoredChunk<'c>>> {
        let query_vector = self.embedder.embed(query).await?;

        let mut ranked = filter_by_score(rank_chunks(&query_vector, chunks), self.min_score);
        ranked.truncate(k);

        debug!(
            candidates = chunks.len(),
            returned = ranked.len(),
            top_score = ranked.first().map(|r| r.score),
            "Ranked chunks"
        );
        Ok(ranked)
    }

    /// Retrieve the context string for a query: top `k` texts joined with spaces
    pub async fn similarity_search(&self, query: &str, chunks: &[Chunk], k: usize) -> Result<String> {
        let ranked = self.search(query, chunks, k).await?;
        Ok(join_context(&ranked, k))
    }
}
