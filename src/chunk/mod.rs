//! Text chunking
//!
//! Splits raw document text into overlapping chunks of bounded size:
//! - Cuts at the largest semantic boundary that keeps pieces under the limit
//! - Merges small pieces greedily, carrying up to `overlap` characters forward
//! - Counts characters, not bytes, and never splits inside a UTF-8 sequence
//! - Is deterministic for identical input and parameters

mod boundaries;

pub use boundaries::*;

use crate::config::ChunkConfig;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use tracing::debug;

/// Recursive character splitter
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a splitter; `chunk_overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk size must be > 0".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &ChunkConfig) -> Result<Self> {
        Self::new(config.max_chars, config.overlap_chars)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into ordered, non-empty, whitespace-trimmed chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, &Boundary::HIERARCHY)
    }

    fn split_recursive(&self, text: &str, boundaries: &[Boundary]) -> Vec<String> {
        let (boundary, finer) = pick_boundary(text, boundaries);

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in split_at_boundary(text, boundary) {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge_pieces(&pending));
                pending.clear();
            }

            if finer.is_empty() {
                if let Some(chunk) = join_pieces([piece]) {
                    debug!(
                        chars = char_len(&chunk),
                        limit = self.chunk_size,
                        "Emitting oversized unit with no smaller boundary"
                    );
                    chunks.push(chunk);
                }
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge_pieces(&pending));
        }

        chunks
    }

    /// Greedily merge consecutive pieces (each shorter than the chunk size)
    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                if let Some(chunk) = join_pieces(window.iter().map(|(p, _)| *p)) {
                    chunks.push(chunk);
                }

                // Keep a tail no longer than the overlap that still leaves room for `piece`
                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        if let Some(chunk) = join_pieces(window.iter().map(|(p, _)| *p)) {
            chunks.push(chunk);
        }

        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: crate::config::default_chunk_max_chars(),
            chunk_overlap: crate::config::default_chunk_overlap(),
        }
    }
}

/// First boundary present in the text, plus the finer boundaries after it
fn pick_boundary<'b>(text: &str, boundaries: &'b [Boundary]) -> (Boundary, &'b [Boundary]) {
    for (i, boundary) in boundaries.iter().enumerate() {
        if boundary.separator().is_empty() {
            return (*boundary, &[]);
        }
        if boundary.occurs_in(text) {
            return (*boundary, &boundaries[i + 1..]);
        }
    }

    // Nothing matched: the coarsest remaining split leaves the text whole
    let last = boundaries.last().copied().unwrap_or(Boundary::Character);
    (last, &[])
}

fn join_pieces<'a>(pieces: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let joined: String = pieces.into_iter().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
