//! Document ingestion: read, split, embed
//!
//! Reading problems degrade a document to zero chunks so one bad file never
//! aborts a batch. Provider failures are not absorbed: they stop ingestion.

use crate::chunk::TextSplitter;
use crate::error::{Error, Result};
use crate::models::Chunk;
use crate::parse::{has_extension, read_document};
use crate::progress::Progress;
use crate::provider::Embedder;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Turns documents into embedded chunks
pub struct Ingestor<'a> {
    splitter: TextSplitter,
    embedder: Embedder<'a>,
    extensions: Vec<String>,
}

impl<'a> Ingestor<'a> {
    pub fn new(splitter: TextSplitter, embedder: Embedder<'a>, extensions: Vec<String>) -> Self {
        Self {
            splitter,
            embedder,
            extensions,
        }
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model()
    }

    /// Ingest a single document; an unreadable or empty document yields no chunks
    pub async fn ingest_document(&self, path: &Path) -> Result<Vec<Chunk>> {
        let started = Instant::now();
        let source = path.to_string_lossy().to_string();

        let text = read_document(path);
        let pieces = self.splitter.split_text(&text);

        let progress = Progress::start(pieces.len(), &source);
        let mut chunks = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let embedding = self.embedder.embed(&piece).await?;
            chunks.push(Chunk::new(source.clone(), piece, embedding));
            progress.inc();
        }
        progress.finish("embedded");

        debug!(
            source = %source,
            chunks = chunks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ingested document"
        );
        Ok(chunks)
    }

    /// Ingest a file, or every supported file directly inside a directory
    pub async fn ingest_path(&self, path: &Path) -> Result<Vec<Chunk>> {
        if !path.is_dir() {
            return self.ingest_document(path).await;
        }

        let files = self.list_directory(path)?;
        info!(
            "Ingesting {} file(s) from {}",
            files.len(),
            path.display()
        );

        let mut chunks = Vec::new();
        for file in files {
            chunks.extend(self.ingest_document(&file).await?);
        }
        Ok(chunks)
    }

    /// Ingest several paths, concatenating their chunks in the order given
    pub async fn ingest_paths(&self, paths: &[PathBuf]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for path in paths {
            chunks.extend(self.ingest_path(path).await?);
        }
        Ok(chunks)
    }

    /// Supported files directly inside `dir`, in file-name order
    fn list_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "Failed to read directory {}: {}",
                    dir.display(),
                    e
                )))
            })?;

            if entry.file_type().is_file() && has_extension(entry.path(), &self.extensions) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}
