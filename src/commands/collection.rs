//! Collection commands: create and list

use crate::error::Result;
use crate::session::Session;
use crate::store::CollectionStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// Outcome of creating a collection
#[derive(Debug, Clone, Serialize)]
pub struct CreateSummary {
    pub name: String,
    pub chunks: usize,
    pub sources: usize,
    pub embedding_model: String,
}

/// One row of the collection listing
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Ingest `paths` into collection `name`, replacing any previous one
pub async fn cmd_create(session: &Session, name: &str, paths: &[PathBuf]) -> Result<CreateSummary> {
    let collection = session.create_collection(name, paths).await?;

    let mut sources: Vec<&str> = collection.chunks.iter().map(|c| c.source.as_str()).collect();
    sources.sort_unstable();
    sources.dedup();

    Ok(CreateSummary {
        name: collection.name.clone(),
        chunks: collection.len(),
        sources: sources.len(),
        embedding_model: session.config().embedding_model()?,
    })
}

/// Stored collections, sorted by name, with whatever metadata can be read
pub fn cmd_list(store: &CollectionStore) -> Result<Vec<CollectionSummary>> {
    let mut names = store.list()?;
    names.sort();

    let mut summaries = Vec::new();
    for name in names {
        let metadata = match store.metadata(&name) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Could not read collection '{}': {}", name, e);
                None
            }
        };

        summaries.push(CollectionSummary {
            embedding_model: metadata.as_ref().and_then(|m| m.embedding_model.clone()),
            dimension: metadata.as_ref().map(|m| m.dimension),
            sources: metadata.as_ref().map(|m| m.sources.len()),
            created_at: metadata.as_ref().map(|m| m.created_at),
            name,
        });
    }
    Ok(summaries)
}

pub fn print_create_summary(summary: &CreateSummary) {
    println!(
        "✓ Created collection '{}': {} chunks from {} source(s) (model: {})",
        summary.name, summary.chunks, summary.sources, summary.embedding_model
    );
}

pub fn print_collections(collections: &[CollectionSummary]) {
    if collections.is_empty() {
        println!("No collections found.");
        return;
    }

    println!("Collections:");
    for collection in collections {
        let mut details = Vec::new();
        if let Some(model) = &collection.embedding_model {
            details.push(format!("model: {}", model));
        }
        if let Some(sources) = collection.sources {
            details.push(format!("{} source(s)", sources));
        }
        if let Some(created_at) = collection.created_at {
            details.push(format!("created {}", created_at.format("%Y-%m-%d %H:%M")));
        }

        if details.is_empty() {
            println!("  {}", collection.name);
        } else {
            println!("  {} ({})", collection.name, details.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::provider::mock::MockProvider;
    use tempfile::TempDir;

    fn session(tmp: &TempDir) -> Session {
        let mut config = Config::default();
        config.storage.collections_dir = tmp.path().join("collections").display().to_string();
        Session::new(config, Box::new(MockProvider::new()))
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.txt");
        let b = tmp.path().join("b.txt");
        std::fs::write(&a, "Alpha text.").unwrap();
        std::fs::write(&b, "Beta text.").unwrap();

        let session = session(&tmp);
        let summary = cmd_create(&session, "a", &[a.clone(), b.clone()]).await.unwrap();
        assert_eq!(summary.chunks, 2);
        assert_eq!(summary.sources, 2);
        assert_eq!(summary.embedding_model, "all-minilm");

        cmd_create(&session, "b", &[a]).await.unwrap();

        let listed = cmd_list(session.store()).unwrap();
        let names: Vec<&str> = listed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(listed[0].sources, Some(2));
        assert_eq!(listed[0].embedding_model.as_deref(), Some("all-minilm"));
    }

    #[test]
    fn test_list_tolerates_corrupt_artifact() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("collections");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("broken.json"), "not json").unwrap();

        let listed = cmd_list(session(&tmp).store()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "broken");
        assert!(listed[0].created_at.is_none());
    }
}
