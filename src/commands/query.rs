//! Query command implementation

use crate::error::{Error, Result};
use crate::models::Chunk;
use crate::rank::join_context;
use crate::session::Session;
use serde::Serialize;

/// Ranked retrieval output for one query
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutput {
    pub collection: String,
    pub query: String,
    pub k: usize,
    /// Top-k texts joined with spaces, as sent to the chat model
    pub context: String,
    /// Ranked chunks with `similarity` set to their score
    pub results: Vec<Chunk>,
}

/// Rank `collection` against `query` and keep the best `k`
pub async fn cmd_query(session: &Session, collection: &str, query: &str, k: usize) -> Result<QueryOutput> {
    let loaded = session
        .store()
        .load(collection)?
        .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;

    let ranked = session.search(query, &loaded, k).await?;
    let context = join_context(&ranked, k);
    let results = ranked.iter().map(|r| r.to_chunk()).collect();

    Ok(QueryOutput {
        collection: loaded.name.clone(),
        query: query.to_string(),
        k,
        context,
        results,
    })
}

pub fn print_query_output(output: &QueryOutput) {
    if output.results.is_empty() {
        println!("No results found.");
        return;
    }

    for (i, chunk) in output.results.iter().enumerate() {
        println!(
            "{}. [{:.4}] {}",
            i + 1,
            chunk.similarity,
            chunk.source
        );
    }
    println!();
    println!("{}", output.context);
}
