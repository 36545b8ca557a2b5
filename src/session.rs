//! Per-process context threaded through every operation
//!
//! A session owns the configuration, the provider, the collection store, the
//! active collection (at most one) and the conversation memory.

use crate::chat::{stream_reply, Conversation, Reply};
use crate::chunk::TextSplitter;
use crate::config::Config;
use crate::error::Result;
use crate::ingest::Ingestor;
use crate::models::Collection;
use crate::provider::{create_provider, ensure_model, Embedder, Provider};
use crate::rank::{ScoredChunk, Searcher};
use crate::store::CollectionStore;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct Session {
    config: Config,
    provider: Box<dyn Provider>,
    store: CollectionStore,
    active: Option<Collection>,
    conversation: Conversation,
    chat_model: String,
}

impl Session {
    pub fn new(config: Config, provider: Box<dyn Provider>) -> Self {
        let store = CollectionStore::from_config(&config);
        let conversation = Conversation::new(config.chat.system_prompt.clone());
        let chat_model = config.chat.model.clone();

        Self {
            config,
            provider,
            store,
            active: None,
            conversation,
            chat_model,
        }
    }

    /// Build the provider named by the configuration; unknown backends fail here
    pub fn from_config(config: Config) -> Result<Self> {
        let provider = create_provider(&config)?;
        Ok(Self::new(config, provider))
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn embedder(&self) -> Result<Embedder<'_>> {
        Embedder::from_config(self.provider.as_ref(), &self.config)
    }

    pub fn ingestor(&self) -> Result<Ingestor<'_>> {
        Ok(Ingestor::new(
            TextSplitter::from_config(&self.config.chunk)?,
            self.embedder()?,
            self.config.ingest.extensions.clone(),
        ))
    }

    /// Pull the chat model if the backend lacks it
    pub async fn ensure_chat_model(&self) -> Result<()> {
        ensure_model(self.provider.as_ref(), &self.chat_model).await
    }

    /// Ingest `paths` and persist them as collection `name`
    pub async fn create_collection(&self, name: &str, paths: &[PathBuf]) -> Result<Collection> {
        let ingestor = self.ingestor()?;
        self.store.create(name, paths, &ingestor).await
    }

    /// Load a collection and make it active. A missing collection is reported
    /// and leaves the current active collection in place.
    pub fn activate(&mut self, name: &str) -> Result<bool> {
        match self.store.load(name)? {
            Some(collection) => {
                info!(
                    "Collection '{}' activated ({} chunks)",
                    collection.name,
                    collection.len()
                );
                self.active = Some(collection);
                Ok(true)
            }
            None => {
                warn!("Collection '{}' not found", name);
                Ok(false)
            }
        }
    }

    /// Drop the active collection, returning its name
    pub fn deactivate(&mut self) -> Option<String> {
        self.active.take().map(|c| c.name)
    }

    pub fn active_collection(&self) -> Option<&Collection> {
        self.active.as_ref()
    }

    /// Stored collection names, sorted for display
    pub fn list_collections(&self) -> Result<Vec<String>> {
        let mut names = self.store.list()?;
        names.sort();
        Ok(names)
    }

    /// Ranked chunks of `collection` for `query`
    pub async fn search<'c>(
        &self,
        query: &str,
        collection: &'c Collection,
        k: usize,
    ) -> Result<Vec<ScoredChunk<'c>>> {
        let embedder = self.embedder()?;
        Searcher::new(&embedder)
            .with_min_score(self.config.query.min_score)
            .search(query, &collection.chunks, k)
            .await
    }

    /// Context string for `query` from `collection`
    pub async fn similarity_search(
        &self,
        query: &str,
        collection: &Collection,
        k: usize,
    ) -> Result<String> {
        let embedder = self.embedder()?;
        Searcher::new(&embedder)
            .with_min_score(self.config.query.min_score)
            .similarity_search(query, &collection.chunks, k)
            .await
    }

    /// Start over with only the system prompt
    pub fn clear_conversation(&mut self) {
        self.conversation.clear();
    }

    /// One chat turn: retrieve context from the active collection, stream the
    /// reply to `out`, then remember the turn (also when `cancel` cut it short).
    pub async fn chat_turn<W, F>(
        &mut self,
        query: &str,
        k: usize,
        out: &mut W,
        cancel: F,
    ) -> Result<Reply>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        let context = match &self.active {
            Some(collection) => Some(self.similarity_search(query, collection, k).await?),
            None => None,
        };

        let messages = self.conversation.request(query, context.as_deref());
        let stream = self.provider.chat(&self.chat_model, &messages).await?;
        let reply = stream_reply(stream, out, cancel).await?;

        self.conversation.record(query, &reply.text);
        Ok(reply)
    }
}
