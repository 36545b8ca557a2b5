//! minirag: chat with local documents
//!
//! Documents are split into overlapping chunks, embedded through a model
//! provider and persisted as named collections. At question time the active
//! collection is ranked against the query and the best chunks are handed to
//! the chat model as context.

pub mod chat;
pub mod chunk;
pub mod commands;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod parse;
pub mod progress;
pub mod provider;
pub mod rank;
pub mod session;
pub mod store;

pub use error::{Error, Result};
