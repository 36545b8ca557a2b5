//! CLI commands implementation

pub mod chat;
pub mod collection;
pub mod init;
pub mod query;

pub use chat::*;
pub use collection::*;
pub use init::*;
pub use query::*;
