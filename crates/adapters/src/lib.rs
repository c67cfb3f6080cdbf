//! social-autopilot adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `store`: in-memory repositories and the SQLite social account store
//! - `llm`: OpenAI-compatible content generators (OpenAI, Groq)
//! - `oauth`: per-vendor OAuth providers
//! - `graph`: Instagram Graph API proxy client
//! - `publisher`: simulated delivery and engagement

mod accounts_sqlite;
mod store_memory;

pub mod graph;
pub mod llm;
pub mod oauth;
pub mod publisher;

/// Re-exports for storage adapters
pub mod store {
    pub use crate::accounts_sqlite::SqliteSocialAccountStore;
    pub use crate::store_memory::{
        InMemoryAutoReplyLog, InMemoryClientRepository, InMemoryPostStore,
        InMemorySocialAccountStore,
    };
}
