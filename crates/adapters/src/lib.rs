//! gentle-post adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `sentiment`: Sentiment classifier adapters (Hugging Face inference, stub)
//! - `llm`: Tone rewriter adapters (Gemini, OpenAI, Anthropic, Ollama, etc.)
//! - `store`: SQLite and in-memory post stores

mod store_memory;
mod store_sqlite;

pub mod llm;
pub mod sentiment;

/// Re-exports for post store adapters
pub mod store {
    pub use crate::store_memory::InMemoryPostStore;
    pub use crate::store_sqlite::SqlitePostStore;
}

use reqwest::Client;
use std::time::Duration;

/// Build the shared HTTP client used by the HTTP adapters
pub(crate) fn http_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}
