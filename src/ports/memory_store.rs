//! Memory store port - long-term semantic recall per owner.
//!
//! Separate from the bounded in-process conversation window: this store keeps
//! durable snippets across conversations and answers similarity queries. All
//! writes are advisory; the pipeline treats store failures as non-fatal.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{Timestamp, UserId};

/// Port for durable, queryable memory.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Stores one text snippet for an owner with optional metadata.
    async fn store(
        &self,
        owner: &UserId,
        text: &str,
        metadata: HashMap<String, String>,
    ) -> Result<(), MemoryStoreError>;

    /// Returns up to `k` snippets most relevant to the query text.
    async fn query(
        &self,
        owner: &UserId,
        text: &str,
        k: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryStoreError>;
}

/// A stored memory snippet with its relevance score for the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub text: String,
    pub metadata: HashMap<String, String>,
    pub score: f64,
    pub stored_at: Timestamp,
}

/// Errors from the memory store.
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("memory store unavailable: {0}")]
    Unavailable(String),

    #[error("memory store rejected the request: {0}")]
    Rejected(String),
}
