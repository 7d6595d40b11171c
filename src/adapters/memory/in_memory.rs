//! In-memory implementation of the durable memory store.
//!
//! Relevance is keyword overlap between the query and each stored snippet:
//! cheap, deterministic, and good enough for the recall volumes the engine
//! needs. A vector-backed store can replace this behind the same port.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{MemoryRecord, MemoryStore, MemoryStoreError};

#[derive(Debug, Clone)]
struct StoredSnippet {
    text: String,
    metadata: HashMap<String, String>,
    stored_at: Timestamp,
}

/// Keyword-overlap memory store keyed by owner.
#[derive(Debug, Default)]
pub struct InMemoryMemoryStore {
    snippets: Arc<RwLock<HashMap<UserId, Vec<StoredSnippet>>>>,
}

impl InMemoryMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snippets stored for an owner.
    pub async fn len_for(&self, owner: &UserId) -> usize {
        self.snippets
            .read()
            .await
            .get(owner)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// Lowercased word set, punctuation stripped.
fn keywords(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_string)
        .collect()
}

/// Fraction of query keywords present in the snippet.
fn overlap_score(query: &HashSet<String>, snippet: &str) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let snippet_words = keywords(snippet);
    let hits = query.iter().filter(|w| snippet_words.contains(*w)).count();
    hits as f64 / query.len() as f64
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn store(
        &self,
        owner: &UserId,
        text: &str,
        metadata: HashMap<String, String>,
    ) -> Result<(), MemoryStoreError> {
        let mut map = self.snippets.write().await;
        map.entry(owner.clone()).or_default().push(StoredSnippet {
            text: text.to_string(),
            metadata,
            stored_at: Timestamp::now(),
        });
        Ok(())
    }

    async fn query(
        &self,
        owner: &UserId,
        text: &str,
        k: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryStoreError> {
        let query_words = keywords(text);
        let map = self.snippets.read().await;
        let Some(snippets) = map.get(owner) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<MemoryRecord> = snippets
            .iter()
            .map(|s| MemoryRecord {
                text: s.text.clone(),
                metadata: s.metadata.clone(),
                score: overlap_score(&query_words, &s.text),
                stored_at: s.stored_at.clone(),
            })
            .filter(|r| r.score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> UserId {
        UserId::new("memory-owner").unwrap()
    }

    #[tokio::test]
    async fn query_returns_overlapping_snippets_ranked() {
        let store = InMemoryMemoryStore::new();
        store
            .store(&owner(), "user wants to bench press 225 lbs", HashMap::new())
            .await
            .unwrap();
        store
            .store(&owner(), "user enjoys cooking pasta", HashMap::new())
            .await
            .unwrap();

        let records = store
            .query(&owner(), "bench press progress", 5)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].text.contains("bench press"));
        assert!(records[0].score > 0.0);
    }

    #[tokio::test]
    async fn query_respects_k_and_owner_isolation() {
        let store = InMemoryMemoryStore::new();
        for i in 0..5 {
            store
                .store(&owner(), &format!("running session number {i}"), HashMap::new())
                .await
                .unwrap();
        }

        let records = store.query(&owner(), "running session", 2).await.unwrap();
        assert_eq!(records.len(), 2);

        let other = UserId::new("someone-else").unwrap();
        assert!(store.query(&other, "running", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unrelated_query_matches_nothing() {
        let store = InMemoryMemoryStore::new();
        store
            .store(&owner(), "learning rust ownership", HashMap::new())
            .await
            .unwrap();
        assert!(store.query(&owner(), "gardening", 5).await.unwrap().is_empty());
    }
}
