pub mod models;

use crate::doc_processor::document_stem;
use crate::embedding::VectorIndex;
use models::{DocumentEntry, DocumentSummary};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Registry {
    entries: HashMap<String, Arc<DocumentEntry>>,
    next_seq: u64,
}

/// Process-wide registry of indexed documents. Nothing is persisted.
#[derive(Default)]
pub struct DocumentStore {
    inner: RwLock<Registry>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an index under a fresh identifier of the form `pdf_<uuid>_<stem>`.
    pub async fn insert(&self, filename: &str, index: VectorIndex) -> Arc<DocumentEntry> {
        let stem = document_stem(filename);
        let mut registry = self.inner.write().await;

        let id = loop {
            let candidate = format!("pdf_{}_{}", uuid::Uuid::new_v4().simple(), stem);
            if !registry.entries.contains_key(&candidate) {
                break candidate;
            }
        };

        let seq = registry.next_seq;
        registry.next_seq += 1;

        let entry = Arc::new(DocumentEntry {
            id: id.clone(),
            filename: filename.to_string(),
            index,
            seq,
        });
        registry.entries.insert(id, Arc::clone(&entry));
        entry
    }

    pub async fn get(&self, id: &str) -> Option<Arc<DocumentEntry>> {
        self.inner.read().await.entries.get(id).cloned()
    }

    /// All documents in insertion order.
    pub async fn list(&self) -> Vec<DocumentSummary> {
        let registry = self.inner.read().await;
        let mut entries: Vec<&Arc<DocumentEntry>> = registry.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.iter().map(|e| e.summary()).collect()
    }

    pub async fn remove(&self, id: &str) -> Option<Arc<DocumentEntry>> {
        self.inner.write().await.entries.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
