use crate::embedding::VectorIndex;
use serde::{Deserialize, Serialize};

/// An indexed document held in memory.
#[derive(Debug)]
pub struct DocumentEntry {
    pub id: String,
    pub filename: String,
    pub index: VectorIndex,
    pub(crate) seq: u64,
}

impl DocumentEntry {
    pub fn chunks(&self) -> &[String] {
        self.index.chunks()
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            pdf_id: self.id.clone(),
            filename: self.filename.clone(),
            chunks_count: self.index.len(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DocumentSummary {
    pub pdf_id: String,
    pub filename: String,
    pub chunks_count: usize,
}
