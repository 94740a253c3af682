use crate::llm::{LlmClient, LlmError};
use futures::{StreamExt, TryStreamExt};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// In-memory vector index over the chunks of one document.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    model: String,
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Embed `chunks` in batches of `batch_size` and index them in order.
    /// At most `concurrency` batch requests are in flight at once.
    pub async fn build(
        client: &dyn LlmClient,
        api_key: &str,
        chunks: Vec<String>,
        model: &str,
        batch_size: usize,
        concurrency: usize,
    ) -> Result<Self, LlmError> {
        let requests: Vec<_> = chunks
            .chunks(batch_size.max(1))
            .map(|batch| client.embed(api_key, batch, model))
            .collect();
        let batches: Vec<Vec<Vec<f32>>> = futures::stream::iter(requests)
            .buffered(concurrency.max(1))
            .try_collect()
            .await?;
        let embeddings: Vec<Vec<f32>> = batches.into_iter().flatten().collect();

        if embeddings.len() != chunks.len() {
            return Err(LlmError::Parse(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        Ok(Self {
            model: model.to_string(),
            chunks,
            embeddings,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Top `k` chunks for a precomputed query embedding, most similar first.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Vec<(&str, f32)> {
        search_similar(query_embedding, &self.embeddings, k)
            .into_iter()
            .map(|(i, score)| (self.chunks[i].as_str(), score))
            .collect()
    }

    /// Embed `query` with the model this index was built with, then search.
    pub async fn search_by_text(
        &self,
        client: &dyn LlmClient,
        api_key: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<String>, LlmError> {
        let query_embeddings = client
            .embed(api_key, &[query.to_string()], &self.model)
            .await?;
        let query_emb = query_embeddings
            .first()
            .ok_or_else(|| LlmError::Parse("no embedding returned for query".to_string()))?;

        Ok(self
            .search(query_emb, k)
            .into_iter()
            .map(|(chunk, _)| chunk.to_string())
            .collect())
    }
}

/// Cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Rank `embeddings` against the query, returning `(position, score)` pairs.
/// The sort is stable, so equal scores keep insertion order.
pub fn search_similar(
    query_embedding: &[f32],
    embeddings: &[Vec<f32>],
    top_k: usize,
) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = embeddings
        .iter()
        .enumerate()
        .map(|(i, emb)| (i, cosine_similarity(query_embedding, emb)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}
