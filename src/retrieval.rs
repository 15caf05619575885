// Similarity retrieval over the catalog: an embeddings API client plus an
// in-memory cosine top-k index, cached to disk so the corpus is embedded
// once per catalog, not once per boot.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embeddings request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("embeddings API returned {got} vectors for {expected} inputs")]
    MismatchedBatch { expected: usize, got: usize },
    #[error("failed to read or write the index cache: {0}")]
    Io(#[from] std::io::Error),
    #[error("index cache is not valid JSON: {0}")]
    Cache(#[from] serde_json::Error),
}

// ── Embeddings client ─────────────────────────────────────────────────

/// Thin client for an OpenAI-shaped `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(api_base: &str, model: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Embed a batch of texts, preserving input order.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let url = format!("{}/embeddings", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?
            .error_for_status()?;

        let mut body: EmbeddingResponse = response.json().await?;
        if body.data.len() != texts.len() {
            return Err(RetrievalError::MismatchedBatch {
                expected: texts.len(),
                got: body.data.len(),
            });
        }
        body.data.sort_by_key(|row| row.index);
        Ok(body.data.into_iter().map(|row| row.embedding).collect())
    }
}

// ── Vector index ──────────────────────────────────────────────────────

/// Immutable document/vector pairs built once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VectorIndex {
    pub documents: Vec<String>,
    pub vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Return the `k` documents most similar to the query vector,
    /// best match first.
    pub fn top_k(&self, query: &[f32], k: usize) -> Vec<String> {
        let mut scored: Vec<(f32, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (cosine_similarity(query, v), i))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .map(|(_, i)| self.documents[i].clone())
            .collect()
    }

    /// Load a cached index, returning None when there is no usable cache
    /// for the given document set (missing file, parse failure, or the
    /// catalog changed since the cache was written).
    pub fn load_cached(path: &Path, documents: &[String]) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        let index: VectorIndex = serde_json::from_str(&raw).ok()?;
        if index.documents == documents && index.vectors.len() == index.documents.len() {
            Some(index)
        } else {
            None
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), RetrievalError> {
        let raw = serde_json::to_string(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// ── Retriever ─────────────────────────────────────────────────────────

/// Top-k similarity lookup used to enrich concept prompts with reference
/// games. Built once at startup; queries embed the query string and rank
/// the catalog by cosine similarity.
#[derive(Debug, Clone)]
pub struct Retriever {
    client: EmbeddingClient,
    index: VectorIndex,
    k: usize,
}

impl Retriever {
    /// Build a retriever over the given documents, reusing the on-disk
    /// cache when it still matches the document set.
    pub async fn build(
        client: EmbeddingClient,
        documents: Vec<String>,
        cache_path: &Path,
        k: usize,
    ) -> Result<Self, RetrievalError> {
        let index = match VectorIndex::load_cached(cache_path, &documents) {
            Some(index) => {
                tracing::info!("loaded embedding index cache ({} documents)", index.len());
                index
            }
            None => {
                tracing::info!("embedding {} catalog documents", documents.len());
                let vectors = client.embed(&documents).await?;
                let index = VectorIndex { documents, vectors };
                if let Err(e) = index.save(cache_path) {
                    tracing::warn!("could not write embedding index cache: {e}");
                }
                index
            }
        };
        Ok(Self { client, index, k })
    }

    /// The `k` catalog documents most similar to the query string.
    pub async fn query(&self, text: &str) -> Result<Vec<String>, RetrievalError> {
        let vectors = self.client.embed(&[text.to_string()]).await?;
        let query = vectors.into_iter().next().ok_or(
            RetrievalError::MismatchedBatch {
                expected: 1,
                got: 0,
            },
        )?;
        Ok(self.index.top_k(&query, self.k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_basic() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), -1.0);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    fn test_index() -> VectorIndex {
        VectorIndex {
            documents: vec!["war game".into(), "farm game".into(), "space game".into()],
            vectors: vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.9, 0.1, 0.0],
            ],
        }
    }

    #[test]
    fn test_top_k_ranks_by_similarity() {
        let index = test_index();
        let hits = index.top_k(&[1.0, 0.0, 0.0], 2);
        assert_eq!(hits, vec!["war game".to_string(), "space game".to_string()]);
    }

    #[test]
    fn test_top_k_larger_than_index() {
        let index = test_index();
        let hits = index.top_k(&[0.0, 1.0, 0.0], 10);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0], "farm game");
    }

    #[test]
    fn test_cache_round_trip_and_invalidation() {
        let index = test_index();
        let path = std::env::temp_dir().join(format!(
            "boardsmith-index-test-{}.json",
            std::process::id()
        ));
        index.save(&path).unwrap();

        let loaded = VectorIndex::load_cached(&path, &index.documents).unwrap();
        assert_eq!(loaded.documents, index.documents);
        assert_eq!(loaded.vectors, index.vectors);

        // A changed catalog invalidates the cache
        let changed = vec!["war game".to_string()];
        assert!(VectorIndex::load_cached(&path, &changed).is_none());

        std::fs::remove_file(&path).unwrap();
        assert!(VectorIndex::load_cached(&path, &index.documents).is_none());
    }
}
