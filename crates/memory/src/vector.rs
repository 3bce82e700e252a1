//! In-process vector index for product search.
//!
//! Brute-force cosine ranking over a fixed product list. Serves offline
//! catalogs and tests; production deployments use the Elasticsearch index.

use async_trait::async_trait;
use fieldvoice_core::error::SearchError;
use fieldvoice_core::search::{KnnQuery, ProductIndex, SearchHit};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// A product document with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedProduct {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "searchText")]
    pub search_text: Option<String>,
    pub embedding: Vec<f32>,
}

/// Products grouped by index name.
#[derive(Default)]
pub struct InMemoryProductIndex {
    products: RwLock<Vec<(String, IndexedProduct)>>,
}

impl InMemoryProductIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, index: impl Into<String>, product: IndexedProduct) {
        self.products.write().await.push((index.into(), product));
    }

    /// Load a JSON array of products into `index`.
    pub async fn load_json(&self, index: &str, path: &Path) -> Result<usize, SearchError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SearchError::Request(format!("{}: {e}", path.display())))?;
        let products: Vec<IndexedProduct> = serde_json::from_str(&content)
            .map_err(|e| SearchError::InvalidResponse(format!("{}: {e}", path.display())))?;
        let count = products.len();
        let mut guard = self.products.write().await;
        guard.extend(products.into_iter().map(|p| (index.to_string(), p)));
        Ok(count)
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

#[async_trait]
impl ProductIndex for InMemoryProductIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn knn_search(&self, query: KnnQuery) -> Result<Vec<SearchHit>, SearchError> {
        let products = self.products.read().await;

        // Exact search: every product is scored, so `num_candidates` does not apply.
        let mut scored: Vec<(f32, &IndexedProduct)> = products
            .iter()
            .filter(|(index, _)| *index == query.index)
            .map(|(_, p)| (cosine_similarity(&p.embedding, &query.vector), p))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(query.k);

        Ok(scored
            .into_iter()
            .map(|(score, p)| SearchHit {
                id: p.id.clone(),
                score: score as f64,
                name: Some(p.name.clone()),
                description: p.search_text.clone(),
            })
            .collect())
    }
}
