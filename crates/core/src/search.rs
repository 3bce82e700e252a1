//! Product index trait — approximate k-nearest-neighbor search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::chemical::ChemicalMatch;
use crate::error::SearchError;

/// A kNN request against a named index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnQuery {
    pub index: String,
    pub vector: Vec<f32>,
    /// Number of results to return
    pub k: usize,
    /// Candidate pool examined per shard; much larger than `k` for recall
    pub num_candidates: usize,
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SearchHit {
    /// The hit as a product match, or `None` when it carries no usable name.
    pub fn into_match(self) -> Option<ChemicalMatch> {
        let name = self.name.filter(|n| !n.trim().is_empty())?;
        Some(ChemicalMatch {
            id: self.id,
            name,
            score: self.score,
            description: self.description,
        })
    }
}

#[async_trait]
pub trait ProductIndex: Send + Sync {
    /// A human-readable name for this index backend.
    fn name(&self) -> &str;

    /// Return hits ordered by descending relevance score.
    async fn knn_search(&self, query: KnnQuery) -> Result<Vec<SearchHit>, SearchError>;
}
