//! Product resolution against the semantic index.

use std::sync::Arc;

use fieldvoice_core::chemical::{ChemicalMatch, ChemicalSearchResult};
use fieldvoice_core::context::ContextFrame;
use fieldvoice_core::error::ProviderError;
use fieldvoice_core::provider::EmbeddingRequest;
use fieldvoice_core::search::{KnnQuery, ProductIndex, SearchHit};
use fieldvoice_core::{Provider, Result};
use tracing::{debug, info, warn};

use super::fuzzy::FuzzyMatcher;
use super::query::build_semantic_query;

/// kNN search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub index: String,
    /// Results returned
    pub k: usize,
    /// Candidates examined per shard; larger improves recall
    pub num_candidates: usize,
    pub fuzzy_threshold: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            index: "khula_products".into(),
            k: 100,
            num_candidates: 1000,
            fuzzy_threshold: 0.5,
        }
    }
}

pub struct ChemicalResolver {
    provider: Arc<dyn Provider>,
    index: Arc<dyn ProductIndex>,
    embedding_model: String,
    settings: SearchSettings,
    matcher: FuzzyMatcher,
}

impl ChemicalResolver {
    pub fn new(
        provider: Arc<dyn Provider>,
        index: Arc<dyn ProductIndex>,
        embedding_model: impl Into<String>,
        settings: SearchSettings,
    ) -> Self {
        let matcher = FuzzyMatcher::new(settings.fuzzy_threshold);
        Self {
            provider,
            index,
            embedding_model: embedding_model.into(),
            settings,
            matcher,
        }
    }

    /// Resolve products for a named chemical and/or a crop-pest pair.
    ///
    /// With nothing to search for, the frame's chemical context is returned
    /// as-is (`None` when there is none) and no search is issued. A search
    /// that matches nothing and has no context to fall back on yields an
    /// unsuccessful result, not an error.
    pub async fn resolve(
        &self,
        query: &str,
        frame: &ContextFrame,
        crop: Option<&str>,
        pest: Option<&str>,
    ) -> Result<Option<ChemicalSearchResult>> {
        let query = query.trim();
        let crop = crop.map(str::trim).filter(|s| !s.is_empty());
        let pest = pest.map(str::trim).filter(|s| !s.is_empty());

        if query.is_empty() && crop.is_none() && pest.is_none() {
            debug!("Nothing to resolve, reusing chemical context");
            return Ok(frame.chemical.as_ref().map(ChemicalSearchResult::carried_over));
        }

        let semantic = build_semantic_query(query, crop, pest);
        let candidates = self.semantic_search(&semantic).await?;

        let needle = query.to_lowercase();
        let exact: Vec<ChemicalMatch> = candidates
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        if !exact.is_empty() {
            let best = candidates.first().cloned();
            info!(
                query,
                candidates = candidates.len(),
                products = exact.len(),
                "Exact product matches"
            );
            return Ok(Some(ChemicalSearchResult::found(query, exact, best)));
        }

        if !candidates.is_empty() {
            let ranked: Vec<ChemicalMatch> = self
                .matcher
                .rank(query, &candidates)
                .into_iter()
                .map(|(i, _)| candidates[i].clone())
                .collect();

            if !ranked.is_empty() {
                let best = ranked.first().cloned();
                info!(
                    query,
                    candidates = candidates.len(),
                    products = ranked.len(),
                    best = ?best.as_ref().map(|b| &b.name),
                    "Fuzzy product matches"
                );
                return Ok(Some(ChemicalSearchResult::found(query, ranked, best)));
            }
        }

        if let Some(context) = &frame.chemical {
            info!(query, "No product matches, staying with product in context");
            return Ok(Some(ChemicalSearchResult::found(
                query,
                context.products.clone(),
                frame.focus().cloned(),
            )));
        }

        info!(query, candidates = candidates.len(), "No products found");
        Ok(Some(ChemicalSearchResult::not_found(query)))
    }

    async fn semantic_search(&self, text: &str) -> Result<Vec<ChemicalMatch>> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![text.to_string()],
            })
            .await?;

        let vector = response.embeddings.into_iter().next().ok_or_else(|| {
            ProviderError::InvalidResponse("Embedding response contained no vectors".into())
        })?;

        let hits = self
            .index
            .knn_search(KnnQuery {
                index: self.settings.index.clone(),
                vector,
                k: self.settings.k,
                num_candidates: self.settings.num_candidates,
            })
            .await?;

        let total = hits.len();
        let matches: Vec<ChemicalMatch> = hits.into_iter().filter_map(SearchHit::into_match).collect();
        if matches.len() < total {
            warn!(skipped = total - matches.len(), "Dropped search hits without a product name");
        }
        debug!(semantic_query = text, hits = matches.len(), index = %self.index.name(), "Semantic search");

        Ok(matches)
    }
}
