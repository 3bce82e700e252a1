//! Elasticsearch product index.
//!
//! Issues approximate kNN queries against the `embedding` field of a product
//! index and maps hits to [`SearchHit`]s. Product documents carry
//! `id`, `name` and `searchText` in `_source`.

use async_trait::async_trait;
use fieldvoice_core::error::SearchError;
use fieldvoice_core::search::{KnnQuery, ProductIndex, SearchHit};
use serde::Deserialize;
use tracing::{debug, warn};

pub struct ElasticProductIndex {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ElasticProductIndex {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = crate::http_client(std::time::Duration::from_secs(30), "product search");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            client,
        }
    }

    /// Authenticate with an Elasticsearch API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn knn_body(query: &KnnQuery) -> serde_json::Value {
        serde_json::json!({
            "knn": {
                "field": "embedding",
                "query_vector": query.vector,
                "k": query.k,
                "num_candidates": query.num_candidates,
            },
            "size": query.k,
            "_source": ["id", "name", "searchText"],
        })
    }

    fn parse_hits(response: SearchResponse) -> Vec<SearchHit> {
        response
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let source = hit.source.unwrap_or_default();
                let id = source
                    .id
                    .as_ref()
                    .and_then(id_string)
                    .or(hit.id)
                    .unwrap_or_default();
                SearchHit {
                    id,
                    score: hit.score.unwrap_or(0.0),
                    name: source.name,
                    description: source.search_text,
                }
            })
            .collect()
    }
}

/// Product ids are stored as strings or numbers depending on the ingest job.
fn id_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl ProductIndex for ElasticProductIndex {
    fn name(&self) -> &str {
        "elasticsearch"
    }

    async fn knn_search(&self, query: KnnQuery) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!("{}/{}/_search", self.base_url, query.index);

        debug!(index = %query.index, k = query.k, num_candidates = query.num_candidates, "kNN search");

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&Self::knn_body(&query));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("ApiKey {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Search backend returned error");
            return Err(SearchError::Request(format!("HTTP {}: {body}", status.as_u16())));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        Ok(Self::parse_hits(parsed))
    }
}

// --- Elasticsearch response types (internal) ---

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: Option<ProductSource>,
}

#[derive(Debug, Default, Deserialize)]
struct ProductSource {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "searchText", default)]
    search_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knn_body_shape() {
        let body = ElasticProductIndex::knn_body(&KnnQuery {
            index: "khula_products".into(),
            vector: vec![0.1, 0.2],
            k: 100,
            num_candidates: 1000,
        });
        assert_eq!(body["knn"]["field"], "embedding");
        assert_eq!(body["knn"]["k"], 100);
        assert_eq!(body["knn"]["num_candidates"], 1000);
        assert_eq!(body["knn"]["query_vector"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn hits_map_source_fields() {
        let data = r#"{
            "hits": {"hits": [
                {"_id": "doc1", "_score": 0.93, "_source": {"id": 42, "name": "AphidAway", "searchText": "Systemic aphicide"}},
                {"_id": "doc2", "_score": 0.71, "_source": {"name": "Unnumbered"}},
                {"_id": "doc3", "_score": 0.50}
            ]}
        }"#;
        let parsed: SearchResponse = serde_json::from_str(data).unwrap();
        let hits = ElasticProductIndex::parse_hits(parsed);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "42");
        assert_eq!(hits[0].name.as_deref(), Some("AphidAway"));
        assert_eq!(hits[0].description.as_deref(), Some("Systemic aphicide"));
        assert_eq!(hits[1].id, "doc2");
        assert!(hits[2].name.is_none());
    }

    #[test]
    fn empty_hits_parse() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"hits": {"hits": []}}"#).unwrap();
        assert!(ElasticProductIndex::parse_hits(parsed).is_empty());
    }

    #[tokio::test]
    async fn unreachable_backend_is_request_error() {
        let index = ElasticProductIndex::new("http://127.0.0.1:1");
        let err = index
            .knn_search(KnnQuery {
                index: "p".into(),
                vector: vec![0.0],
                k: 1,
                num_candidates: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Request(_)));
    }
}
