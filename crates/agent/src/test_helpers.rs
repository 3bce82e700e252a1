//! Shared scripted collaborators for unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use fieldvoice_core::chemical::ChemicalMatch;
use fieldvoice_core::context::Entity;
use fieldvoice_core::error::{CollaboratorError, ProviderError, SearchError};
use fieldvoice_core::message::Message;
use fieldvoice_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage,
};
use fieldvoice_core::search::{KnnQuery, ProductIndex, SearchHit};
use fieldvoice_core::vision::{Catalog, Detection, VisionService};
use fieldvoice_core::weather::WeatherService;
use fieldvoice_core::media::{ImageStore, SpeechSynthesizer};
use fieldvoice_core::Translator;

/// A mock provider that returns a sequence of scripted completions.
///
/// Each call to `complete` returns the next response in the queue.
/// Panics if more calls are made than responses provided. `embed`
/// returns a fixed vector per input and records what it was asked to embed.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    call_count: Mutex<usize>,
    prompts: Mutex<Vec<String>>,
    embedded: Mutex<Vec<String>>,
    embed_error: Option<ProviderError>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
            prompts: Mutex::new(Vec::new()),
            embedded: Mutex::new(Vec::new()),
            embed_error: None,
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(make_text_response(t))).collect())
    }

    /// The first completion fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Every embedding call fails with `error`.
    pub fn with_embed_error(mut self, error: ProviderError) -> Self {
        self.embed_error = Some(error);
        self
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Prompt text of every completion request, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Every text passed to `embed`, in call order.
    pub fn embedded(&self) -> Vec<String> {
        self.embedded.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        if *count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                *count,
                responses.len()
            );
        }

        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);

        let response = responses[*count].clone();
        *count += 1;
        response
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        if let Some(error) = &self.embed_error {
            return Err(error.clone());
        }
        self.embedded.lock().unwrap().extend(request.inputs.iter().cloned());
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|_| vec![0.1, 0.2, 0.3]).collect(),
            model: request.model,
            usage: None,
        })
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Detects a fixed language and "translates" by tagging the text.
pub struct ScriptedTranslator {
    language: String,
    error: Option<ProviderError>,
    translations: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedTranslator {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.into(),
            error: None,
            translations: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            language: String::new(),
            error: Some(error),
            translations: Mutex::new(Vec::new()),
        }
    }

    /// `(text, from, to)` of every translate call.
    pub fn translations(&self) -> Vec<(String, String, String)> {
        self.translations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for ScriptedTranslator {
    async fn detect_language(&self, _text: &str, _user_id: &str) -> Result<String, ProviderError> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(self.language.clone()),
        }
    }

    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        _user_id: &str,
    ) -> Result<String, ProviderError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        self.translations
            .lock()
            .unwrap()
            .push((text.into(), from.into(), to.into()));
        Ok(format!("[{from}->{to}] {text}"))
    }
}

/// A product index that returns the same ranked hits for every query.
pub struct FixedHitIndex {
    hits: Vec<SearchHit>,
    fail: bool,
    queries: Mutex<Vec<KnnQuery>>,
}

impl FixedHitIndex {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: Vec::new(),
            fail: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<KnnQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn search_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl ProductIndex for FixedHitIndex {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn knn_search(&self, query: KnnQuery) -> Result<Vec<SearchHit>, SearchError> {
        let k = query.k;
        self.queries.lock().unwrap().push(query);
        if self.fail {
            return Err(SearchError::Request("index offline".into()));
        }
        Ok(self.hits.iter().take(k).cloned().collect())
    }
}

pub fn hit(id: &str, name: &str, score: f64) -> SearchHit {
    SearchHit {
        id: id.into(),
        score,
        name: Some(name.into()),
        description: Some(format!("{name} product label")),
    }
}

/// Weather service returning a fixed payload.
pub struct FixedWeather {
    payload: serde_json::Value,
    calls: Mutex<Vec<(f64, f64)>>,
}

impl FixedWeather {
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            payload,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(f64, f64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherService for FixedWeather {
    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<serde_json::Value, CollaboratorError> {
        self.calls.lock().unwrap().push((latitude, longitude));
        Ok(self.payload.clone())
    }
}

/// Vision model returning a fixed detection.
pub struct FixedVision {
    detection: Detection,
    paths: Mutex<Vec<PathBuf>>,
}

impl FixedVision {
    pub fn new(crop_id: Option<&str>, disease_id: Option<&str>, reasoning: &str) -> Self {
        Self {
            detection: Detection {
                crop_id: crop_id.map(String::from),
                disease_id: disease_id.map(String::from),
                reasoning: Some(reasoning.into()),
            },
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionService for FixedVision {
    async fn detect_image_disease(
        &self,
        image_path: &Path,
        _crops: &[Entity],
        _pests: &[Entity],
    ) -> Result<Detection, CollaboratorError> {
        self.paths.lock().unwrap().push(image_path.to_path_buf());
        Ok(self.detection.clone())
    }
}

/// An in-memory catalog.
#[derive(Default)]
pub struct StaticCatalog {
    pub crops: Vec<Entity>,
    pub pests: Vec<Entity>,
    pub chemicals: HashMap<(String, String), Vec<ChemicalMatch>>,
}

impl StaticCatalog {
    pub fn tomato_blight() -> Self {
        let mut chemicals = HashMap::new();
        chemicals.insert(
            ("c1".to_string(), "d1".to_string()),
            vec![
                ChemicalMatch::new("p9", "BlightStop", 1.0),
                ChemicalMatch::new("p8", "Copper Guard", 1.0),
            ],
        );
        Self {
            crops: vec![Entity::with_id("c1", "tomato"), Entity::with_id("c2", "maize")],
            pests: vec![Entity::with_id("d1", "early blight")],
            chemicals,
        }
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn crops(&self) -> Result<Vec<Entity>, CollaboratorError> {
        Ok(self.crops.clone())
    }

    async fn pests(&self) -> Result<Vec<Entity>, CollaboratorError> {
        Ok(self.pests.clone())
    }

    async fn chemicals_for(&self, crop_id: &str, pest_id: &str) -> Result<Vec<ChemicalMatch>, CollaboratorError> {
        Ok(self
            .chemicals
            .get(&(crop_id.to_string(), pest_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Image store backed by a map of artifact id → path.
#[derive(Default)]
pub struct MapImageStore {
    paths: HashMap<String, PathBuf>,
    links: Mutex<Vec<(Vec<String>, String)>>,
}

impl MapImageStore {
    pub fn with(mut self, artifact_id: &str, path: &str) -> Self {
        self.paths.insert(artifact_id.into(), PathBuf::from(path));
        self
    }

    pub fn links(&self) -> Vec<(Vec<String>, String)> {
        self.links.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for MapImageStore {
    async fn resolve_local_path(&self, artifact_id: &str) -> Result<Option<PathBuf>, CollaboratorError> {
        Ok(self.paths.get(artifact_id).cloned())
    }

    async fn link_to_message(&self, artifact_ids: &[String], message_id: &str) -> Result<(), CollaboratorError> {
        self.links
            .lock()
            .unwrap()
            .push((artifact_ids.to_vec(), message_id.to_string()));
        Ok(())
    }
}

/// Speech synthesizer that records what it spoke.
#[derive(Default)]
pub struct RecordingSpeech {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeech {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSpeech {
    async fn generate_audio(&self, text: &str) -> Result<String, CollaboratorError> {
        let mut spoken = self.spoken.lock().unwrap();
        spoken.push(text.to_string());
        Ok(format!("/tmp/audio-{}.mp3", spoken.len()))
    }
}
