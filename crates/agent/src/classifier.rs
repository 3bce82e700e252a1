//! Intent classification.
//!
//! The classifier renders recent history, the current query and the context
//! hint into one prompt, asks the generation model for an [`Intent`] as JSON,
//! and falls back to [`Intent::fallback`] on any failure. It never returns
//! an error.

use std::sync::Arc;

use fieldvoice_core::context::ContextFrame;
use fieldvoice_core::intent::Intent;
use fieldvoice_core::message::Message;
use fieldvoice_core::provider::ProviderRequest;
use fieldvoice_core::Provider;
use tracing::{debug, warn};

use crate::context::build_context_hint;

pub const CLASSIFIER_PROMPT: &str = r#"You are the intent classifier for FieldVoice, an assistant for smallholder and commercial farmers.
Classify the user's query and decide which data sources are needed to answer it.

INTENTS (pick exactly one):
- chemical_lookup: the user names a product, or asks which product treats a pest/disease on a crop
- chemical_followup: the user asks about a product already discussed ("it", "this product")
- crop_info: questions about growing, planting or caring for a crop
- pest_identification: questions about a pest or disease, its symptoms or lifecycle
- image_diagnosis: the user refers to a photo they sent
- weather: questions about rain, temperature, spraying conditions or planting windows
- memory_recall: the user asks what was said or recommended earlier
- general_question: anything else

TARGETS: copy entity names exactly as the user wrote them (English). Use null when not mentioned.
- crop: e.g. "maize", "cabbage", "tomato"
- pestOrDisease: e.g. "aphids", "fall armyworm", "early blight"
- chemical: a product name, only if the user names one

NEEDS (true only when required):
- image: the answer depends on an attached photo
- weather: the answer depends on the local forecast
- vector_search: a product search by meaning (pest/crop treatment questions)
- db_crop: crop details are needed
- db_pest: pest or disease details are needed
- db_chemical: product details are needed
- memory: earlier messages of this conversation are needed

QUERY: the product name to search for when one is named, otherwise the user's query restated briefly.

OUTPUT SHAPE:
{"intent": "...", "targets": {"crop": null, "pestOrDisease": null, "chemical": null}, "needs": {"image": false, "weather": false, "vector_search": false, "db_crop": false, "db_pest": false, "db_chemical": false, "memory": false}, "query": "..."}"#;

pub struct IntentClassifier {
    provider: Arc<dyn Provider>,
    model: String,
}

impl IntentClassifier {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Classify `query`. `history` must not contain the message being classified.
    pub async fn classify(
        &self,
        query: &str,
        frame: &ContextFrame,
        history: &[Message],
        user_id: &str,
    ) -> Intent {
        let prompt = build_classifier_prompt(query, frame, history);
        let request = ProviderRequest::prompt(&self.model, prompt, 0.0).for_user(user_id);

        let text = match self.provider.complete(request).await {
            Ok(response) => response.text().to_string(),
            Err(e) => {
                warn!(error = %e, "Intent generation failed, using default intent");
                return Intent::fallback(query);
            }
        };

        match parse_intent(&text) {
            Ok(mut intent) => {
                if intent.query.trim().is_empty() {
                    intent.query = query.to_string();
                }
                debug!(
                    intent = %intent.intent,
                    crop = ?intent.targets.crop,
                    pest = ?intent.targets.pest_or_disease,
                    chemical = ?intent.targets.chemical,
                    "Classified intent"
                );
                intent
            }
            Err(e) => {
                warn!(error = %e, output = %text, "Unparseable intent, using default intent");
                Intent::fallback(query)
            }
        }
    }
}

/// Render the classifier prompt.
pub fn build_classifier_prompt(query: &str, frame: &ContextFrame, history: &[Message]) -> String {
    let mut prompt = String::from(CLASSIFIER_PROMPT);

    if !history.is_empty() {
        let lines: Vec<String> = history
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.working_text()))
            .collect();
        prompt.push_str("\n\nCONVERSATION HISTORY (for context):\n");
        prompt.push_str(&lines.join("\n"));
    }

    prompt.push_str(&format!("\n\nCURRENT USER QUERY: \"{query}\""));

    if let Some(hint) = build_context_hint(frame) {
        prompt.push_str(&format!("\n\nCONTEXT: {hint}"));
    }

    prompt.push_str("\n\nReturn ONLY valid JSON:");
    prompt
}

/// Parse model output, tolerating markdown code fences around the JSON.
pub fn parse_intent(text: &str) -> Result<Intent, serde_json::Error> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    let cleaned = if cleaned.is_empty() { "{}" } else { cleaned };
    let value: serde_json::Value = serde_json::from_str(cleaned)?;
    if !value.is_object() {
        return Err(serde::de::Error::custom("intent must be a JSON object"));
    }
    serde_json::from_value(value)
}
