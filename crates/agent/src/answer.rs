//! Answer and title generation.

use std::sync::Arc;

use fieldvoice_core::bundle::DataBundle;
use fieldvoice_core::context::ContextFrame;
use fieldvoice_core::intent::Intent;
use fieldvoice_core::message::ConversationId;
use fieldvoice_core::provider::ProviderRequest;
use fieldvoice_core::{Provider, Result};
use serde::Serialize;
use tracing::debug;

/// Shown when the model returns nothing.
pub const EMPTY_ANSWER: &str = "Sorry, I could not generate an answer.";

const ANSWER_RULES: &str = "\
CRITICAL RULES:
- If DATA_FROM_TOOLS contains empty arrays (like \"memory\":[]), empty objects, or null values for the requested information, you MUST explicitly state that there is no data available.
- DO NOT create placeholder responses like \"[Product A]\", \"[Product B]\", \"[Recommended Product]\", or any bracketed placeholders.
- DO NOT make up or invent product names, recommendations, or any information that is not explicitly provided in DATA_FROM_TOOLS.
- If the user asks about products or recommendations and the memory array is empty, say something like: \"I don't have any record of products we've discussed previously. Could you tell me more about what you're looking for?\"
- Give clear agricultural advice only when you have actual data.
- Include safety and weather-aware notes when relevant.
- Use simple farmer-friendly language.
- Do NOT mention AI tools, models, or reasoning.
- Make the max number of words 100.
- Always try to keep the conversation going. You can ask followup questions of the product or of the context.
- If the user asks about a product and we need to give a name explicitly, give the best suggestion from DATA_FROM_TOOLS.chemical.products.";

/// Who and where the turn is happening, as shown to the answer model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateContext<'a> {
    pub user_id: &'a str,
    pub conversation_id: &'a ConversationId,
    pub context_frame: &'a ContextFrame,
}

pub struct AnswerGenerator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
}

impl AnswerGenerator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
        }
    }

    /// Generate the working-language answer from the fused bundle.
    pub async fn answer(
        &self,
        query: &str,
        intent: &Intent,
        state: &StateContext<'_>,
        bundle: &DataBundle,
    ) -> Result<String> {
        let prompt = build_answer_prompt(query, intent, state, bundle)?;
        let request =
            ProviderRequest::prompt(&self.model, prompt, self.temperature).for_user(state.user_id);
        let response = self.provider.complete(request).await?;

        let text = response.text();
        if text.is_empty() {
            debug!("Empty answer from model");
            return Ok(EMPTY_ANSWER.to_string());
        }
        Ok(text.to_string())
    }

    /// A short conversation title from the first user message.
    /// `None` if the model produced nothing usable.
    pub async fn title(&self, first_message: &str, user_id: &str) -> Result<Option<String>> {
        let prompt = format!(
            "Write a title of at most six words for a farming conversation that starts with \
             the message below. Reply with the title only, no quotes.\n\nMESSAGE:\n{first_message}"
        );
        let request = ProviderRequest::prompt(&self.model, prompt, 0.3).for_user(user_id);
        let response = self.provider.complete(request).await?;

        let title = response
            .text()
            .trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
            .to_string();
        Ok((!title.is_empty()).then_some(title))
    }
}

pub fn build_answer_prompt(
    query: &str,
    intent: &Intent,
    state: &StateContext<'_>,
    bundle: &DataBundle,
) -> Result<String> {
    Ok(format!(
        "You are FieldVoice AI. Produce a friendly agricultural answer. Don't add any greetings \
         rather just keep it conversational.\n\n\
         USER_MESSAGE:\n{query}\n\n\
         INTENT:\n{}\n\n\
         STATE_CONTEXT:\n{}\n\n\
         DATA_FROM_TOOLS:\n{}\n\n\
         {ANSWER_RULES}",
        serde_json::to_string(intent)?,
        serde_json::to_string(state)?,
        serde_json::to_string(bundle)?,
    ))
}
