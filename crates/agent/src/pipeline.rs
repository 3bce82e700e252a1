//! The turn pipeline — one user message in, one answer out.

use std::sync::Arc;

use fieldvoice_config::AppConfig;
use fieldvoice_core::bundle::DataBundle;
use fieldvoice_core::context::ContextUpdate;
use fieldvoice_core::error::TurnError;
use fieldvoice_core::intent::Intent;
use fieldvoice_core::media::SpeechSynthesizer;
use fieldvoice_core::message::{Conversation, ConversationId, Message};
use fieldvoice_core::search::ProductIndex;
use fieldvoice_core::store::ConversationStore;
use fieldvoice_core::user::UserDirectory;
use fieldvoice_core::vision::VisionResult;
use fieldvoice_core::weather::WeatherService;
use fieldvoice_core::{Provider, Result, Translator};
use tracing::{debug, info, warn};

use crate::answer::{AnswerGenerator, StateContext};
use crate::chemical::{ChemicalResolver, SearchSettings};
use crate::classifier::IntentClassifier;
use crate::context::{ContextFrameStore, FrameSnapshot, prepare_context_updates};
use crate::fusion::{FusionInput, FusionOrchestrator};
use crate::language::LanguageNormalizer;
use crate::locks::ConversationLocks;
use crate::notify::ThinkingRegistry;
use crate::vision::VisionStep;

const THINKING_MESSAGE: &str = "Thinking...";

/// Model and retrieval parameters for a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub working_language: String,
    /// Messages of history shown to the classifier and the memory source
    pub history_limit: usize,
    pub search: SearchSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            temperature: config.temperature,
            working_language: config.pipeline.working_language.clone(),
            history_limit: config.pipeline.history_limit,
            search: SearchSettings {
                index: config.search.index.clone(),
                k: config.search.k,
                num_candidates: config.search.num_candidates,
                fuzzy_threshold: config.search.fuzzy_threshold,
            },
        }
    }
}

/// The collaborators a pipeline talks to.
pub struct Services {
    pub provider: Arc<dyn Provider>,
    pub translator: Arc<dyn Translator>,
    pub store: Arc<dyn ConversationStore>,
    pub products: Arc<dyn ProductIndex>,
    pub users: Arc<dyn UserDirectory>,
    pub weather: Option<Arc<dyn WeatherService>>,
    pub vision: Option<VisionStep>,
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
    pub thinking: Option<ThinkingRegistry>,
}

impl Services {
    pub fn new(
        provider: Arc<dyn Provider>,
        translator: Arc<dyn Translator>,
        store: Arc<dyn ConversationStore>,
        products: Arc<dyn ProductIndex>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            provider,
            translator,
            store,
            products,
            users,
            weather: None,
            vision: None,
            speech: None,
            thinking: None,
        }
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherService>) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn with_vision(mut self, vision: VisionStep) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn with_thinking(mut self, thinking: ThinkingRegistry) -> Self {
        self.thinking = Some(thinking);
        self
    }
}

/// One incoming user message.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub message: String,
    pub user_id: String,
    /// Continue this conversation; a new one is started when absent
    pub conversation_id: Option<ConversationId>,
    /// Uploaded images; the first one is diagnosed
    pub image_artifact_ids: Vec<String>,
    /// Also synthesize the answer as audio
    pub voice_mode: bool,
}

impl TurnRequest {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn in_conversation(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }

    pub fn with_images(mut self, artifact_ids: Vec<String>) -> Self {
        self.image_artifact_ids = artifact_ids;
        self
    }

    pub fn with_voice(mut self) -> Self {
        self.voice_mode = true;
        self
    }
}

/// What one turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Answer in the user's language
    pub answer: String,
    /// The conversation as stored after the turn
    pub conversation: Conversation,
    pub data_bundle: DataBundle,
    /// Frame updates written by this turn, in order
    pub context_updates: Vec<ContextUpdate>,
    pub audio_path: Option<String>,
    pub intent: Intent,
    /// Detected language of the user's message
    pub language: String,
}

impl TurnOutcome {
    /// The image diagnosis this turn wrote, if any.
    pub fn vision(&self) -> Option<&VisionResult> {
        self.context_updates.iter().find_map(|u| match u {
            ContextUpdate::Vision(v) => Some(v),
            _ => None,
        })
    }
}

pub struct TurnPipeline {
    normalizer: LanguageNormalizer,
    frames: ContextFrameStore,
    classifier: IntentClassifier,
    fusion: FusionOrchestrator,
    answers: AnswerGenerator,
    store: Arc<dyn ConversationStore>,
    users: Arc<dyn UserDirectory>,
    vision: Option<VisionStep>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    thinking: Option<ThinkingRegistry>,
    locks: ConversationLocks,
    history_limit: usize,
}

impl TurnPipeline {
    pub fn new(services: Services, settings: PipelineSettings) -> Self {
        let resolver = ChemicalResolver::new(
            services.provider.clone(),
            services.products.clone(),
            &settings.embedding_model,
            settings.search.clone(),
        );

        let mut fusion =
            FusionOrchestrator::new(resolver, services.store.clone(), settings.history_limit);
        if let Some(weather) = services.weather {
            fusion = fusion.with_weather(weather);
        }

        Self {
            normalizer: LanguageNormalizer::new(services.translator, &settings.working_language),
            frames: ContextFrameStore::new(services.store.clone()),
            classifier: IntentClassifier::new(services.provider.clone(), &settings.model),
            fusion,
            answers: AnswerGenerator::new(services.provider, &settings.model, settings.temperature),
            store: services.store,
            users: services.users,
            vision: services.vision,
            speech: services.speech,
            thinking: services.thinking,
            locks: ConversationLocks::new(),
            history_limit: settings.history_limit,
        }
    }

    /// Share turn serialization with other pipelines over the same store.
    pub fn with_locks(mut self, locks: ConversationLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn locks(&self) -> &ConversationLocks {
        &self.locks
    }

    /// Process one user message end to end.
    ///
    /// Any collaborator failure fails the turn; a failed turn stores no
    /// assistant message. Classification failures are absorbed.
    pub async fn process_turn(&self, request: TurnRequest) -> Result<TurnOutcome> {
        let TurnRequest {
            message,
            user_id,
            conversation_id,
            image_artifact_ids,
            voice_mode,
        } = request;

        let profile = self.users.profile(&user_id).await?;
        let ensured = self
            .store
            .ensure_conversation(&profile.id, conversation_id.as_ref())
            .await?;

        let _turn = self.locks.acquire(&ensured.id).await;
        let mut conversation = self.store.get_conversation(&ensured.id).await?;
        let id = conversation.id.clone();

        info!(conversation_id = %id, user_id = %profile.id, images = image_artifact_ids.len(), "Turn started");

        if let Some(thinking) = &self.thinking {
            thinking.notify(&profile.id, THINKING_MESSAGE);
        }

        // ── Vision pre-step ──
        let vision = match image_artifact_ids.first() {
            Some(artifact_id) => {
                let step = self.vision.as_ref().ok_or(TurnError::VisionUnavailable)?;
                let result = step.run(artifact_id).await?;
                self.frames
                    .write(
                        &id,
                        &FrameSnapshot::of(&conversation),
                        &[ContextUpdate::Vision(result.clone())],
                    )
                    .await?;
                conversation = self.store.get_conversation(&id).await?;
                Some(result)
            }
            None => None,
        };

        // ── Normalize ──
        let text = self.normalizer.normalize(&message, &profile.id).await?;

        // ── Classify (history fetched before this message is saved) ──
        let history = self.store.recent_history(&id, self.history_limit).await?;
        let intent = self
            .classifier
            .classify(&text.working, &conversation.context_frame, &history, &profile.id)
            .await;

        let user_message = self
            .store
            .save_message(
                &id,
                Message::user(&text.original).with_translation(&text.working, &text.language),
            )
            .await?;

        if !image_artifact_ids.is_empty() {
            if let Some(step) = &self.vision {
                step.images()
                    .link_to_message(&image_artifact_ids, &user_message.id)
                    .await?;
            }
        }

        // ── Fuse ──
        let bundle = self
            .fusion
            .fuse(FusionInput {
                intent: &intent,
                frame: &conversation.context_frame,
                conversation_id: &id,
                profile: &profile,
                vision: vision.as_ref(),
            })
            .await?;

        // ── Answer ──
        let state = StateContext {
            user_id: &profile.id,
            conversation_id: &id,
            context_frame: &conversation.context_frame,
        };
        let working_answer = self
            .answers
            .answer(&text.working, &intent, &state, &bundle)
            .await?;
        let answer = self
            .normalizer
            .restore(&working_answer, &text.language, &profile.id)
            .await?;

        self.store
            .save_message(
                &id,
                Message::assistant(&answer).with_translation(&working_answer, &text.language),
            )
            .await?;

        // ── Remember ──
        let context_updates = prepare_context_updates(&bundle, vision.as_ref());
        self.frames
            .write(&id, &FrameSnapshot::of(&conversation), &context_updates)
            .await?;

        if conversation.title.is_none() {
            self.generate_title(&id, &user_message.content, &profile.id).await?;
        }

        let conversation = self.store.get_conversation(&id).await?;

        let audio_path = if voice_mode {
            self.speak(&answer).await?
        } else {
            None
        };

        info!(
            conversation_id = %id,
            intent = %intent.intent,
            language = %text.language,
            sources = bundle.len(),
            updates = context_updates.len(),
            "Turn complete"
        );

        Ok(TurnOutcome {
            answer,
            conversation,
            data_bundle: bundle,
            context_updates,
            audio_path,
            intent,
            language: text.language,
        })
    }

    async fn generate_title(&self, id: &ConversationId, first_message: &str, user_id: &str) -> Result<()> {
        match self.answers.title(first_message, user_id).await? {
            Some(title) => {
                debug!(conversation_id = %id, title = %title, "Conversation titled");
                self.store.update_title(id, &title).await?;
            }
            None => debug!(conversation_id = %id, "Empty title, leaving conversation untitled"),
        }
        Ok(())
    }

    async fn speak(&self, answer: &str) -> Result<Option<String>> {
        let Some(speech) = &self.speech else {
            warn!("Voice mode requested but no speech synthesizer configured");
            return Ok(None);
        };
        Ok(Some(speech.generate_audio(answer).await?))
    }
}
