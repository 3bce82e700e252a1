//! Data fusion — dispatches the sources an intent needs into one bundle.
//!
//! Every branch reads the same frame snapshot. A branch that runs and finds
//! nothing still contributes an (empty) entry; a branch that is not needed
//! contributes nothing. Collaborator failures propagate and fail the turn.

use std::sync::Arc;

use fieldvoice_core::bundle::{ConversationContext, DataBundle, SourceResult};
use fieldvoice_core::context::{ContextFrame, Entity};
use fieldvoice_core::intent::Intent;
use fieldvoice_core::message::{ConversationId, HistoryLine};
use fieldvoice_core::store::ConversationStore;
use fieldvoice_core::user::UserProfile;
use fieldvoice_core::vision::VisionResult;
use fieldvoice_core::weather::WeatherService;
use fieldvoice_core::Result;
use tracing::{debug, info};

use crate::chemical::ChemicalResolver;

/// Everything one fusion pass reads.
pub struct FusionInput<'a> {
    pub intent: &'a Intent,
    pub frame: &'a ContextFrame,
    pub conversation_id: &'a ConversationId,
    pub profile: &'a UserProfile,
    pub vision: Option<&'a VisionResult>,
}

pub struct FusionOrchestrator {
    resolver: ChemicalResolver,
    store: Arc<dyn ConversationStore>,
    weather: Option<Arc<dyn WeatherService>>,
    history_limit: usize,
}

impl FusionOrchestrator {
    pub fn new(
        resolver: ChemicalResolver,
        store: Arc<dyn ConversationStore>,
        history_limit: usize,
    ) -> Self {
        Self {
            resolver,
            store,
            weather: None,
            history_limit,
        }
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherService>) -> Self {
        self.weather = Some(weather);
        self
    }

    pub async fn fuse(&self, input: FusionInput<'_>) -> Result<DataBundle> {
        let FusionInput {
            intent,
            frame,
            conversation_id,
            profile,
            vision,
        } = input;
        let needs = &intent.needs;
        let targets = &intent.targets;
        let mut bundle = DataBundle::new();

        if needs.image {
            if let Some(vision) = vision {
                bundle.insert(SourceResult::Vision(vision.clone()));
            }
        }

        if needs.weather {
            match (profile.coordinates(), &self.weather) {
                (Some((lat, lon)), Some(weather)) => {
                    let forecast = weather.forecast(lat, lon).await?;
                    bundle.insert(SourceResult::Weather(forecast));
                }
                (None, _) => debug!(user_id = %profile.id, "Weather needed but user location unknown"),
                (_, None) => debug!("Weather needed but no weather service configured"),
            }
        }

        if needs.chemical() {
            let chemical_name = targets
                .chemical
                .clone()
                .or_else(|| frame.focus().map(|m| m.name.clone()))
                .filter(|n| !n.trim().is_empty());

            let crop = targets.crop.as_deref();
            let pest = targets.pest_or_disease.as_deref();

            if chemical_name.is_some() || crop.is_some() || pest.is_some() {
                let query = chemical_name.as_deref().unwrap_or("");
                if let Some(result) = self.resolver.resolve(query, frame, crop, pest).await? {
                    bundle.insert(SourceResult::Chemical(result));
                }
            } else {
                debug!("Chemical lookup needed but nothing to look up");
            }
        }

        if needs.db_crop {
            if let Some(crop) = &targets.crop {
                bundle.insert(SourceResult::Crop(Entity::named(crop)));
            }
        }

        if needs.db_pest {
            if let Some(pest) = &targets.pest_or_disease {
                bundle.insert(SourceResult::Pest(Entity::named(pest)));
            }
        }

        if needs.memory {
            let history = self
                .store
                .recent_history(conversation_id, self.history_limit)
                .await?;
            bundle.insert(SourceResult::Memory(history.iter().map(HistoryLine::from).collect()));
        }

        if let Some(context) = ConversationContext::from_frame(frame) {
            bundle.insert(SourceResult::ConversationContext(context));
        }

        info!(
            conversation_id = %conversation_id,
            intent = %intent.intent,
            sources = ?bundle.iter().map(|r| r.source_name()).collect::<Vec<_>>(),
            "Fused data bundle"
        );

        Ok(bundle)
    }
}
