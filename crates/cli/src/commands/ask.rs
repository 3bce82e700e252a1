//! `fieldvoice ask` — Single-message mode.

use fieldvoice_agent::{TurnOutcome, TurnRequest};
use fieldvoice_core::message::ConversationId;

use super::{SessionArgs, build_pipeline, load_config};

pub async fn run(
    message: String,
    session: SessionArgs,
    conversation: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let pipeline = build_pipeline(&config, &session, None).await?;

    let mut request = TurnRequest::new(&session.user, message);
    if let Some(id) = conversation {
        request = request.in_conversation(ConversationId(id));
    }

    if !json {
        eprint!("  Thinking...");
    }
    let outcome = pipeline.process_turn(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);
    } else {
        eprint!("\r              \r");
        println!("{}", outcome.answer);
        eprintln!();
        eprintln!("  conversation: {}", outcome.conversation.id);
    }

    Ok(())
}

pub fn outcome_json(outcome: &TurnOutcome) -> serde_json::Value {
    serde_json::json!({
        "answer": outcome.answer,
        "conversationId": outcome.conversation.id,
        "title": outcome.conversation.title,
        "language": outcome.language,
        "intent": outcome.intent,
        "dataBundle": outcome.data_bundle,
        "contextFrame": outcome.conversation.context_frame,
        "results": outcome
            .context_updates
            .iter()
            .map(|u| u.task().as_str())
            .collect::<Vec<_>>(),
        "audioPath": outcome.audio_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldvoice_core::bundle::{DataBundle, SourceResult};
    use fieldvoice_core::context::{ContextUpdate, Entity};
    use fieldvoice_core::intent::Intent;
    use fieldvoice_core::message::Conversation;

    #[test]
    fn json_outcome_names_tasks_and_sources() {
        let mut bundle = DataBundle::new();
        bundle.insert(SourceResult::Crop(Entity::named("maize")));
        let outcome = TurnOutcome {
            answer: "Plant in November.".into(),
            conversation: Conversation::new("farmer"),
            data_bundle: bundle,
            context_updates: vec![ContextUpdate::Crop(Entity::named("maize"))],
            audio_path: None,
            intent: Intent::fallback("when to plant maize"),
            language: "en".into(),
        };

        let json = outcome_json(&outcome);
        assert_eq!(json["answer"], "Plant in November.");
        assert_eq!(json["dataBundle"]["crop"]["name"], "maize");
        assert_eq!(json["results"], serde_json::json!(["crop"]));
        assert!(json["audioPath"].is_null());
    }
}
