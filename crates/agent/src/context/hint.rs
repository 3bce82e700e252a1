//! Grounding hint built from a context frame.
//!
//! The hint tells the classifier what earlier turns established, and pins
//! pronouns ("it", "this product") to the product in focus.

use fieldvoice_core::context::ContextFrame;

/// One sentence per known entity, wrapped in the scoping instruction.
/// `None` when the frame holds nothing worth mentioning.
pub fn build_context_hint(frame: &ContextFrame) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    if let Some(vision) = &frame.vision {
        if let Some(crop) = vision.crop.as_ref().filter(|c| !c.name.is_empty()) {
            parts.push(format!("Image analysis detected crop: {}.", crop.name));
        }
        if let Some(pest) = vision.pest.as_ref().filter(|p| !p.name.is_empty()) {
            parts.push(format!("Image analysis detected disease/pest: {}.", pest.name));
        }
        if let Some(chemical) = vision.chemical.as_ref().filter(|c| !c.name.is_empty()) {
            parts.push(format!(
                "Recommended chemical from image analysis: {}.",
                chemical.name
            ));
        }
        if let Some(reasoning) = vision.reasoning.as_deref().filter(|r| !r.is_empty()) {
            parts.push(format!("Image analysis reasoning: {reasoning}."));
        }
    }

    if let Some(crop) = frame.crop.as_ref().filter(|c| !c.name.is_empty()) {
        parts.push(format!("Current crop in context: {}.", crop.name));
    }

    if let Some(focus) = frame.focus().filter(|m| !m.name.is_empty()) {
        let name = &focus.name;
        parts.push(format!(
            "Current chemical in context: {name}. When the user refers to \"it\", \
             \"this product\", \"this chemical\", \"the product\", or \"the chemical\", \
             they are referring to {name}. For follow-up questions about this chemical \
             (e.g., \"what pests does it target?\", \"what can I use it for?\", \
             \"what crops can I use this product on?\"), use the chemical_followup intent \
             and rely on the conversation context. Only use chemical_lookup when searching \
             for a NEW chemical by name."
        ));
    }

    if parts.is_empty() {
        return None;
    }

    Some(format!(
        "IMPORTANT CONTEXT: {} Only respond about these specific items mentioned in context. \
         Do NOT mention other crops, pests, or chemicals unless the user explicitly asks about them.",
        parts.join(" ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldvoice_core::chemical::ChemicalMatch;
    use fieldvoice_core::context::Entity;
    use fieldvoice_core::vision::VisionResult;

    #[test]
    fn empty_frame_has_no_hint() {
        assert!(build_context_hint(&ContextFrame::default()).is_none());
    }

    #[test]
    fn weather_only_frame_has_no_hint() {
        let frame = ContextFrame {
            weather: Some(serde_json::json!({"temp": 21})),
            ..ContextFrame::default()
        };
        assert!(build_context_hint(&frame).is_none());
    }

    #[test]
    fn focus_product_pins_pronouns() {
        let frame = ContextFrame {
            best_match: Some(ChemicalMatch::new("1", "ProductX", 0.9)),
            ..ContextFrame::default()
        };
        let hint = build_context_hint(&frame).unwrap();
        assert!(hint.starts_with("IMPORTANT CONTEXT:"));
        assert!(hint.contains("Current chemical in context: ProductX"));
        assert!(hint.contains("they are referring to ProductX"));
        assert!(hint.contains("chemical_followup"));
        assert!(hint.ends_with("unless the user explicitly asks about them."));
    }

    #[test]
    fn vision_and_crop_sentences_in_order() {
        let frame = ContextFrame {
            vision: Some(VisionResult {
                crop: Some(Entity::named("tomato")),
                pest: Some(Entity::named("early blight")),
                chemical: Some(ChemicalMatch::new("5", "BlightStop", 1.0)),
                reasoning: Some("concentric leaf rings".into()),
            }),
            crop: Some(Entity::named("tomato")),
            ..ContextFrame::default()
        };
        let hint = build_context_hint(&frame).unwrap();

        let order = [
            "Image analysis detected crop: tomato.",
            "Image analysis detected disease/pest: early blight.",
            "Recommended chemical from image analysis: BlightStop.",
            "Image analysis reasoning: concentric leaf rings.",
            "Current crop in context: tomato.",
        ];
        let positions: Vec<usize> = order.iter().map(|s| hint.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!hint.contains("Current chemical in context"));
    }

    #[test]
    fn focus_falls_back_to_chemical_entry() {
        let frame = ContextFrame {
            chemical: Some(fieldvoice_core::ChemicalContext {
                success: true,
                best_match: Some(ChemicalMatch::new("2", "ProductY", 0.7)),
                products: vec![],
            }),
            ..ContextFrame::default()
        };
        assert!(build_context_hint(&frame).unwrap().contains("ProductY"));
    }
}
