//! The per-turn data bundle handed to answer generation.
//!
//! Each dispatched source contributes exactly one [`SourceResult`]. A source
//! that ran and found nothing is present with an empty payload; a source that
//! was not needed is absent. The two are never conflated.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::chemical::{ChemicalContext, ChemicalMatch, ChemicalSearchResult};
use crate::context::{ContextFrame, Entity};
use crate::message::HistoryLine;
use crate::vision::VisionResult;

/// Prior-turn entities re-exposed to answer generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chemical: Option<ChemicalContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_match: Option<ChemicalMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pest: Option<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<VisionResult>,
}

impl ConversationContext {
    /// Summarize a frame, if it carries any product context.
    pub fn from_frame(frame: &ContextFrame) -> Option<Self> {
        if !frame.has_chemical_context() {
            return None;
        }
        Some(Self {
            chemical: frame.chemical.clone(),
            best_match: frame.best_match.clone(),
            crop: frame.crop.clone(),
            pest: frame.pest.clone(),
            vision: frame.vision.clone(),
        })
    }
}

/// One source's contribution to the bundle.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceResult {
    Vision(VisionResult),
    Weather(serde_json::Value),
    Chemical(ChemicalSearchResult),
    Crop(Entity),
    Pest(Entity),
    Memory(Vec<HistoryLine>),
    ConversationContext(ConversationContext),
}

impl SourceResult {
    /// Key of this source in the serialized bundle.
    pub fn source_name(&self) -> &'static str {
        match self {
            SourceResult::Vision(_) => "vision",
            SourceResult::Weather(_) => "weather",
            SourceResult::Chemical(_) => "chemical",
            SourceResult::Crop(_) => "crop",
            SourceResult::Pest(_) => "pest",
            SourceResult::Memory(_) => "memory",
            SourceResult::ConversationContext(_) => "conversationContext",
        }
    }
}

/// The fused results of one turn, at most one entry per source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataBundle {
    results: Vec<SourceResult>,
}

impl DataBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source result, replacing an earlier one from the same source.
    pub fn insert(&mut self, result: SourceResult) {
        let name = result.source_name();
        match self.results.iter_mut().find(|r| r.source_name() == name) {
            Some(slot) => *slot = result,
            None => self.results.push(result),
        }
    }

    pub fn contains(&self, source_name: &str) -> bool {
        self.results.iter().any(|r| r.source_name() == source_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn vision(&self) -> Option<&VisionResult> {
        self.iter().find_map(|r| match r {
            SourceResult::Vision(v) => Some(v),
            _ => None,
        })
    }

    pub fn weather(&self) -> Option<&serde_json::Value> {
        self.iter().find_map(|r| match r {
            SourceResult::Weather(w) => Some(w),
            _ => None,
        })
    }

    pub fn chemical(&self) -> Option<&ChemicalSearchResult> {
        self.iter().find_map(|r| match r {
            SourceResult::Chemical(c) => Some(c),
            _ => None,
        })
    }

    pub fn crop(&self) -> Option<&Entity> {
        self.iter().find_map(|r| match r {
            SourceResult::Crop(c) => Some(c),
            _ => None,
        })
    }

    pub fn pest(&self) -> Option<&Entity> {
        self.iter().find_map(|r| match r {
            SourceResult::Pest(p) => Some(p),
            _ => None,
        })
    }

    pub fn memory(&self) -> Option<&[HistoryLine]> {
        self.iter().find_map(|r| match r {
            SourceResult::Memory(m) => Some(m.as_slice()),
            _ => None,
        })
    }

    pub fn conversation_context(&self) -> Option<&ConversationContext> {
        self.iter().find_map(|r| match r {
            SourceResult::ConversationContext(c) => Some(c),
            _ => None,
        })
    }
}

impl Serialize for DataBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len()))?;
        for result in &self.results {
            let key = result.source_name();
            match result {
                SourceResult::Vision(v) => map.serialize_entry(key, v)?,
                SourceResult::Weather(w) => map.serialize_entry(key, w)?,
                SourceResult::Chemical(c) => map.serialize_entry(key, c)?,
                SourceResult::Crop(c) => map.serialize_entry(key, c)?,
                SourceResult::Pest(p) => map.serialize_entry(key, p)?,
                SourceResult::Memory(m) => map.serialize_entry(key, m)?,
                SourceResult::ConversationContext(c) => map.serialize_entry(key, c)?,
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextUpdate;

    #[test]
    fn insert_replaces_same_source() {
        let mut bundle = DataBundle::new();
        bundle.insert(SourceResult::Crop(Entity::named("maize")));
        bundle.insert(SourceResult::Crop(Entity::named("wheat")));
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.crop().unwrap().name, "wheat");
    }

    #[test]
    fn empty_memory_is_distinct_from_absent_memory() {
        let mut bundle = DataBundle::new();
        assert!(bundle.memory().is_none());
        bundle.insert(SourceResult::Memory(vec![]));
        assert_eq!(bundle.memory().map(|m| m.len()), Some(0));

        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["memory"], serde_json::json!([]));
    }

    #[test]
    fn serializes_as_source_keyed_map() {
        let mut bundle = DataBundle::new();
        bundle.insert(SourceResult::Pest(Entity::named("aphids")));
        bundle.insert(SourceResult::Chemical(ChemicalSearchResult::not_found("x")));
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["pest"]["name"], "aphids");
        assert_eq!(json["chemical"]["success"], false);
        assert!(json.get("weather").is_none());
    }

    #[test]
    fn conversation_context_requires_product_context() {
        let mut frame = ContextFrame::default();
        frame.apply(&ContextUpdate::Crop(Entity::named("maize")));
        assert!(ConversationContext::from_frame(&frame).is_none());

        frame.apply(&ContextUpdate::Chemical(ChemicalSearchResult::found(
            "",
            vec![ChemicalMatch::new("1", "ProductX", 0.9)],
            None,
        )));
        let ctx = ConversationContext::from_frame(&frame).unwrap();
        assert_eq!(ctx.best_match.unwrap().name, "ProductX");
        assert_eq!(ctx.crop.unwrap().name, "maize");
    }
}
