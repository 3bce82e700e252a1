//! The per-conversation context frame.
//!
//! A frame holds the last-known value for each task kind plus a
//! denormalized `bestMatch`: the product currently "in focus" for pronoun
//! resolution. Frames are written only through [`ContextFrame::apply`],
//! which enforces last-write-wins per task and the trimmed chemical shape.

use serde::{Deserialize, Serialize};

use crate::chemical::{ChemicalContext, ChemicalMatch, ChemicalSearchResult};
use crate::message::HistoryLine;
use crate::vision::VisionResult;

/// The fixed set of task kinds a frame can remember.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Vision,
    Crop,
    Pest,
    Chemical,
    Weather,
    Memory,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Vision => "vision",
            TaskKind::Crop => "crop",
            TaskKind::Pest => "pest",
            TaskKind::Chemical => "chemical",
            TaskKind::Weather => "weather",
            TaskKind::Memory => "memory",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named crop or pest, optionally tied to a catalog id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

impl Entity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
        }
    }
}

/// One frame write: a task kind and the data to store under it.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextUpdate {
    Vision(VisionResult),
    Crop(Entity),
    Pest(Entity),
    Chemical(ChemicalSearchResult),
    Weather(serde_json::Value),
    Memory(Vec<HistoryLine>),
}

impl ContextUpdate {
    pub fn task(&self) -> TaskKind {
        match self {
            ContextUpdate::Vision(_) => TaskKind::Vision,
            ContextUpdate::Crop(_) => TaskKind::Crop,
            ContextUpdate::Pest(_) => TaskKind::Pest,
            ContextUpdate::Chemical(_) => TaskKind::Chemical,
            ContextUpdate::Weather(_) => TaskKind::Weather,
            ContextUpdate::Memory(_) => TaskKind::Memory,
        }
    }
}

/// Entities carried over from earlier turns of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<VisionResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Entity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pest: Option<Entity>,

    /// Always the trimmed `{success, bestMatch, products[{id,name,score}]}` shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chemical: Option<ChemicalContext>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Vec<HistoryLine>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_match: Option<ChemicalMatch>,
}

impl ContextFrame {
    pub fn is_empty(&self) -> bool {
        self.vision.is_none()
            && self.crop.is_none()
            && self.pest.is_none()
            && self.chemical.is_none()
            && self.weather.is_none()
            && self.memory.is_none()
            && self.best_match.is_none()
    }

    /// The product in focus: the denormalized pointer, else the chemical entry's.
    pub fn focus(&self) -> Option<&ChemicalMatch> {
        self.best_match
            .as_ref()
            .or_else(|| self.chemical.as_ref().and_then(|c| c.best_match.as_ref()))
    }

    /// Whether earlier turns left any product context behind.
    pub fn has_chemical_context(&self) -> bool {
        self.chemical.is_some() || self.best_match.is_some()
    }

    /// Replace the value stored for the update's task.
    pub fn apply(&mut self, update: &ContextUpdate) {
        match update {
            ContextUpdate::Vision(v) => self.vision = Some(v.clone()),
            ContextUpdate::Crop(c) => self.crop = Some(c.clone()),
            ContextUpdate::Pest(p) => self.pest = Some(p.clone()),
            ContextUpdate::Chemical(result) => {
                let trimmed = ChemicalContext::from_result(result);
                self.best_match = trimmed.best_match.clone();
                self.chemical = Some(trimmed);
            }
            ContextUpdate::Weather(w) => self.weather = Some(w.clone()),
            ContextUpdate::Memory(m) => self.memory = Some(m.clone()),
        }
    }

    pub fn apply_all<'a>(&mut self, updates: impl IntoIterator<Item = &'a ContextUpdate>) {
        for update in updates {
            self.apply(update);
        }
    }
}
