//! Vision collaborators — image disease detection and the agronomy catalog.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chemical::ChemicalMatch;
use crate::context::Entity;
use crate::error::CollaboratorError;

/// Raw output of the image-classification model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub crop_id: Option<String>,
    pub disease_id: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// What an image told us, resolved against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pest: Option<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chemical: Option<ChemicalMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Invokes the image-classification model.
#[async_trait]
pub trait VisionService: Send + Sync {
    async fn detect_image_disease(
        &self,
        image_path: &Path,
        crops: &[Entity],
        pests: &[Entity],
    ) -> Result<Detection, CollaboratorError>;
}

/// The crop/pest/product reference data.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn crops(&self) -> Result<Vec<Entity>, CollaboratorError>;

    async fn pests(&self) -> Result<Vec<Entity>, CollaboratorError>;

    /// Products registered for a crop/pest pair, most relevant first.
    async fn chemicals_for(
        &self,
        crop_id: &str,
        pest_id: &str,
    ) -> Result<Vec<ChemicalMatch>, CollaboratorError>;
}
