//! Image diagnosis pre-step.

use std::sync::Arc;

use fieldvoice_core::context::Entity;
use fieldvoice_core::error::TurnError;
use fieldvoice_core::media::ImageStore;
use fieldvoice_core::vision::{Catalog, VisionResult, VisionService};
use fieldvoice_core::Result;
use tracing::info;

/// Resolves an uploaded image into crop, pest and a recommended product.
#[derive(Clone)]
pub struct VisionStep {
    images: Arc<dyn ImageStore>,
    vision: Arc<dyn VisionService>,
    catalog: Arc<dyn Catalog>,
}

impl VisionStep {
    pub fn new(
        images: Arc<dyn ImageStore>,
        vision: Arc<dyn VisionService>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        Self {
            images,
            vision,
            catalog,
        }
    }

    pub fn images(&self) -> &Arc<dyn ImageStore> {
        &self.images
    }

    /// Diagnose one image artifact. A missing artifact is a turn error.
    pub async fn run(&self, artifact_id: &str) -> Result<VisionResult> {
        let path = self
            .images
            .resolve_local_path(artifact_id)
            .await?
            .ok_or_else(|| TurnError::ImageNotFound(artifact_id.to_string()))?;

        let crops = self.catalog.crops().await?;
        let pests = self.catalog.pests().await?;

        let detection = self
            .vision
            .detect_image_disease(&path, &crops, &pests)
            .await?;

        let crop = lookup(&crops, detection.crop_id.as_deref());
        let pest = lookup(&pests, detection.disease_id.as_deref());

        let chemical = match (&detection.crop_id, &detection.disease_id) {
            (Some(crop_id), Some(disease_id)) => self
                .catalog
                .chemicals_for(crop_id, disease_id)
                .await?
                .into_iter()
                .next(),
            _ => None,
        };

        info!(
            artifact_id,
            crop = ?crop.as_ref().map(|c| &c.name),
            pest = ?pest.as_ref().map(|p| &p.name),
            chemical = ?chemical.as_ref().map(|c| &c.name),
            "Image diagnosed"
        );

        Ok(VisionResult {
            crop,
            pest,
            chemical,
            reasoning: detection.reasoning,
        })
    }
}

fn lookup(entities: &[Entity], id: Option<&str>) -> Option<Entity> {
    let id = id?;
    entities.iter().find(|e| e.id.as_deref() == Some(id)).cloned()
}
