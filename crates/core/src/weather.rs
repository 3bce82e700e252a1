//! Weather collaborator.

use async_trait::async_trait;
use crate::error::CollaboratorError;

#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Forecast for a coordinate. The payload is passed to answer generation as-is.
    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<serde_json::Value, CollaboratorError>;
}
