//! User profile lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::CollaboratorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Both coordinates, when known.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn profile(&self, user_id: &str) -> Result<UserProfile, CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_need_both_values() {
        assert!(UserProfile::new("u").coordinates().is_none());
        let mut half = UserProfile::new("u");
        half.latitude = Some(-26.2);
        assert!(half.coordinates().is_none());
        assert_eq!(UserProfile::new("u").at(-26.2, 28.0).coordinates(), Some((-26.2, 28.0)));
    }
}
