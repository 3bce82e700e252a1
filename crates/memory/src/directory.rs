//! Fixed-table user directory.

use async_trait::async_trait;
use fieldvoice_core::error::CollaboratorError;
use fieldvoice_core::user::{UserDirectory, UserProfile};
use std::collections::HashMap;

/// Serves registered profiles. Unknown users get a profile without a
/// location, so location-dependent sources are skipped for them.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    profiles: HashMap<String, UserProfile>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profiles.insert(profile.id.clone(), profile);
        self
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn profile(&self, user_id: &str) -> Result<UserProfile, CollaboratorError> {
        Ok(self
            .profiles
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserProfile::new(user_id)))
    }
}
