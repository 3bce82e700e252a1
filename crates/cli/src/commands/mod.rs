//! Subcommands and the wiring they share.

pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod doctor;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use fieldvoice_agent::{PipelineSettings, Services, ThinkingRegistry, TurnPipeline};
use fieldvoice_config::AppConfig;
use fieldvoice_core::search::ProductIndex;
use fieldvoice_core::store::ConversationStore;
use fieldvoice_core::user::UserProfile;
use fieldvoice_memory::{InMemoryProductIndex, InMemoryStore, InMemoryUserDirectory, SqliteStore};
use fieldvoice_providers::{ElasticProductIndex, LlmTranslator, provider_from_config};
use tracing::info;

/// Who is talking and where they are.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// User id the conversation belongs to
    #[arg(short, long, default_value = "local")]
    pub user: String,

    /// Farm latitude (enables weather lookups together with --lon)
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Farm longitude
    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Search a local JSON product file instead of the configured index
    #[arg(long)]
    pub products: Option<PathBuf>,
}

impl SessionArgs {
    pub fn profile(&self) -> UserProfile {
        let profile = UserProfile::new(&self.user);
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => profile.at(lat, lon),
            _ => profile,
        }
    }
}

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    FIELDVOICE_API_KEY=sk-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    Ok(config)
}

pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn ConversationStore>, Box<dyn std::error::Error>> {
    if config.store.backend == "memory" {
        return Ok(Arc::new(InMemoryStore::new()));
    }

    let path = config.store.sqlite_path();
    if let Some(parent) = std::path::Path::new(&path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Arc::new(SqliteStore::new(&path).await?))
}

async fn open_products(
    config: &AppConfig,
    session: &SessionArgs,
) -> Result<Arc<dyn ProductIndex>, Box<dyn std::error::Error>> {
    if let Some(path) = &session.products {
        let index = InMemoryProductIndex::new();
        let count = index.load_json(&config.search.index, path).await?;
        info!(products = count, path = %path.display(), "Loaded local product index");
        return Ok(Arc::new(index));
    }

    let mut index = ElasticProductIndex::new(&config.search.url);
    if let Some(key) = &config.search.api_key {
        index = index.with_api_key(key);
    }
    Ok(Arc::new(index))
}

/// Wire a pipeline to the configured collaborators.
pub async fn build_pipeline(
    config: &AppConfig,
    session: &SessionArgs,
    thinking: Option<ThinkingRegistry>,
) -> Result<TurnPipeline, Box<dyn std::error::Error>> {
    let provider = provider_from_config(config)?;
    let translator = Arc::new(LlmTranslator::new(provider.clone(), &config.model));
    let store = open_store(config).await?;
    let products = open_products(config, session).await?;
    let users = Arc::new(InMemoryUserDirectory::new().with_profile(session.profile()));

    let mut services = Services::new(provider, translator, store, products, users);
    if let Some(thinking) = thinking {
        services = services.with_thinking(thinking);
    }

    Ok(TurnPipeline::new(services, PipelineSettings::from_config(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(lat: Option<f64>, lon: Option<f64>) -> SessionArgs {
        SessionArgs {
            user: "farmer".into(),
            lat,
            lon,
            products: None,
        }
    }

    #[test]
    fn profile_needs_both_coordinates() {
        assert!(session(Some(-26.2), None).profile().coordinates().is_none());
        assert_eq!(
            session(Some(-26.2), Some(28.0)).profile().coordinates(),
            Some((-26.2, 28.0))
        );
    }

    #[tokio::test]
    async fn memory_backend_opens_without_disk() {
        let mut config = AppConfig::default();
        config.store.backend = "memory".into();
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.name(), "in_memory");
    }

    #[tokio::test]
    async fn sqlite_backend_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("conversations.db");
        let mut config = AppConfig::default();
        config.store.path = Some(path.display().to_string());

        let store = open_store(&config).await.unwrap();
        assert_eq!(store.name(), "sqlite");
        assert!(path.exists());
    }
}
