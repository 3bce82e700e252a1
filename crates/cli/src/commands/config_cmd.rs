//! `fieldvoice config` — Configuration management commands.

use fieldvoice_config::AppConfig;

const REDACTED: &str = "***";

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Model:      {}", config.model);
            println!("   Embedding:  {}", config.embedding_model);
            println!("   Language:   {}", config.pipeline.working_language);
            println!("   Search:     {} ({})", config.search.url, config.search.index);
            println!("   Store:      {}", config.store.backend);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Non-fatal problems with an otherwise loadable config.
fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();

    if config.api_key.is_none() {
        warnings.push("No API key set (set FIELDVOICE_API_KEY or OPENAI_API_KEY env var)");
    }

    if config.search.api_key.is_none() && !config.search.url.contains("localhost") {
        warnings.push("Remote search index without search.api_key");
    }

    if config.pipeline.history_limit > 50 {
        warnings.push("pipeline.history_limit above 50 makes classifier prompts very long");
    }

    warnings
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", redacted_toml(config)?);
    Ok(())
}

fn redacted_toml(mut config: AppConfig) -> Result<String, toml::ser::Error> {
    if config.api_key.is_some() {
        config.api_key = Some(REDACTED.into());
    }
    if config.search.api_key.is_some() {
        config.search.api_key = Some(REDACTED.into());
    }
    toml::to_string_pretty(&config)
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let config_path = dir.join("config.toml");

    if config_path.exists() {
        println!("  Config already exists at {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("  ✅ Wrote default config to {}", config_path.display());
    println!("     Set FIELDVOICE_API_KEY or add api_key to the file before chatting.");
    Ok(())
}
