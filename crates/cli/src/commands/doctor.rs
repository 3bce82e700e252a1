//! `fieldvoice doctor` — Diagnose configuration and collaborators.

use fieldvoice_config::AppConfig;
use fieldvoice_core::store::ConversationStore;

use super::open_store;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 FieldVoice Doctor — System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — using defaults (run `fieldvoice config init`)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!();
            println!("  ⚠️  Cannot continue without a valid config.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key configured — set FIELDVOICE_API_KEY");
        issues += 1;
    }

    match open_store(&config).await {
        Ok(store) => println!("  ✅ Conversation store opens ({})", store.name()),
        Err(e) => {
            println!("  ❌ Conversation store failed: {e}");
            issues += 1;
        }
    }

    println!("  ℹ️  Product index: {} / {}", config.search.url, config.search.index);

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
