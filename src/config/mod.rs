pub mod settings;

pub use settings::*;

use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::{debug, info};

const ENV_PREFIX: &str = "FINBOARD";
const ALPHAVANTAGE_KEY_VAR: &str = "ALPHAVANTAGE_API_KEY";

/// Layers defaults, an optional TOML file and `FINBOARD__SECTION__KEY`
/// environment variables, then validates the result.
pub fn load(path: &str) -> Result<AppConfig> {
    if let Ok(env_file) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", env_file.display());
    }

    let defaults = config::Config::try_from(&AppConfig::default())?;
    let layered = config::Config::builder()
        .add_source(defaults)
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut app_config: AppConfig = layered.try_deserialize()?;

    if app_config.alpha_vantage.api_key.trim().is_empty() {
        if let Ok(key) = std::env::var(ALPHAVANTAGE_KEY_VAR) {
            app_config.alpha_vantage.api_key = key;
        }
    }

    app_config
        .validate()
        .map_err(|errors| anyhow!("Invalid configuration: {}", errors.join(", ")))?;

    if Path::new(path).exists() {
        info!("Configuration loaded from {}", path);
    } else {
        info!("No config file at {}, using defaults and environment", path);
    }

    Ok(app_config)
}

/// Writes the default configuration as TOML
pub fn write_default(path: &str) -> Result<()> {
    if Path::new(path).exists() {
        return Err(anyhow!("{} already exists", path));
    }
    let text = toml::to_string_pretty(&AppConfig::default())?;
    std::fs::write(path, text)?;
    info!("Wrote default configuration to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("finboard-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dashboard.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"https://finance.example.com\"\n\n[server]\nport = 8088\n",
        )
        .unwrap();

        let config = load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.api.base_url, "https://finance.example.com");
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.api.dashboard_timeout_secs, 10);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_default_round_trips() {
        let dir = std::env::temp_dir().join(format!("finboard-init-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("finance_dashboard.toml");
        let path_str = path.to_str().unwrap();

        write_default(path_str).unwrap();
        assert!(write_default(path_str).is_err());

        let parsed: AppConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.mock.starting_cash, AppConfig::default().mock.starting_cash);
        assert_eq!(parsed.ui.banner_ttl_secs, 5);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
