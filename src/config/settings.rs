use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Timeframe;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub stocks: StockSettings,
    #[serde(default)]
    pub alpha_vantage: AlphaVantageSettings,
    #[serde(default)]
    pub mock: MockSettings,
    #[serde(default)]
    pub ui: UiSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://")) {
            errors.push("api.base_url must start with http:// or https://".to_string());
        }
        if self.api.dashboard_timeout_secs == 0 {
            errors.push("api.dashboard_timeout_secs must be > 0".to_string());
        }

        if self.stocks.provider == ProviderKind::Direct {
            if self.alpha_vantage.api_key.trim().is_empty() {
                errors.push("alpha_vantage.api_key is required for the direct provider".to_string());
            }
            if self.alpha_vantage.requests_per_minute == 0 {
                errors.push("alpha_vantage.requests_per_minute must be > 0".to_string());
            }
        }

        if self.mock.starting_cash < Decimal::ZERO {
            errors.push("mock.starting_cash must be >= 0".to_string());
        }
        if self.ui.banner_ttl_secs == 0 {
            errors.push("ui.banner_ttl_secs must be > 0".to_string());
        }
        if self.server.port == 0 {
            errors.push("server.port must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub dashboard_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            dashboard_timeout_secs: 10,
        }
    }
}

/// Where the stock dashboard gets its data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// The backend's `/api/stocks` proxy
    #[default]
    Backend,
    /// Alpha Vantage quotes plus the in-process mock broker
    Direct,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StockSettings {
    pub provider: ProviderKind,
    pub default_timeframe: Timeframe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaVantageSettings {
    pub api_key: String,
    pub base_url: String,
    pub requests_per_minute: u32,
}

impl Default for AlphaVantageSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://www.alphavantage.co".to_string(),
            requests_per_minute: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSettings {
    pub starting_cash: Decimal,
    pub seed_demo_positions: bool,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            starting_cash: dec!(100000),
            seed_demo_positions: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// How long error and success banners stay visible
    pub banner_ttl_secs: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self { banner_ttl_secs: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 3000 }
    }
}
