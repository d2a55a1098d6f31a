//! Stock dashboard: data providers, the mock broker and the panel controller

pub mod alpha_vantage;
pub mod backend;
pub mod controller;
pub mod direct;
pub mod form;
pub mod mock_broker;
pub mod panel;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{AppConfig, ProviderKind};
use crate::error::ApiError;
use crate::types::{Account, HistoryPoint, Order, OrderRequest, OrderStatusFilter, Position, StockQuote, Timeframe};

pub use alpha_vantage::AlphaVantageClient;
pub use backend::BackendStockProvider;
pub use controller::{AccountView, ChartArea, PlClass, SearchPanel, SearchState, StockDashboard};
pub use direct::DirectStockProvider;
pub use form::{OrderForm, OrderFormError};
pub use mock_broker::MockBroker;
pub use panel::{Banner, BannerKind, Panel};

/// Source of account, portfolio, order and market data for the dashboard
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StockProvider: Send + Sync {
    async fn account(&self) -> Result<Account, ApiError>;
    async fn positions(&self) -> Result<Vec<Position>, ApiError>;
    async fn orders(&self, status: OrderStatusFilter) -> Result<Vec<Order>, ApiError>;
    async fn quote(&self, symbol: &str) -> Result<StockQuote, ApiError>;
    async fn history(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<HistoryPoint>, ApiError>;
    async fn place_order(&self, request: &OrderRequest) -> Result<Order, ApiError>;
    async fn cancel_order(&self, order_id: &str) -> Result<(), ApiError>;
}

/// Builds the provider selected by `stocks.provider`
pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn StockProvider>, ApiError> {
    match config.stocks.provider {
        ProviderKind::Backend => {
            info!("Stock data from backend at {}", config.api.base_url);
            Ok(Arc::new(BackendStockProvider::new(&config.api.base_url)))
        }
        ProviderKind::Direct => {
            let alpha = AlphaVantageClient::new(&config.alpha_vantage)?;
            let broker = MockBroker::new(config.mock.starting_cash, config.mock.seed_demo_positions);
            info!("Stock data from Alpha Vantage with mock order execution");
            Ok(Arc::new(DirectStockProvider::new(alpha, broker)))
        }
    }
}

pub fn banner_ttl(config: &AppConfig) -> Duration {
    Duration::from_secs(config.ui.banner_ttl_secs)
}

/// Reads a JSON number or numeric string (a trailing `%` is ignored)
pub(crate) fn value_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        Value::String(s) => {
            let trimmed = s.trim().trim_end_matches('%');
            Decimal::from_str(trimmed)
                .ok()
                .or_else(|| Decimal::from_scientific(trimmed).ok())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_value_decimal() {
        assert_eq!(value_decimal(&json!("189.8400")), Some(dec!(189.84)));
        assert_eq!(value_decimal(&json!("-0.5432%")), Some(dec!(-0.5432)));
        assert_eq!(value_decimal(&json!(42)), Some(dec!(42)));
        assert_eq!(value_decimal(&json!(1.5)), Some(dec!(1.5)));
        assert_eq!(value_decimal(&json!("n/a")), None);
        assert_eq!(value_decimal(&json!(null)), None);
    }

    #[test]
    fn test_build_provider_requires_key_for_direct() {
        let mut config = AppConfig::default();
        assert!(build_provider(&config).is_ok());

        config.stocks.provider = ProviderKind::Direct;
        assert!(matches!(build_provider(&config), Err(ApiError::Config(_))));

        config.alpha_vantage.api_key = "demo".to_string();
        assert!(build_provider(&config).is_ok());
    }
}
