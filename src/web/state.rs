use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::api::DashboardClient;
use crate::config::AppConfig;
use crate::stocks::{banner_ttl, StockDashboard, StockProvider};
use crate::tracker::ExpenseTracker;

/// Everything the web front owns. Stock views are built per request from
/// the shared provider; the local tracker is locked so updates apply in order.
#[derive(Clone)]
pub struct AppState {
    pub client: DashboardClient,
    pub provider: Arc<dyn StockProvider>,
    pub tracker: Arc<Mutex<ExpenseTracker>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, provider: Arc<dyn StockProvider>) -> Self {
        let client = DashboardClient::new(
            config.api.base_url.clone(),
            Duration::from_secs(config.api.dashboard_timeout_secs),
        );

        Self {
            client,
            provider,
            tracker: Arc::new(Mutex::new(ExpenseTracker::new())),
            config: Arc::new(config),
        }
    }

    /// Fresh controller for one request; nothing it loads outlives the response
    pub fn stock_dashboard(&self) -> StockDashboard {
        StockDashboard::new(Arc::clone(&self.provider), self.banner_ttl())
            .with_timeframe(self.config.stocks.default_timeframe)
    }

    pub fn banner_ttl(&self) -> Duration {
        banner_ttl(&self.config)
    }
}
