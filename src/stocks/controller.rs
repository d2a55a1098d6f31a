use futures::future::join3;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::form::OrderForm;
use super::panel::{Banner, Panel};
use super::StockProvider;
use crate::auth::AuthCookies;
use crate::error::{search_error_message, ApiError};
use crate::format::format_currency;
use crate::types::{
    Account, HistoryPoint, Order, OrderStatusFilter, OrderType, Position, Side, StockQuote, Timeframe,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlClass {
    Profit,
    Loss,
}

impl PlClass {
    pub fn of(value: Decimal) -> Self {
        if value >= Decimal::ZERO {
            PlClass::Profit
        } else {
            PlClass::Loss
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            PlClass::Profit => "profit",
            PlClass::Loss => "loss",
        }
    }
}

/// Formatted account overview
#[derive(Debug, Clone, PartialEq)]
pub struct AccountView {
    pub portfolio_value: String,
    pub buying_power: String,
    pub cash: String,
    pub pl: String,
    pub pl_class: PlClass,
}

impl AccountView {
    pub fn empty() -> Self {
        Self {
            portfolio_value: "$0.00".to_string(),
            buying_power: "$0.00".to_string(),
            cash: "$0.00".to_string(),
            pl: "$0.00 (0.00%)".to_string(),
            pl_class: PlClass::Profit,
        }
    }

    pub fn from_account(account: &Account) -> Self {
        let (pl, pl_class) = match account.daily_pl() {
            Some((amount, percent)) => (
                format!("{} ({:.2}%)", format_currency(amount), percent.round_dp(2)),
                PlClass::of(amount),
            ),
            None => ("$0.00 (0.00%)".to_string(), PlClass::Profit),
        };
        Self {
            portfolio_value: format_currency(account.portfolio_value),
            buying_power: format_currency(account.buying_power),
            cash: format_currency(account.cash),
            pl,
            pl_class,
        }
    }
}

impl Default for AccountView {
    fn default() -> Self {
        Self::empty()
    }
}

/// What the price chart area currently shows
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ChartArea {
    #[default]
    Empty,
    Loaded {
        symbol: String,
        timeframe: Timeframe,
        points: Vec<HistoryPoint>,
    },
    Error(String),
}

impl ChartArea {
    pub fn caption(&self) -> Option<String> {
        match self {
            ChartArea::Empty => None,
            ChartArea::Loaded { symbol, timeframe, points } => Some(format!(
                "Chart for {} ({}) - {} data points received",
                symbol,
                timeframe,
                points.len()
            )),
            ChartArea::Error(message) => Some(message.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    /// Symbol of the last successful search
    pub symbol: Option<String>,
    pub quote: Option<StockQuote>,
    pub timeframe: Timeframe,
    pub chart: ChartArea,
}

pub type SearchPanel = Panel<SearchState>;

/// Stock trading screen: five independent panels over one provider
pub struct StockDashboard {
    provider: Arc<dyn StockProvider>,
    banner_ttl: Duration,
    authenticated: bool,
    pub account: Panel<AccountView>,
    pub portfolio: Panel<Vec<Position>>,
    pub open_orders: Panel<Vec<Order>>,
    pub filled_orders: Panel<Vec<Order>>,
    pub search: SearchPanel,
    /// Last submitted form, kept so a failed order can be corrected
    pub order_form: OrderForm,
    order_error: Option<Banner>,
    order_success: Option<Banner>,
}

impl StockDashboard {
    pub fn new(provider: Arc<dyn StockProvider>, banner_ttl: Duration) -> Self {
        Self {
            provider,
            banner_ttl,
            authenticated: false,
            account: Panel::default(),
            portfolio: Panel::default(),
            open_orders: Panel::default(),
            filled_orders: Panel::default(),
            search: Panel::default(),
            order_form: OrderForm::default(),
            order_error: None,
            order_success: None,
        }
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.search.data.timeframe = timeframe;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn order_error(&self) -> Option<&Banner> {
        self.order_error.as_ref().filter(|b| b.is_visible())
    }

    pub fn order_success(&self) -> Option<&Banner> {
        self.order_success.as_ref().filter(|b| b.is_visible())
    }

    pub fn orders_panel(&self, status: OrderStatusFilter) -> &Panel<Vec<Order>> {
        match status {
            OrderStatusFilter::Open => &self.open_orders,
            OrderStatusFilter::Closed => &self.filled_orders,
        }
    }

    /// Loads account, portfolio and open orders for a signed-in user;
    /// anyone else gets the all-zero empty state.
    pub async fn initialize(&mut self, cookies: &AuthCookies) {
        info!(
            "Authentication status: session cookie {}, idToken {}, localId {}",
            cookies.session.as_deref().unwrap_or("missing"),
            if cookies.id_token.is_some() { "exists" } else { "missing" },
            if cookies.local_id.is_some() { "exists" } else { "missing" },
        );

        if !cookies.is_authenticated() {
            info!("Tokens not available, initializing with empty state");
            self.reset_to_empty();
            return;
        }

        self.authenticated = true;
        self.account.loading = true;
        self.portfolio.loading = true;
        self.open_orders.loading = true;

        let provider = Arc::clone(&self.provider);
        let (account, positions, orders) = join3(
            provider.account(),
            provider.positions(),
            provider.orders(OrderStatusFilter::Open),
        )
        .await;

        self.apply_account(account);
        self.apply_portfolio(positions);
        self.apply_orders(OrderStatusFilter::Open, orders);
    }

    pub fn reset_to_empty(&mut self) {
        self.authenticated = false;
        self.account = Panel::new(AccountView::empty());
        self.portfolio = Panel::default();
        self.open_orders = Panel::default();
        self.filled_orders = Panel::default();
    }

    pub async fn fetch_account_info(&mut self) {
        self.account.loading = true;
        let result = self.provider.account().await;
        self.apply_account(result);
    }

    pub async fn fetch_portfolio(&mut self) {
        self.portfolio.loading = true;
        self.portfolio.clear_error();
        let result = self.provider.positions().await;
        self.apply_portfolio(result);
    }

    pub async fn fetch_orders(&mut self, status: OrderStatusFilter) {
        let panel = self.orders_panel_mut(status);
        panel.loading = true;
        panel.clear_error();
        let result = self.provider.orders(status).await;
        self.apply_orders(status, result);
    }

    /// Looks up a quote and then loads the chart for the active timeframe
    pub async fn search_stock(&mut self, input: &str) {
        let symbol = input.trim().to_uppercase();
        if symbol.is_empty() {
            self.search.show_error("Please enter a stock symbol.", self.banner_ttl);
            return;
        }

        self.search.loading = true;
        self.search.clear_error();
        self.search.data.quote = None;

        match self.provider.quote(&symbol).await {
            Ok(quote) => {
                self.search.data.symbol = Some(symbol.clone());
                self.search.data.quote = Some(quote);
                let timeframe = self.search.data.timeframe;
                self.fetch_stock_history(&symbol, timeframe).await;
            }
            Err(e) => {
                error!("Error searching stock {}: {}", symbol, e);
                self.search.show_error(search_error_message(&e, &symbol), self.banner_ttl);
            }
        }
        self.search.loading = false;
    }

    pub async fn fetch_stock_history(&mut self, symbol: &str, timeframe: Timeframe) {
        info!("Fetching history for {} ({})", symbol, timeframe);
        self.search.data.timeframe = timeframe;

        self.search.data.chart = match self.provider.history(symbol, timeframe).await {
            Ok(points) => ChartArea::Loaded {
                symbol: symbol.to_string(),
                timeframe,
                points,
            },
            Err(e) => {
                error!("Error fetching stock history: {}", e);
                ChartArea::Error(format!("Error loading chart: {}", e))
            }
        };
    }

    /// Validates the form against the searched symbol, submits the order and
    /// refreshes the affected panels
    pub async fn place_order(&mut self, order_type: OrderType, side: Side, form: OrderForm) -> Option<Order> {
        let current = self.search.data.symbol.clone();
        self.order_form = form;

        let request = match self.order_form.to_request(current.as_deref(), order_type, side) {
            Ok(request) => request,
            Err(e) => {
                self.order_error = Some(Banner::error(e.to_string(), self.banner_ttl));
                return None;
            }
        };

        self.order_error = None;
        self.order_success = None;

        match self.provider.place_order(&request).await {
            Ok(order) => {
                self.order_success = Some(Banner::success(
                    format!("Order {} placed successfully: {}", order.id, order.status),
                    self.banner_ttl,
                ));
                self.order_form = OrderForm::default();

                self.fetch_portfolio().await;
                self.fetch_orders(OrderStatusFilter::Open).await;
                if current.as_deref() == Some(order.symbol.as_str()) {
                    self.search_stock(&order.symbol).await;
                }
                Some(order)
            }
            Err(e) => {
                error!("Order placement error: {}", e);
                self.order_error = Some(Banner::error(format!("Failed to place order: {}", e), self.banner_ttl));
                None
            }
        }
    }

    pub async fn cancel_order(&mut self, order_id: &str) -> bool {
        match self.provider.cancel_order(order_id).await {
            Ok(()) => {
                self.fetch_orders(OrderStatusFilter::Open).await;
                self.order_success = Some(Banner::success("Order canceled successfully.", self.banner_ttl));
                true
            }
            Err(e) => {
                error!("Error canceling order {}: {}", order_id, e);
                self.order_error = Some(Banner::error(
                    "Failed to cancel order. Please try again.",
                    self.banner_ttl,
                ));
                false
            }
        }
    }

    fn orders_panel_mut(&mut self, status: OrderStatusFilter) -> &mut Panel<Vec<Order>> {
        match status {
            OrderStatusFilter::Open => &mut self.open_orders,
            OrderStatusFilter::Closed => &mut self.filled_orders,
        }
    }

    fn apply_account(&mut self, result: Result<Account, ApiError>) {
        self.account.loading = false;
        match result {
            Ok(account) => {
                self.account.clear_error();
                self.account.data = AccountView::from_account(&account);
            }
            Err(e) => {
                error!("Error fetching account info: {}", e);
                self.account
                    .show_error("Failed to load account info. Please try again.", self.banner_ttl);
            }
        }
    }

    fn apply_portfolio(&mut self, result: Result<Vec<Position>, ApiError>) {
        self.portfolio.loading = false;
        match result {
            Ok(positions) => {
                self.portfolio.clear_error();
                self.portfolio.data = positions;
            }
            Err(e) => {
                error!("Error fetching portfolio: {}", e);
                self.portfolio
                    .show_error("Failed to load portfolio. Please try again.", self.banner_ttl);
            }
        }
    }

    fn apply_orders(&mut self, status: OrderStatusFilter, result: Result<Vec<Order>, ApiError>) {
        let ttl = self.banner_ttl;
        let panel = self.orders_panel_mut(status);
        panel.loading = false;
        match result {
            Ok(orders) => {
                panel.clear_error();
                panel.data = orders;
            }
            Err(e) => {
                error!("Error fetching {} orders: {}", status.as_str(), e);
                panel.show_error(
                    format!("Failed to load {} orders. Please try again.", status.as_str()),
                    ttl,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stocks::MockStockProvider;
    use crate::types::OrderStatus;
    use rust_decimal_macros::dec;

    const TTL: Duration = Duration::from_secs(5);

    fn signed_in() -> AuthCookies {
        AuthCookies::parse("idToken=t; localId=u; session=s")
    }

    fn account() -> Account {
        Account {
            portfolio_value: dec!(10500),
            buying_power: dec!(4000),
            cash: dec!(2000),
            equity: Some(dec!(10500)),
            last_equity: Some(dec!(11000)),
        }
    }

    fn quote(symbol: &str) -> StockQuote {
        StockQuote {
            symbol: symbol.to_string(),
            name: crate::types::company_name(symbol),
            price: dec!(190),
            change: dec!(1.5),
            change_percent: dec!(0.8),
            volume: 1_000,
            open: None,
            high: None,
            low: None,
            previous_close: None,
            latest_trading_day: None,
        }
    }

    fn point(price: f64) -> HistoryPoint {
        HistoryPoint {
            timestamp: 1_714_700_000_000,
            price,
            open: price,
            high: price,
            low: price,
            volume: 0,
        }
    }

    fn dashboard(mock: MockStockProvider) -> StockDashboard {
        StockDashboard::new(Arc::new(mock), TTL)
    }

    #[tokio::test]
    async fn test_anonymous_initialize_shows_empty_state() {
        let mut mock = MockStockProvider::new();
        mock.expect_account().times(0);
        mock.expect_positions().times(0);
        mock.expect_orders().times(0);

        let mut dash = dashboard(mock);
        dash.initialize(&AuthCookies::parse("idToken=t")).await;

        assert!(!dash.is_authenticated());
        assert_eq!(dash.account.data, AccountView::empty());
        assert_eq!(dash.account.data.pl, "$0.00 (0.00%)");
        assert!(dash.portfolio.data.is_empty());
        assert!(dash.open_orders.data.is_empty());
    }

    #[tokio::test]
    async fn test_signed_in_initialize_loads_three_panels() {
        let mut mock = MockStockProvider::new();
        mock.expect_account().times(1).returning(|| Ok(account()));
        mock.expect_positions()
            .times(1)
            .returning(|| Ok(vec![Position::new("AAPL", dec!(10), dec!(150), dec!(175))]));
        mock.expect_orders()
            .times(1)
            .returning(|_| Err(ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY)));

        let mut dash = dashboard(mock);
        dash.initialize(&signed_in()).await;

        assert!(dash.is_authenticated());
        assert_eq!(dash.account.data.portfolio_value, "$10,500.00");
        assert_eq!(dash.account.data.pl, "-$500.00 (-4.55%)");
        assert_eq!(dash.account.data.pl_class, PlClass::Loss);
        assert_eq!(dash.portfolio.data.len(), 1);
        assert!(!dash.portfolio.loading);
        assert_eq!(
            dash.open_orders.visible_error().map(|b| b.message.as_str()),
            Some("Failed to load open orders. Please try again.")
        );
    }

    #[tokio::test]
    async fn test_panel_failures_are_independent() {
        let mut mock = MockStockProvider::new();
        mock.expect_account().returning(|| Err(ApiError::Timeout));
        mock.expect_positions().returning(|| Ok(Vec::new()));

        let mut dash = dashboard(mock);
        dash.fetch_account_info().await;
        dash.fetch_portfolio().await;

        assert_eq!(
            dash.account.visible_error().map(|b| b.message.as_str()),
            Some("Failed to load account info. Please try again.")
        );
        assert!(dash.portfolio.visible_error().is_none());
    }

    #[tokio::test]
    async fn test_search_validates_and_normalizes_symbol() {
        let mut mock = MockStockProvider::new();
        mock.expect_quote().times(1).returning(|symbol| {
            assert_eq!(symbol, "AAPL");
            Ok(quote(symbol))
        });
        mock.expect_history()
            .times(1)
            .returning(|_, _| Ok(vec![point(189.0), point(190.0)]));

        let mut dash = dashboard(mock);
        dash.search_stock("   ").await;
        assert_eq!(
            dash.search.visible_error().map(|b| b.message.as_str()),
            Some("Please enter a stock symbol.")
        );

        dash.search_stock(" aapl ").await;
        assert!(dash.search.visible_error().is_none());
        assert_eq!(dash.search.data.symbol.as_deref(), Some("AAPL"));
        assert_eq!(
            dash.search.data.chart.caption().as_deref(),
            Some("Chart for AAPL (1D) - 2 data points received")
        );
    }

    #[tokio::test]
    async fn test_search_error_messages_by_kind() {
        let mut mock = MockStockProvider::new();
        mock.expect_quote().returning(|symbol| match symbol {
            "RATE" => Err(ApiError::RateLimited("Note".to_string())),
            "NOPE" => Err(ApiError::NotFound("Error Message".to_string())),
            _ => Err(ApiError::Timeout),
        });

        let mut dash = dashboard(mock);
        let cases = [
            ("RATE", "API rate limit reached. Please try again in a minute.".to_string()),
            ("NOPE", "Stock symbol \"NOPE\" not found. Please check and try again.".to_string()),
            ("SLOW", "Failed to retrieve stock data: request timed out".to_string()),
        ];
        for (symbol, expected) in cases {
            dash.search_stock(symbol).await;
            assert_eq!(dash.search.visible_error().map(|b| b.message.clone()), Some(expected));
            assert!(dash.search.data.quote.is_none());
        }
    }

    #[tokio::test]
    async fn test_history_error_lands_in_chart_area() {
        let mut mock = MockStockProvider::new();
        mock.expect_history()
            .returning(|_, _| Err(ApiError::RateLimited("slow down".to_string())));

        let mut dash = dashboard(mock);
        dash.fetch_stock_history("MSFT", Timeframe::OneYear).await;

        assert_eq!(dash.search.data.timeframe, Timeframe::OneYear);
        assert_eq!(
            dash.search.data.chart,
            ChartArea::Error("Error loading chart: API rate limit reached: slow down".to_string())
        );
    }

    #[tokio::test]
    async fn test_place_order_requires_search_and_valid_form() {
        let mut mock = MockStockProvider::new();
        mock.expect_place_order().times(0);

        let mut dash = dashboard(mock);
        let form = OrderForm {
            quantity: "3".to_string(),
            ..OrderForm::default()
        };
        assert!(dash.place_order(OrderType::Market, Side::Buy, form.clone()).await.is_none());
        assert_eq!(
            dash.order_error().map(|b| b.message.as_str()),
            Some("Please search for a stock first.")
        );

        dash.search.data.symbol = Some("AAPL".to_string());
        assert!(dash.place_order(OrderType::Limit, Side::Buy, form.clone()).await.is_none());
        assert_eq!(
            dash.order_error().map(|b| b.message.as_str()),
            Some("Please enter a valid limit price.")
        );
        // the rejected form is kept for correction
        assert_eq!(dash.order_form, form);
    }

    #[tokio::test]
    async fn test_successful_order_refreshes_panels() {
        let mut mock = MockStockProvider::new();
        mock.expect_quote().times(2).returning(|symbol| Ok(quote(symbol)));
        mock.expect_history().times(2).returning(|_, _| Ok(vec![point(190.0)]));
        mock.expect_place_order().times(1).returning(|request| {
            assert_eq!(request.qty, dec!(3));
            Ok(Order::filled_from_request(request, dec!(190)))
        });
        mock.expect_positions()
            .times(1)
            .returning(|| Ok(vec![Position::new("AAPL", dec!(3), dec!(190), dec!(190))]));
        mock.expect_orders().times(1).returning(|status| {
            assert_eq!(status, OrderStatusFilter::Open);
            Ok(Vec::new())
        });

        let mut dash = dashboard(mock);
        dash.search_stock("AAPL").await;

        let form = OrderForm {
            quantity: "3".to_string(),
            ..OrderForm::default()
        };
        let order = dash.place_order(OrderType::Market, Side::Buy, form).await.unwrap();

        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(
            dash.order_success().map(|b| b.message.clone()),
            Some(format!("Order {} placed successfully: filled", order.id))
        );
        assert_eq!(dash.order_form, OrderForm::default());
        assert_eq!(dash.portfolio.data.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_order_shows_banner() {
        let mut mock = MockStockProvider::new();
        mock.expect_place_order()
            .returning(|_| Err(ApiError::Rejected("No position in AAPL to sell".to_string())));

        let mut dash = dashboard(mock);
        dash.search.data.symbol = Some("AAPL".to_string());
        let form = OrderForm {
            quantity: "1".to_string(),
            ..OrderForm::default()
        };
        assert!(dash.place_order(OrderType::Market, Side::Sell, form).await.is_none());
        assert_eq!(
            dash.order_error().map(|b| b.message.as_str()),
            Some("Failed to place order: No position in AAPL to sell")
        );
        assert!(dash.order_success().is_none());
    }

    #[tokio::test]
    async fn test_cancel_order() {
        let mut mock = MockStockProvider::new();
        mock.expect_cancel_order().returning(|id| {
            if id == "o-1" {
                Ok(())
            } else {
                Err(ApiError::NotFound(id.to_string()))
            }
        });
        mock.expect_orders().times(1).returning(|_| Ok(Vec::new()));

        let mut dash = dashboard(mock);
        assert!(dash.cancel_order("o-1").await);
        assert_eq!(
            dash.order_success().map(|b| b.message.as_str()),
            Some("Order canceled successfully.")
        );

        assert!(!dash.cancel_order("o-2").await);
        assert_eq!(
            dash.order_error().map(|b| b.message.as_str()),
            Some("Failed to cancel order. Please try again.")
        );
    }
}
