use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use super::{AlphaVantageClient, MockBroker, StockProvider};
use crate::error::ApiError;
use crate::types::{Account, HistoryPoint, Order, OrderRequest, OrderStatusFilter, OrderType, Position, StockQuote, Timeframe};

/// Live quotes from Alpha Vantage, orders simulated by the mock broker
#[derive(Clone)]
pub struct DirectStockProvider {
    alpha: AlphaVantageClient,
    broker: MockBroker,
}

impl DirectStockProvider {
    pub fn new(alpha: AlphaVantageClient, broker: MockBroker) -> Self {
        Self { alpha, broker }
    }

    pub fn broker(&self) -> &MockBroker {
        &self.broker
    }
}

/// Price a simulated order fills at. Market and trailing-stop orders need
/// the latest quote; the others fill at their own limit or stop price.
pub fn fill_price(request: &OrderRequest, quote_price: Option<Decimal>) -> Result<Decimal, ApiError> {
    let price = match request.order_type {
        OrderType::Market | OrderType::TrailingStop => quote_price,
        OrderType::Limit | OrderType::StopLimit => request.limit_price.or(request.stop_price),
        OrderType::Stop => request.stop_price,
    };
    price
        .filter(|p| *p > Decimal::ZERO)
        .ok_or_else(|| ApiError::Rejected(format!("No price available to fill {} order", request.order_type)))
}

#[async_trait]
impl StockProvider for DirectStockProvider {
    async fn account(&self) -> Result<Account, ApiError> {
        Ok(self.broker.account().await)
    }

    async fn positions(&self) -> Result<Vec<Position>, ApiError> {
        Ok(self.broker.positions().await)
    }

    async fn orders(&self, status: OrderStatusFilter) -> Result<Vec<Order>, ApiError> {
        Ok(self.broker.orders(status).await)
    }

    async fn quote(&self, symbol: &str) -> Result<StockQuote, ApiError> {
        let quote = self.alpha.global_quote(symbol).await?;
        self.broker.mark_price(&quote.symbol, quote.price).await;
        Ok(quote)
    }

    async fn history(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<HistoryPoint>, ApiError> {
        self.alpha.time_series(symbol, timeframe).await
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<Order, ApiError> {
        let quote_price = match request.order_type {
            OrderType::Market | OrderType::TrailingStop => Some(self.quote(&request.symbol).await?.price),
            _ => None,
        };
        let price = fill_price(request, quote_price)?;
        let order = self.broker.execute(request, price).await?;
        info!("Simulated {} order {} for {}", request.order_type, order.id, order.symbol);
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), ApiError> {
        self.broker.cancel(order_id).await
    }
}
