use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::{value_decimal, StockProvider};
use crate::error::ApiError;
use crate::types::{
    company_name, Account, HistoryPoint, Order, OrderRequest, OrderStatus, OrderStatusFilter, Position, Side,
    StockQuote, Timeframe,
};

/// Talks to the backend's `/api/stocks` proxy
#[derive(Debug, Clone)]
pub struct BackendStockProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PortfolioResponse {
    #[serde(default)]
    positions: Vec<Position>,
}

#[derive(Debug, Deserialize)]
struct OrdersResponse {
    #[serde(default)]
    orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<HistoryPoint>,
}

/// Order body accepted by `POST /api/stocks/orders`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendOrderBody {
    pub symbol: String,
    /// Negative for sells
    pub quantity: f64,
    pub order_type: String,
    pub time_in_force: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trail_percent: Option<f64>,
}

impl BackendOrderBody {
    pub fn from_request(request: &OrderRequest) -> Self {
        let qty = request.qty.to_f64().unwrap_or(0.0);
        Self {
            symbol: request.symbol.clone(),
            quantity: match request.side {
                Side::Buy => qty,
                Side::Sell => -qty,
            },
            order_type: request.order_type.as_str().to_string(),
            time_in_force: request.time_in_force.as_str().to_string(),
            limit_price: request.limit_price.and_then(|p| p.to_f64()),
            stop_price: request.stop_price.and_then(|p| p.to_f64()),
            trail_percent: request.trail_percent.and_then(|p| p.to_f64()),
        }
    }
}

impl BackendStockProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/api/stocks", base_url.trim_end_matches('/')),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl StockProvider for BackendStockProvider {
    async fn account(&self) -> Result<Account, ApiError> {
        self.get_json("/account")
            .await
            .inspect_err(|e| error!("Error fetching account info: {}", e))
    }

    async fn positions(&self) -> Result<Vec<Position>, ApiError> {
        let portfolio: PortfolioResponse = self
            .get_json("/portfolio")
            .await
            .inspect_err(|e| error!("Error fetching portfolio: {}", e))?;
        Ok(portfolio.positions)
    }

    async fn orders(&self, status: OrderStatusFilter) -> Result<Vec<Order>, ApiError> {
        let orders: OrdersResponse = self
            .get_json(&format!("/orders?status={}", status.as_str()))
            .await
            .inspect_err(|e| error!("Error fetching {} orders: {}", status.as_str(), e))?;
        Ok(orders.orders)
    }

    async fn quote(&self, symbol: &str) -> Result<StockQuote, ApiError> {
        let body: Value = self
            .get_json(&format!("/{}", symbol))
            .await
            .inspect_err(|e| error!("Error searching stock {}: {}", symbol, e))?;
        parse_backend_quote(&body, symbol)
    }

    async fn history(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<HistoryPoint>, ApiError> {
        let history: HistoryResponse = self
            .get_json(&format!("/{}/history?timeframe={}", symbol, timeframe.as_str()))
            .await
            .inspect_err(|e| error!("Error fetching stock history: {}", e))?;
        debug!("Received {} history points for {} ({})", history.history.len(), symbol, timeframe);
        Ok(history.history)
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<Order, ApiError> {
        let url = format!("{}/orders", self.base_url);
        let body = BackendOrderBody::from_request(request);
        debug!("POST {} {:?}", url, body);

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let err = ApiError::from_status(status);
            error!("Order placement error: {}", err);
            return Err(err);
        }
        let created: Value = response.json().await?;
        let order = order_from_response(created, request)?;
        info!("Order {} placed: {}", order.id, order.status);
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), ApiError> {
        let url = format!("{}/orders/{}", self.base_url, order_id);
        debug!("DELETE {}", url);
        let response = self.client.delete(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let err = ApiError::from_status(status);
            error!("Error canceling order: {}", err);
            return Err(err);
        }
        info!("Order {} canceled", order_id);
        Ok(())
    }
}

/// `{symbol, name, quote: {price, change, changePercent, volume}}`
fn parse_backend_quote(body: &Value, requested: &str) -> Result<StockQuote, ApiError> {
    let quote = body
        .get("quote")
        .filter(|q| q.is_object())
        .ok_or_else(|| ApiError::NotFound(format!("no quote for {}", requested)))?;

    let symbol = body
        .get("symbol")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(requested)
        .to_string();
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| company_name(&symbol));

    let number = |key: &str| quote.get(key).and_then(value_decimal);

    Ok(StockQuote {
        price: number("price").unwrap_or(Decimal::ZERO),
        change: number("change").unwrap_or(Decimal::ZERO),
        change_percent: number("changePercent").unwrap_or(Decimal::ZERO),
        volume: number("volume").and_then(|v| v.trunc().to_i64()).unwrap_or(0),
        open: number("open"),
        high: number("high"),
        low: number("low"),
        previous_close: number("previousClose"),
        latest_trading_day: quote
            .get("latestTradingDay")
            .and_then(Value::as_str)
            .map(str::to_string),
        symbol,
        name,
    })
}

/// The backend may answer with a full order or only `{id, status, symbol}`
fn order_from_response(created: Value, request: &OrderRequest) -> Result<Order, ApiError> {
    if let Ok(order) = serde_json::from_value::<Order>(created.clone()) {
        return Ok(order);
    }

    let id = match created.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ApiError::Decode("order response without id".to_string())),
    };
    let status = created
        .get("status")
        .cloned()
        .and_then(|s| serde_json::from_value::<OrderStatus>(s).ok())
        .unwrap_or(OrderStatus::Unknown);

    Ok(Order {
        id,
        symbol: created
            .get("symbol")
            .and_then(Value::as_str)
            .unwrap_or(&request.symbol)
            .to_string(),
        order_type: request.order_type,
        side: request.side,
        qty: request.qty,
        limit_price: request.limit_price,
        stop_price: request.stop_price,
        trail_percent: request.trail_percent,
        time_in_force: Some(request.time_in_force),
        status,
        created_at: None,
        filled_avg_price: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderType, TimeInForce};
    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::{delete, get},
        Json, Router,
    };
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn stock_backend() -> Router {
        Router::new()
            .route(
                "/api/stocks/account",
                get(|| async {
                    Json(json!({"portfolio_value": "10500.00", "buying_power": "4000", "cash": "2000",
                                "equity": "10500", "last_equity": "10000"}))
                }),
            )
            .route(
                "/api/stocks/portfolio",
                get(|| async {
                    Json(json!({"positions": [{"symbol": "AAPL", "qty": "10", "avg_entry_price": "150",
                        "current_price": "175", "market_value": "1750", "unrealized_pl": "250",
                        "unrealized_plpc": "0.1667"}]}))
                }),
            )
            .route(
                "/api/stocks/orders",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let status = params.get("status").cloned().unwrap_or_default();
                    let orders = if status == "open" {
                        json!([{"id": "o-1", "symbol": "MSFT", "type": "limit", "side": "buy", "qty": "2",
                                "limit_price": "300", "status": "new"}])
                    } else {
                        json!([])
                    };
                    Json(json!({"orders": orders}))
                })
                .post(|Json(body): Json<Value>| async move {
                    Json(json!({"id": "o-2", "status": "accepted", "symbol": body["symbol"]}))
                }),
            )
            .route(
                "/api/stocks/orders/:id",
                delete(|Path(id): Path<String>| async move {
                    if id == "o-1" {
                        (StatusCode::OK, Json(json!({"canceled": true})))
                    } else {
                        (StatusCode::NOT_FOUND, Json(json!({"error": "unknown order"})))
                    }
                }),
            )
            .route(
                "/api/stocks/:symbol",
                get(|Path(symbol): Path<String>| async move {
                    if symbol == "AAPL" {
                        (StatusCode::OK, Json(json!({"symbol": "AAPL", "quote": {
                            "price": 189.84, "change": "-1.02", "changePercent": "-0.5344", "volume": "48122900"
                        }})))
                    } else {
                        (StatusCode::NOT_FOUND, Json(json!({"error": "not found"})))
                    }
                }),
            )
            .route(
                "/api/stocks/:symbol/history",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let n = if params.get("timeframe").map(String::as_str) == Some("1W") { 2 } else { 1 };
                    let history: Vec<Value> = (0..n)
                        .map(|i| json!({"timestamp": 1_700_000_000_000_i64 + i, "price": 100.0 + i as f64}))
                        .collect();
                    Json(json!({"history": history}))
                }),
            )
    }

    #[tokio::test]
    async fn test_account_and_portfolio() {
        let provider = BackendStockProvider::new(&spawn_backend(stock_backend()).await);

        let account = provider.account().await.unwrap();
        assert_eq!(account.portfolio_value, dec!(10500));
        assert_eq!(account.daily_pl(), Some((dec!(500), dec!(5))));

        let positions = provider.positions().await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].qty, dec!(10));
    }

    #[tokio::test]
    async fn test_orders_by_status() {
        let provider = BackendStockProvider::new(&spawn_backend(stock_backend()).await);
        let open = provider.orders(OrderStatusFilter::Open).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].order_type, OrderType::Limit);
        assert!(provider.orders(OrderStatusFilter::Closed).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quote_and_history() {
        let provider = BackendStockProvider::new(&spawn_backend(stock_backend()).await);

        let quote = provider.quote("AAPL").await.unwrap();
        assert_eq!(quote.name, "Apple Inc.");
        assert_eq!(quote.price, dec!(189.84));
        assert_eq!(quote.volume, 48_122_900);
        assert!(!quote.is_up());

        let err = provider.quote("ZZZZ").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        assert_eq!(provider.history("AAPL", Timeframe::OneWeek).await.unwrap().len(), 2);
        assert_eq!(provider.history("AAPL", Timeframe::OneDay).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_place_and_cancel() {
        let provider = BackendStockProvider::new(&spawn_backend(stock_backend()).await);

        let request = OrderRequest::limit("MSFT", Side::Sell, dec!(3), dec!(310.5));
        let order = provider.place_order(&request).await.unwrap();
        assert_eq!(order.id, "o-2");
        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(order.symbol, "MSFT");
        assert_eq!(order.side, Side::Sell);

        assert!(provider.cancel_order("o-1").await.is_ok());
        assert!(matches!(provider.cancel_order("nope").await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_network_failure_propagates() {
        let provider = BackendStockProvider::new("http://127.0.0.1:9");
        assert!(provider.account().await.is_err());
        assert!(provider.positions().await.is_err());
    }

    #[test]
    fn test_order_body_signs_quantity() {
        let mut request = OrderRequest::market("AAPL", Side::Sell, dec!(4));
        request.time_in_force = TimeInForce::Gtc;
        let body = serde_json::to_value(BackendOrderBody::from_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({"symbol": "AAPL", "quantity": -4.0, "orderType": "market", "timeInForce": "gtc"})
        );

        let mut stop_limit = OrderRequest::limit("AAPL", Side::Buy, dec!(1), dec!(101));
        stop_limit.order_type = OrderType::StopLimit;
        stop_limit.stop_price = Some(dec!(100));
        let body = serde_json::to_value(BackendOrderBody::from_request(&stop_limit)).unwrap();
        assert_eq!(body["orderType"], "stop-limit");
        assert_eq!(body["quantity"], 1.0);
        assert_eq!(body["stopPrice"], 100.0);
        assert_eq!(body["limitPrice"], 101.0);
    }
}
