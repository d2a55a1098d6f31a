use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::{pages, AppState};
use crate::auth::AuthCookies;
use crate::dashboard::DashboardCharts;
use crate::format::format_currency;
use crate::stocks::{Banner, OrderForm, StockDashboard};
use crate::tracker::TrackerError;
use crate::types::{DashboardSummary, OrderStatusFilter, OrderType, Side, Timeframe};

#[derive(Debug, Default, Deserialize)]
pub struct StocksQuery {
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
    pub orders: Option<String>,
    /// Prefills the order quantity, used by the portfolio "Sell" link
    pub qty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchSubmission {
    pub symbol: String,
    #[serde(default)]
    pub timeframe: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderSubmission {
    pub order_type: String,
    pub side: String,
    /// Symbol of the quote the form was rendered under
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub time_in_force: String,
    #[serde(default)]
    pub limit_price: String,
    #[serde(default)]
    pub stop_price: String,
    #[serde(default)]
    pub trail_percent: String,
}

impl OrderSubmission {
    fn form(&self) -> OrderForm {
        OrderForm {
            quantity: self.quantity.clone(),
            time_in_force: self.time_in_force.clone(),
            limit_price: self.limit_price.clone(),
            stop_price: self.stop_price.clone(),
            trail_percent: self.trail_percent.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExpenseSubmission {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub category: String,
}

// === Summary ===

pub async fn health_check() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub async fn home(State(state): State<AppState>) -> Html<String> {
    let summary = DashboardSummary::from_document(&state.client.fetch_dashboard_data().await);
    let charts = DashboardCharts::render(&summary);
    Html(pages::home_page(&summary, &charts))
}

pub async fn chart_svg(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let summary = DashboardSummary::from_document(&state.client.fetch_dashboard_data().await);
    let charts = DashboardCharts::render(&summary);
    match charts.get(&name) {
        Some(svg) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg.to_string()).into_response(),
        None => {
            debug!("Unknown chart requested: {}", name);
            (StatusCode::NOT_FOUND, format!("No chart named {}", name)).into_response()
        }
    }
}

// === Stocks ===

/// Builds this caller's stock view and runs the cookie gate. Without both
/// auth cookies the view stays in the all-zero empty state.
async fn stock_dashboard_for(state: &AppState, headers: &HeaderMap) -> StockDashboard {
    let cookies = AuthCookies::from_headers(headers);
    let mut dash = state.stock_dashboard();
    dash.initialize(&cookies).await;
    dash
}

pub async fn stocks_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StocksQuery>,
) -> Html<String> {
    let orders = parse_orders_filter(query.orders.as_deref());
    let mut dash = stock_dashboard_for(&state, &headers).await;
    if !dash.is_authenticated() {
        return Html(pages::stocks_page(&dash, orders));
    }

    if orders == OrderStatusFilter::Closed {
        dash.fetch_orders(orders).await;
    }
    if let Some(symbol) = query.symbol.as_deref().filter(|s| !s.trim().is_empty()) {
        if let Some(timeframe) = parse_timeframe(query.timeframe.as_deref()) {
            dash.search.data.timeframe = timeframe;
        }
        dash.search_stock(symbol).await;
    }
    if let Some(qty) = query.qty {
        dash.order_form.quantity = qty;
    }

    Html(pages::stocks_page(&dash, orders))
}

pub async fn search_stock(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(search): Form<SearchSubmission>,
) -> Html<String> {
    let mut dash = stock_dashboard_for(&state, &headers).await;
    if dash.is_authenticated() {
        if let Some(timeframe) = parse_timeframe(search.timeframe.as_deref()) {
            dash.search.data.timeframe = timeframe;
        }
        dash.search_stock(&search.symbol).await;
    }
    Html(pages::stocks_page(&dash, OrderStatusFilter::Open))
}

pub async fn place_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(submission): Form<OrderSubmission>,
) -> Response {
    let (order_type, side) = match (
        submission.order_type.parse::<OrderType>(),
        submission.side.parse::<Side>(),
    ) {
        (Ok(order_type), Ok(side)) => (order_type, side),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Rejected order submission: {}", e);
            return (StatusCode::BAD_REQUEST, e).into_response();
        }
    };

    let mut dash = stock_dashboard_for(&state, &headers).await;
    if !dash.is_authenticated() {
        warn!("Order submission without auth cookies ignored");
        return Html(pages::stocks_page(&dash, OrderStatusFilter::Open)).into_response();
    }

    let symbol = submission.symbol.trim().to_uppercase();
    if let Some(timeframe) = parse_timeframe(submission.timeframe.as_deref()) {
        dash.search.data.timeframe = timeframe;
    }
    if !symbol.is_empty() {
        dash.search.data.symbol = Some(symbol.clone());
    }

    let placed = dash.place_order(order_type, side, submission.form()).await;
    match placed {
        Some(order) => info!("Order {} for {} submitted from the web front", order.id, order.symbol),
        // bring the quote and the kept form back so the order can be corrected
        None if !symbol.is_empty() && dash.search.data.quote.is_none() => dash.search_stock(&symbol).await,
        None => {}
    }
    Html(pages::stocks_page(&dash, OrderStatusFilter::Open)).into_response()
}

pub async fn cancel_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Html<String> {
    let mut dash = stock_dashboard_for(&state, &headers).await;
    if dash.is_authenticated() {
        dash.cancel_order(&order_id).await;
    } else {
        warn!("Cancel of order {} without auth cookies ignored", order_id);
    }
    Html(pages::stocks_page(&dash, OrderStatusFilter::Open))
}

// === Local expense tracker ===

pub async fn expenses_page(State(state): State<AppState>) -> Html<String> {
    let tracker = state.tracker.lock().await;
    Html(pages::expenses_page(&tracker, None))
}

pub async fn add_expense(State(state): State<AppState>, Form(submission): Form<ExpenseSubmission>) -> Response {
    let mut tracker = state.tracker.lock().await;
    let result = Decimal::from_str(submission.amount.trim())
        .map_err(|_| TrackerError::InvalidAmount)
        .and_then(|amount| {
            tracker
                .add_expense(amount, &submission.category)
                .map(|entry| format!("Added {} to {}", format_currency(entry.amount), entry.category))
        });

    let ttl = state.banner_ttl();
    match result {
        Ok(message) => Html(pages::expenses_page(&tracker, Some(&Banner::success(message, ttl)))).into_response(),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(pages::expenses_page(&tracker, Some(&Banner::error(e.to_string(), ttl)))),
        )
            .into_response(),
    }
}

fn parse_orders_filter(value: Option<&str>) -> OrderStatusFilter {
    value.and_then(|v| v.parse().ok()).unwrap_or(OrderStatusFilter::Open)
}

fn parse_timeframe(value: Option<&str>) -> Option<Timeframe> {
    value.and_then(|v| v.parse().ok())
}
