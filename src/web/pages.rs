//! Server-rendered HTML for the dashboard pages

use rust_decimal::Decimal;
use std::fmt::Write;

use crate::charts::{escape, LineChart};
use crate::dashboard::DashboardCharts;
use crate::format::{format_currency, format_currency_f64, format_number};
use crate::stocks::{Banner, ChartArea, Panel, StockDashboard};
use crate::tracker::ExpenseTracker;
use crate::types::{DashboardSummary, Order, OrderStatusFilter, OrderType, Position, StockQuote, Timeframe};

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f5f7fa; color: #222; }
nav { background: #16202a; padding: 1rem 2rem; display: flex; gap: 1.5rem; }
nav a { color: #e7e9ea; text-decoration: none; font-weight: 600; }
.container { padding: 1.5rem; max-width: 1400px; margin: 0 auto; }
.grid { display: grid; gap: 1rem; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); }
.card { background: #fff; border-radius: 10px; padding: 1.25rem; border: 1px solid #e1e4e8; margin-bottom: 1rem; }
.card-title { font-size: 0.8rem; color: #71767b; text-transform: uppercase; margin-bottom: 0.5rem; }
.card-value { font-size: 1.6rem; font-weight: 700; }
.profit, .positive { color: #1a7f37; }
.loss, .negative { color: #cf222e; }
.error-message { background: #ffebe9; color: #cf222e; padding: 0.6rem 1rem; border-radius: 6px; margin: 0.5rem 0; }
.success-message { background: #dafbe1; color: #1a7f37; padding: 0.6rem 1rem; border-radius: 6px; margin: 0.5rem 0; }
.loading { color: #71767b; font-style: italic; }
.no-data { color: #71767b; padding: 1rem 0; }
table { width: 100%; border-collapse: collapse; }
th, td { padding: 0.5rem; text-align: left; border-bottom: 1px solid #e1e4e8; font-size: 0.9rem; }
th { color: #71767b; font-size: 0.75rem; text-transform: uppercase; }
form.inline { display: inline; }
input, select, button { padding: 0.35rem 0.5rem; margin: 0.2rem; }
.tabs a { margin-right: 1rem; }
.tabs a.active { font-weight: 700; }
"#;

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<nav><a href="/">Dashboard</a><a href="/stocks">Stocks</a><a href="/expenses">Expense Tracker</a></nav>
<div class="container">
<h1>{title}</h1>
{body}
</div>
</body>
</html>"#,
        title = escape(title),
        style = STYLE,
        body = body
    )
}

fn banner(banner: Option<&Banner>) -> String {
    match banner {
        Some(b) => format!(r#"<div class="{}">{}</div>"#, b.kind.css_class(), escape(&b.message)),
        None => String::new(),
    }
}

fn card(title: &str, value: &str, class: &str) -> String {
    format!(
        r#"<div class="card"><div class="card-title">{}</div><div class="card-value {}">{}</div></div>"#,
        escape(title),
        class,
        escape(value)
    )
}

/// Loading flag and error banner shared by every stock panel
fn panel_status<T>(panel: &Panel<T>) -> String {
    let mut out = banner(panel.visible_error());
    if panel.loading {
        out.push_str(r#"<div class="loading">Loading...</div>"#);
    }
    out
}

pub fn home_page(summary: &DashboardSummary, charts: &DashboardCharts) -> String {
    let mut body = String::from(r#"<div class="grid">"#);
    for (title, value) in [
        ("Net Worth", summary.net_worth),
        ("Total Income", summary.total_income),
        ("Total Expenses", summary.total_expenses),
        ("Total Investments", summary.total_investments),
    ] {
        body.push_str(&card(title, &format_currency(Decimal::from(value)), ""));
    }
    body.push_str(&card("Bills Due", &format_number(summary.bills_due), ""));
    body.push_str(&card(
        "Yearly Expenses",
        &format_currency_f64(summary.yearly_expenses()),
        "",
    ));
    body.push_str("</div>");

    for (name, svg) in charts.iter() {
        let _ = write!(body, r#"<div class="card" id="{}">{}</div>"#, name, svg);
    }

    layout("Financial Dashboard", &body)
}

pub fn expenses_page(tracker: &ExpenseTracker, message: Option<&Banner>) -> String {
    let mut body = banner(message);
    body.push_str(
        r#"<div class="card"><form method="post" action="/expenses">
<input name="amount" placeholder="Amount" inputmode="decimal">
<input name="category" placeholder="Category">
<button type="submit">Add Expense</button>
</form></div>"#,
    );

    body.push_str(r#"<div class="card"><div class="card-title">Expenses</div>"#);
    if tracker.is_empty() {
        body.push_str(r#"<div class="no-data">No expenses recorded yet.</div>"#);
    } else {
        body.push_str("<table><tr><th>Category</th><th>Amount</th><th>Added</th></tr>");
        for entry in tracker.entries() {
            let _ = write!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&entry.category),
                format_currency(entry.amount),
                entry.added_at.format("%Y-%m-%d %H:%M")
            );
        }
        body.push_str("</table>");
    }
    body.push_str("</div>");

    let _ = write!(
        body,
        r#"<div class="card"><div class="card-title">Total Spending</div><div class="card-value">{}</div><ul>"#,
        format_currency(tracker.total_spending())
    );
    for line in tracker.category_lines() {
        let _ = write!(body, "<li>{}</li>", escape(&line));
    }
    body.push_str("</ul></div>");

    layout("Expense Tracker", &body)
}

pub fn stocks_page(dash: &StockDashboard, orders: OrderStatusFilter) -> String {
    let mut body = String::new();
    body.push_str(&account_section(dash));
    body.push_str(&banner(dash.order_error()));
    body.push_str(&banner(dash.order_success()));
    body.push_str(&search_section(dash));
    body.push_str(&portfolio_section(&dash.portfolio));
    body.push_str(&orders_section(dash.orders_panel(orders), orders));
    layout("Stock Trading", &body)
}

fn account_section(dash: &StockDashboard) -> String {
    let view = &dash.account.data;
    let mut out = panel_status(&dash.account);
    out.push_str(r#"<div class="grid">"#);
    out.push_str(&card("Portfolio Value", &view.portfolio_value, ""));
    out.push_str(&card("Buying Power", &view.buying_power, ""));
    out.push_str(&card("Cash", &view.cash, ""));
    out.push_str(&card("Today's P&L", &view.pl, view.pl_class.css_class()));
    out.push_str("</div>");
    out
}

fn search_section(dash: &StockDashboard) -> String {
    let state = &dash.search.data;
    let symbol = state.symbol.as_deref().unwrap_or("");
    let mut out = String::from(r#"<div class="card"><div class="card-title">Search</div>"#);
    let _ = write!(
        out,
        r#"<form method="post" action="/stocks/search">
<input name="symbol" placeholder="Symbol (e.g. AAPL)" value="{}">
<input type="hidden" name="timeframe" value="{}">
<button type="submit">Search</button>
</form>"#,
        escape(symbol),
        state.timeframe
    );
    out.push_str(&panel_status(&dash.search));

    if let Some(quote) = &state.quote {
        out.push_str(&quote_block(quote));

        out.push_str(r#"<div class="tabs">"#);
        for timeframe in Timeframe::all() {
            let active = if timeframe == state.timeframe { " class=\"active\"" } else { "" };
            let _ = write!(
                out,
                r#"<a{} href="/stocks?symbol={}&timeframe={}">{}</a>"#,
                active,
                escape(&quote.symbol),
                timeframe,
                timeframe
            );
        }
        out.push_str("</div>");
        out.push_str(&chart_block(&state.chart));
        out.push_str(&order_form_block(dash));
    }

    out.push_str("</div>");
    out
}

fn quote_block(quote: &StockQuote) -> String {
    let class = if quote.is_up() { "positive" } else { "negative" };
    let sign = if quote.is_up() { "+" } else { "" };
    format!(
        r#"<div class="quote"><h2>{name} ({symbol})</h2>
<div class="card-value">{price}</div>
<div class="{class}">{sign}{change:.2} ({sign}{pct:.2}%)</div>
<div>Volume: {volume}</div></div>"#,
        name = escape(&quote.name),
        symbol = escape(&quote.symbol),
        price = format_currency(quote.price),
        class = class,
        sign = sign,
        change = quote.change,
        pct = quote.change_percent,
        volume = format_number(quote.volume)
    )
}

fn chart_block(chart: &ChartArea) -> String {
    let mut out = String::from(r#"<div class="chart-area">"#);
    match chart {
        ChartArea::Loaded { symbol, points, .. } => {
            let prices = points.iter().map(|p| p.price).collect();
            out.push_str(&LineChart::new(symbol.clone(), prices).render());
        }
        ChartArea::Empty | ChartArea::Error(_) => {}
    }
    if let Some(caption) = chart.caption() {
        let _ = write!(out, "<p>{}</p>", escape(&caption));
    }
    out.push_str("</div>");
    out
}

fn order_form_block(dash: &StockDashboard) -> String {
    let form = &dash.order_form;
    let mut out = String::from(r#"<form method="post" action="/stocks/orders">"#);
    let _ = write!(
        out,
        r#"<input type="hidden" name="symbol" value="{}"><input type="hidden" name="timeframe" value="{}"><select name="order_type">"#,
        escape(dash.search.data.symbol.as_deref().unwrap_or("")),
        dash.search.data.timeframe
    );
    for order_type in OrderType::all() {
        let _ = write!(out, r#"<option value="{}">{}</option>"#, order_type, order_type.label());
    }
    let _ = write!(
        out,
        r#"</select>
<input name="quantity" placeholder="Quantity" value="{}">
<select name="time_in_force"><option value="day">Day</option><option value="gtc">GTC</option><option value="ioc">IOC</option><option value="fok">FOK</option></select>
<input name="limit_price" placeholder="Limit price" value="{}">
<input name="stop_price" placeholder="Stop price" value="{}">
<input name="trail_percent" placeholder="Trail %" value="{}">
<button type="submit" name="side" value="buy">Buy</button>
<button type="submit" name="side" value="sell">Sell</button>
</form>"#,
        escape(&form.quantity),
        escape(&form.limit_price),
        escape(&form.stop_price),
        escape(&form.trail_percent)
    );
    out
}

fn portfolio_section(panel: &Panel<Vec<Position>>) -> String {
    let mut out = String::from(r#"<div class="card"><div class="card-title">Portfolio</div>"#);
    out.push_str(&panel_status(panel));

    if panel.data.is_empty() {
        out.push_str(r#"<div class="no-data">No positions found.</div></div>"#);
        return out;
    }

    out.push_str(
        "<table><tr><th>Symbol</th><th>Quantity</th><th>Avg Price</th><th>Current Price</th>\
         <th>Market Value</th><th>P&amp;L</th><th>Actions</th></tr>",
    );
    for position in &panel.data {
        let class = if position.unrealized_pl >= Decimal::ZERO { "profit" } else { "loss" };
        let symbol = escape(&position.symbol);
        let _ = write!(
            out,
            r#"<tr><td>{symbol}</td><td>{qty}</td><td>{avg}</td><td>{current}</td><td>{value}</td>
<td class="{class}">{pl} ({pct:.2}%)</td>
<td><a href="/stocks?symbol={symbol}">Buy More</a> <a href="/stocks?symbol={symbol}&qty={qty}">Sell</a></td></tr>"#,
            symbol = symbol,
            qty = position.qty.normalize(),
            avg = format_currency(position.avg_entry_price),
            current = format_currency(position.current_price),
            value = format_currency(position.market_value),
            class = class,
            pl = format_currency(position.unrealized_pl),
            pct = position.pl_percentage(),
        );
    }
    out.push_str("</table></div>");
    out
}

fn orders_section(panel: &Panel<Vec<Order>>, status: OrderStatusFilter) -> String {
    let mut out = String::from(r#"<div class="card"><div class="card-title">Orders</div><div class="tabs">"#);
    for (filter, label) in [(OrderStatusFilter::Open, "Open"), (OrderStatusFilter::Closed, "Filled")] {
        let active = if filter == status { " class=\"active\"" } else { "" };
        let _ = write!(out, r#"<a{} href="/stocks?orders={}">{}</a>"#, active, filter.as_str(), label);
    }
    out.push_str("</div>");
    out.push_str(&panel_status(panel));

    if panel.data.is_empty() {
        out.push_str(r#"<div class="no-data">No orders found.</div></div>"#);
        return out;
    }

    out.push_str(
        "<table><tr><th>Symbol</th><th>Type</th><th>Side</th><th>Quantity</th><th>Price</th>\
         <th>Status</th><th>Date</th><th></th></tr>",
    );
    for order in &panel.data {
        let price = order
            .display_price()
            .map(format_currency)
            .unwrap_or_else(|| "Market".to_string());
        let created = order
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let action = if order.status.is_open() {
            format!(
                r#"<form class="inline" method="post" action="/stocks/orders/{}/cancel"><button type="submit">Cancel</button></form>"#,
                escape(&order.id)
            )
        } else {
            String::new()
        };
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&order.symbol),
            order.order_type.label(),
            order.side.as_str().to_uppercase(),
            order.qty.normalize(),
            price,
            order.status,
            created,
            action
        );
    }
    out.push_str("</table></div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fallback_dashboard_document;
    use crate::stocks::MockStockProvider;
    use crate::types::{OrderRequest, Side};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;

    fn dashboard() -> StockDashboard {
        StockDashboard::new(Arc::new(MockStockProvider::new()), Duration::from_secs(5))
    }

    #[test]
    fn test_home_page_with_fallback_document() {
        let summary = DashboardSummary::from_document(&fallback_dashboard_document());
        let html = home_page(&summary, &DashboardCharts::render(&summary));
        assert!(html.contains("Net Worth"));
        assert!(html.contains("$0.00"));
        assert_eq!(html.matches("<svg").count(), 5);
    }

    #[test]
    fn test_empty_stock_panels() {
        let mut dash = dashboard();
        dash.reset_to_empty();
        let html = stocks_page(&dash, OrderStatusFilter::Open);
        assert!(html.contains("$0.00 (0.00%)"));
        assert!(html.contains("No positions found."));
        assert!(html.contains("No orders found."));
        assert!(!html.contains("order_type"));
    }

    #[test]
    fn test_rows_carry_actions() {
        let mut dash = dashboard();
        dash.portfolio.data = vec![Position::new("AAPL", dec!(10), dec!(150), dec!(165))];
        let mut open = Order::filled_from_request(&OrderRequest::limit("MSFT", Side::Buy, dec!(2), dec!(300)), dec!(300));
        open.status = crate::types::OrderStatus::Accepted;
        dash.open_orders.data = vec![open.clone()];

        let html = stocks_page(&dash, OrderStatusFilter::Open);
        assert!(html.contains(r#"href="/stocks?symbol=AAPL&qty=10""#));
        assert!(html.contains("10.00%"));
        assert!(html.contains(&format!("/stocks/orders/{}/cancel", open.id)));
        assert!(html.contains("$300.00"));
    }

    #[test]
    fn test_expenses_page_escapes_categories() {
        let mut tracker = ExpenseTracker::new();
        tracker.add_expense(dec!(4.5), "<b>Coffee</b>").unwrap();
        let html = expenses_page(&tracker, None);
        assert!(html.contains("&lt;b&gt;Coffee&lt;/b&gt;: $4.50"));
        assert!(!html.contains("<b>Coffee"));
    }
}
