mod api;
mod auth;
mod charts;
mod config;
mod dashboard;
mod error;
mod format;
mod stocks;
mod tracker;
mod types;
mod web;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::Value;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api::{BalanceSheetItem, BalanceSheetKind, DashboardClient, NewExpense, NewIncome};
use config::AppConfig;
use dashboard::DashboardCharts;
use format::{format_currency, format_currency_f64, format_number};
use stocks::{banner_ttl, build_provider, AccountView, OrderForm, StockDashboard, StockProvider};
use tracker::{ExpenseTracker, TrackerError};
use types::{field_number, DashboardSummary, FieldDocument, OrderStatusFilter, OrderType, Side, Timeframe};
use web::{start_dashboard_server, AppState};

#[derive(Parser)]
#[command(name = "finance-dashboard")]
#[command(version = "0.1.0")]
#[command(about = "Personal finance dashboard: summary charts, expenses and stock trading", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "finance_dashboard.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard pages
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the home summary and optionally write every chart as SVG
    Summary {
        /// Directory to write the chart SVGs into
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Expenses stored by the backend
    Expenses {
        #[command(subcommand)]
        action: ExpenseCommand,
    },
    /// Income stored by the backend
    Income {
        #[command(subcommand)]
        action: IncomeCommand,
    },
    /// Assets on the balance sheet
    Asset {
        #[command(subcommand)]
        action: BalanceSheetCommand,
    },
    /// Liabilities on the balance sheet
    Liability {
        #[command(subcommand)]
        action: BalanceSheetCommand,
    },
    /// Local expense tracker: reads "<amount> <category>" lines from stdin
    Track,
    /// Stock trading
    Stocks {
        #[command(subcommand)]
        action: StockCommand,
    },
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ExpenseCommand {
    List,
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        category: String,
        #[arg(short, long)]
        total: f64,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
enum IncomeCommand {
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        total: f64,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// e.g. monthly, weekly
        #[arg(short, long)]
        frequency: Option<String>,
        #[arg(short, long)]
        recurring: bool,
    },
}

#[derive(Subcommand)]
enum BalanceSheetCommand {
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        amount: f64,
    },
}

#[derive(Subcommand)]
enum StockCommand {
    Account,
    Portfolio,
    Orders {
        /// open or closed
        #[arg(short, long, default_value = "open")]
        status: String,
    },
    Search {
        symbol: String,
        /// 1D, 1W, 1M, 3M, 1Y or ALL (default: stocks.default_timeframe)
        #[arg(short, long)]
        timeframe: Option<String>,
    },
    Order {
        symbol: String,
        /// buy or sell
        side: String,
        quantity: String,
        /// market, limit, stop, stop-limit or trailing-stop
        #[arg(short = 't', long, default_value = "market")]
        order_type: String,
        #[arg(long, default_value = "day")]
        time_in_force: String,
        #[arg(long)]
        limit_price: Option<String>,
        #[arg(long)]
        stop_price: Option<String>,
        #[arg(long)]
        trail_percent: Option<String>,
    },
    Cancel {
        order_id: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write the default configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if cli.json_logs {
        let subscriber = tracing_subscriber::fmt().with_env_filter(filter).json().finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    if let Commands::Config { action: ConfigCommand::Init } = cli.command {
        return config::write_default(&cli.config);
    }

    let app_config = config::load(&cli.config)?;
    let client = DashboardClient::new(
        app_config.api.base_url.clone(),
        Duration::from_secs(app_config.api.dashboard_timeout_secs),
    );

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(app_config.server.port);
            let provider = build_provider(&app_config)?;
            start_dashboard_server(AppState::new(app_config, provider), port).await?;
        }
        Commands::Summary { out } => {
            show_summary(&client, out.as_deref()).await?;
        }
        Commands::Expenses { action } => match action {
            ExpenseCommand::List => list_expenses(&client).await,
            ExpenseCommand::Add { name, category, total, date } => {
                let expense = NewExpense {
                    name,
                    category,
                    total,
                    date: date.unwrap_or_else(today),
                };
                let saved = client.add_expense(&expense).await?;
                println!("Saved expense: {}", saved);
            }
        },
        Commands::Income { action } => match action {
            IncomeCommand::Add { name, total, date, frequency, recurring } => {
                let income = NewIncome {
                    name,
                    total,
                    date: date.unwrap_or_else(today),
                    frequency,
                    recurring,
                };
                let saved = client.add_income(&income).await?;
                println!("Saved income: {}", saved);
            }
        },
        Commands::Asset { action } => {
            save_balance_sheet_item(&client, BalanceSheetKind::Asset, action).await?;
        }
        Commands::Liability { action } => {
            save_balance_sheet_item(&client, BalanceSheetKind::Liability, action).await?;
        }
        Commands::Track => {
            run_tracker()?;
        }
        Commands::Stocks { action } => {
            run_stock_command(&app_config, action).await?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

async fn show_summary(client: &DashboardClient, out: Option<&str>) -> Result<()> {
    let summary = DashboardSummary::from_document(&client.fetch_dashboard_data().await);

    println!("\n=== Financial Summary ===");
    println!("Net Worth:         {}", format_currency(Decimal::from(summary.net_worth)));
    println!("Total Income:      {}", format_currency(Decimal::from(summary.total_income)));
    println!("Total Expenses:    {}", format_currency(Decimal::from(summary.total_expenses)));
    println!("Total Investments: {}", format_currency(Decimal::from(summary.total_investments)));
    println!("Bills Due:         {}", format_number(summary.bills_due));

    println!("\n--- Quarterly Expenses ---");
    for (i, total) in summary.quarterly_expenses().iter().enumerate() {
        println!("Q{}: {}", i + 1, format_currency_f64(*total));
    }

    if let Some(dir) = out {
        std::fs::create_dir_all(dir)?;
        let charts = DashboardCharts::render(&summary);
        for (name, svg) in charts.iter() {
            let path = Path::new(dir).join(format!("{}.svg", name));
            std::fs::write(&path, svg)?;
            info!("Wrote {}", path.display());
        }
    }

    Ok(())
}

/// One line per backend document; field-typed documents get columns
fn describe_document(value: &Value) -> String {
    let doc = FieldDocument::from_value(value.clone());
    if doc.fields.is_empty() {
        return value.to_string();
    }
    let total = doc.field("total").and_then(field_number).unwrap_or(0.0);
    format!(
        "{:<24} {:<16} {:>14} {}",
        doc.string("name"),
        doc.string("category"),
        format_currency_f64(total),
        doc.string("date")
    )
}

async fn list_expenses(client: &DashboardClient) {
    let expenses = client.fetch_expenses_data().await;
    println!("\n=== Expenses ===");
    if expenses.documents.is_empty() {
        println!("No expenses found");
    }
    for doc in &expenses.documents {
        println!("{}", describe_document(doc));
    }
}

async fn save_balance_sheet_item(
    client: &DashboardClient,
    kind: BalanceSheetKind,
    action: BalanceSheetCommand,
) -> Result<()> {
    let BalanceSheetCommand::Add { name, amount } = action;
    let saved = client
        .save_asset_liability(kind, &BalanceSheetItem { name, amount })
        .await?;
    println!("Saved {}: {}", kind.as_str(), saved);
    Ok(())
}

fn run_tracker() -> Result<()> {
    let mut tracker = ExpenseTracker::new();
    println!("Enter expenses as \"<amount> <category>\", empty line to finish");

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let (amount, category) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let result = amount
            .trim_start_matches('$')
            .parse::<Decimal>()
            .map_err(|_| TrackerError::InvalidAmount)
            .and_then(|amount| tracker.add_expense(amount, category).map(|_| ()));
        if let Err(e) = result {
            println!("{}", e);
        }
    }

    println!("\n{}", tracker);
    Ok(())
}

async fn run_stock_command(app_config: &AppConfig, action: StockCommand) -> Result<()> {
    let provider: Arc<dyn StockProvider> = build_provider(app_config)?;
    let ttl = banner_ttl(app_config);

    match action {
        StockCommand::Account => {
            let view = AccountView::from_account(&provider.account().await?);
            println!("\n=== Account ===");
            println!("Portfolio Value: {}", view.portfolio_value);
            println!("Buying Power:    {}", view.buying_power);
            println!("Cash:            {}", view.cash);
            println!("Today's P&L:     {}", view.pl);
        }
        StockCommand::Portfolio => {
            let positions = provider.positions().await?;
            println!("\n=== Portfolio ===");
            if positions.is_empty() {
                println!("No positions found");
            }
            for p in positions {
                println!(
                    "{:<6} {:>8} @ {:>12} | now {:>12} | value {:>14} | P&L {} ({:.2}%)",
                    p.symbol,
                    p.qty.normalize(),
                    format_currency(p.avg_entry_price),
                    format_currency(p.current_price),
                    format_currency(p.market_value),
                    format_currency(p.unrealized_pl),
                    p.pl_percentage()
                );
            }
        }
        StockCommand::Orders { status } => {
            let status: OrderStatusFilter = status.parse().map_err(|e: String| anyhow!(e))?;
            let orders = provider.orders(status).await?;
            println!("\n=== {} Orders ===", status.as_str());
            if orders.is_empty() {
                println!("No orders found");
            }
            for o in orders {
                let price = o
                    .display_price()
                    .map(format_currency)
                    .unwrap_or_else(|| "Market".to_string());
                println!(
                    "{} {:<6} {:<13} {:<4} {:>8} {:>12} {}",
                    o.id,
                    o.symbol,
                    o.order_type.label(),
                    o.side,
                    o.qty.normalize(),
                    price,
                    o.status
                );
            }
        }
        StockCommand::Search { symbol, timeframe } => {
            let timeframe = match timeframe {
                Some(t) => t.parse::<Timeframe>().map_err(|e| anyhow!(e))?,
                None => app_config.stocks.default_timeframe,
            };
            let mut dash = StockDashboard::new(provider, ttl).with_timeframe(timeframe);
            dash.search_stock(&symbol).await;
            if let Some(banner) = dash.search.visible_error() {
                return Err(anyhow!(banner.message.clone()));
            }
            if let Some(quote) = &dash.search.data.quote {
                let sign = if quote.is_up() { "+" } else { "" };
                println!("\n=== {} ({}) ===", quote.name, quote.symbol);
                println!("Price:  {}", format_currency(quote.price));
                println!("Change: {}{:.2} ({}{:.2}%)", sign, quote.change, sign, quote.change_percent);
                println!("Volume: {}", format_number(quote.volume));
            }
            if let Some(caption) = dash.search.data.chart.caption() {
                println!("{}", caption);
            }
        }
        StockCommand::Order {
            symbol,
            side,
            quantity,
            order_type,
            time_in_force,
            limit_price,
            stop_price,
            trail_percent,
        } => {
            let side: Side = side.parse().map_err(|e: String| anyhow!(e))?;
            let order_type: OrderType = order_type.parse().map_err(|e: String| anyhow!(e))?;
            let form = OrderForm {
                quantity,
                time_in_force,
                limit_price: limit_price.unwrap_or_default(),
                stop_price: stop_price.unwrap_or_default(),
                trail_percent: trail_percent.unwrap_or_default(),
            };

            let mut dash = StockDashboard::new(provider, ttl);
            dash.search_stock(&symbol).await;
            if let Some(banner) = dash.search.visible_error() {
                return Err(anyhow!(banner.message.clone()));
            }
            match dash.place_order(order_type, side, form).await {
                Some(order) => println!("Order {} placed successfully: {}", order.id, order.status),
                None => {
                    let message = dash
                        .order_error()
                        .map(|b| b.message.clone())
                        .unwrap_or_else(|| "Order was not placed".to_string());
                    error!("{}", message);
                    return Err(anyhow!(message));
                }
            }
        }
        StockCommand::Cancel { order_id } => {
            provider.cancel_order(&order_id).await?;
            println!("Order canceled successfully.");
        }
    }

    Ok(())
}
