use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::types::{Account, Order, OrderRequest, OrderStatusFilter, Position, Side};

#[derive(Debug)]
struct MockBook {
    cash: Decimal,
    positions: BTreeMap<String, Position>,
    history: Vec<Order>,
}

impl MockBook {
    /// Equity and last equity, None when either leaves the `Decimal` range
    fn equity(&self) -> Option<(Decimal, Decimal)> {
        let mut market_value = Decimal::ZERO;
        let mut cost_basis = Decimal::ZERO;
        for position in self.positions.values() {
            market_value = market_value.checked_add(position.market_value)?;
            cost_basis = cost_basis.checked_add(position.avg_entry_price.checked_mul(position.qty)?)?;
        }
        Some((self.cash.checked_add(market_value)?, self.cash.checked_add(cost_basis)?))
    }

    /// Applies new cash and one position change, rolling both back when the
    /// resulting book can no longer be valued
    fn commit(&mut self, cash: Decimal, symbol: &str, position: Option<Position>) -> Result<(), ApiError> {
        let previous_cash = std::mem::replace(&mut self.cash, cash);
        let previous = match position {
            Some(position) => self.positions.insert(symbol.to_string(), position),
            None => self.positions.remove(symbol),
        };
        if self.equity().is_some() {
            return Ok(());
        }

        self.cash = previous_cash;
        match previous {
            Some(position) => self.positions.insert(symbol.to_string(), position),
            None => self.positions.remove(symbol),
        };
        Err(out_of_range(symbol))
    }
}

fn out_of_range(symbol: &str) -> ApiError {
    ApiError::Rejected(format!("Order for {} is too large to simulate", symbol))
}

/// In-process portfolio and order book used when orders are simulated.
/// Every order fills immediately at the price it is given.
#[derive(Debug, Clone)]
pub struct MockBroker {
    book: Arc<RwLock<MockBook>>,
}

impl MockBroker {
    pub fn new(starting_cash: Decimal, seed_demo_positions: bool) -> Self {
        let mut positions = BTreeMap::new();
        if seed_demo_positions {
            for position in demo_positions() {
                positions.insert(position.symbol.clone(), position);
            }
        }
        Self {
            book: Arc::new(RwLock::new(MockBook {
                cash: starting_cash,
                positions,
                history: Vec::new(),
            })),
        }
    }

    pub async fn positions(&self) -> Vec<Position> {
        self.book.read().await.positions.values().cloned().collect()
    }

    pub async fn position(&self, symbol: &str) -> Option<Position> {
        self.book.read().await.positions.get(symbol).cloned()
    }

    /// Adds to (or opens) a position, re-averaging the entry price. The book
    /// is untouched when the trade does not fit in `Decimal`.
    pub async fn buy(&self, symbol: &str, qty: Decimal, price: Decimal) -> Result<Position, ApiError> {
        let mut book = self.book.write().await;
        let cost = qty.checked_mul(price).ok_or_else(|| out_of_range(symbol))?;
        let cash = book.cash.checked_sub(cost).ok_or_else(|| out_of_range(symbol))?;

        let position = match book.positions.get(symbol) {
            Some(held) => {
                let total_qty = held.qty.checked_add(qty);
                let total_cost = held
                    .avg_entry_price
                    .checked_mul(held.qty)
                    .and_then(|c| c.checked_add(cost));
                match (total_qty, total_cost) {
                    (Some(total_qty), _) if total_qty.is_zero() => Position::checked(symbol, total_qty, price, price),
                    (Some(total_qty), Some(total_cost)) => total_cost
                        .checked_div(total_qty)
                        .and_then(|avg| Position::checked(symbol, total_qty, avg, price)),
                    _ => None,
                }
            }
            None => Position::checked(symbol, qty, price, price),
        }
        .ok_or_else(|| out_of_range(symbol))?;

        book.commit(cash, symbol, Some(position.clone()))?;
        debug!("Mock buy {} {} @ {}", qty, symbol, price);
        Ok(position)
    }

    /// Reduces a position; it is removed once the quantity reaches zero or
    /// below. Only shares actually held are credited. Returns what is left
    /// of the position.
    pub async fn sell(&self, symbol: &str, qty: Decimal, price: Decimal) -> Result<Option<Position>, ApiError> {
        let mut book = self.book.write().await;
        let Some(held) = book.positions.get(symbol) else {
            return Err(ApiError::Rejected(format!("No position in {} to sell", symbol)));
        };

        let sold = qty.min(held.qty);
        let proceeds = sold.checked_mul(price).ok_or_else(|| out_of_range(symbol))?;
        let cash = book.cash.checked_add(proceeds).ok_or_else(|| out_of_range(symbol))?;
        let left = held.qty - sold;
        let remaining = if left <= Decimal::ZERO {
            None
        } else {
            Some(Position::checked(symbol, left, held.avg_entry_price, price).ok_or_else(|| out_of_range(symbol))?)
        };

        book.commit(cash, symbol, remaining.clone())?;
        debug!("Mock sell {} {} @ {}", sold, symbol, price);
        Ok(remaining)
    }

    /// Applies a request as an immediately filled order
    pub async fn execute(&self, request: &OrderRequest, fill_price: Decimal) -> Result<Order, ApiError> {
        match request.side {
            Side::Buy => {
                self.buy(&request.symbol, request.qty, fill_price).await?;
            }
            Side::Sell => {
                self.sell(&request.symbol, request.qty, fill_price).await?;
            }
        }

        let order = Order::filled_from_request(request, fill_price);
        self.book.write().await.history.push(order.clone());
        info!(
            "Mock order {} filled: {} {} {} @ {}",
            order.id, order.side, order.qty, order.symbol, fill_price
        );
        Ok(order)
    }

    /// Marks a held position to `price`; false when nothing is held or the
    /// repriced book would leave the `Decimal` range
    pub async fn mark_price(&self, symbol: &str, price: Decimal) -> bool {
        let mut book = self.book.write().await;
        let Some(held) = book.positions.get(symbol) else {
            return false;
        };
        let Some(repriced) = Position::checked(symbol, held.qty, held.avg_entry_price, price) else {
            warn!("Cannot mark {} at {}: value out of range", symbol, price);
            return false;
        };
        let cash = book.cash;
        book.commit(cash, symbol, Some(repriced)).is_ok()
    }

    /// Newest first
    pub async fn orders(&self, status: OrderStatusFilter) -> Vec<Order> {
        let book = self.book.read().await;
        book.history
            .iter()
            .rev()
            .filter(|o| match status {
                OrderStatusFilter::Open => o.status.is_open(),
                OrderStatusFilter::Closed => !o.status.is_open(),
            })
            .cloned()
            .collect()
    }

    pub async fn cancel(&self, order_id: &str) -> Result<(), ApiError> {
        let book = self.book.read().await;
        let order = book
            .history
            .iter()
            .find(|o| o.id == order_id)
            .ok_or_else(|| ApiError::NotFound(format!("order {}", order_id)))?;

        // Mock orders fill on submission, so there is never anything open
        Err(ApiError::Rejected(format!("Order {} is already {}", order.id, order.status)))
    }

    pub async fn account(&self) -> Account {
        let book = self.book.read().await;
        // commit keeps both totals in range
        let (equity, last_equity) = book.equity().unwrap_or((book.cash, book.cash));

        Account {
            portfolio_value: equity,
            buying_power: book.cash.max(Decimal::ZERO),
            cash: book.cash,
            equity: Some(equity),
            last_equity: Some(last_equity),
        }
    }

    pub async fn clear(&self) {
        let mut book = self.book.write().await;
        book.positions.clear();
        book.history.clear();
        info!("Mock portfolio cleared");
    }
}

fn demo_positions() -> [Position; 2] {
    [
        Position::new("AAPL", dec!(10), dec!(150), dec!(175)),
        Position::new("MSFT", dec!(5), dec!(280), dec!(310)),
    ]
}
