use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A held stock position, either from the backend or from the mock broker.
/// `unrealized_plpc` is a fraction: 0.05 means +5%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub qty: Decimal,
    #[serde(default)]
    pub avg_entry_price: Decimal,
    #[serde(default)]
    pub current_price: Decimal,
    #[serde(default)]
    pub market_value: Decimal,
    #[serde(default)]
    pub unrealized_pl: Decimal,
    #[serde(default)]
    pub unrealized_plpc: Decimal,
}

impl Position {
    pub fn new(symbol: impl Into<String>, qty: Decimal, avg_entry_price: Decimal, current_price: Decimal) -> Self {
        let mut position = Self {
            symbol: symbol.into(),
            qty,
            avg_entry_price,
            current_price,
            market_value: Decimal::ZERO,
            unrealized_pl: Decimal::ZERO,
            unrealized_plpc: Decimal::ZERO,
        };
        position.recompute();
        position
    }

    /// Like `new`, but None when a derived value leaves the `Decimal` range
    pub fn checked(symbol: impl Into<String>, qty: Decimal, avg_entry_price: Decimal, current_price: Decimal) -> Option<Self> {
        let market_value = current_price.checked_mul(qty)?;
        let unrealized_pl = current_price.checked_sub(avg_entry_price)?.checked_mul(qty)?;
        let cost = avg_entry_price.checked_mul(qty)?;
        let unrealized_plpc = if cost.is_zero() {
            Decimal::ZERO
        } else {
            unrealized_pl.checked_div(cost)?
        };
        Some(Self {
            symbol: symbol.into(),
            qty,
            avg_entry_price,
            current_price,
            market_value,
            unrealized_pl,
            unrealized_plpc,
        })
    }

    pub fn update_price(&mut self, price: Decimal) {
        self.current_price = price;
        self.recompute();
    }

    /// Refreshes market value and P&L from qty, entry and current price
    pub fn recompute(&mut self) {
        self.market_value = self.current_price * self.qty;
        self.unrealized_pl = (self.current_price - self.avg_entry_price) * self.qty;
        let cost = self.cost_basis();
        self.unrealized_plpc = if cost.is_zero() {
            Decimal::ZERO
        } else {
            self.unrealized_pl / cost
        };
    }

    pub fn cost_basis(&self) -> Decimal {
        self.avg_entry_price * self.qty
    }

    pub fn pl_percentage(&self) -> Decimal {
        self.unrealized_plpc.saturating_mul(Decimal::from(100))
    }

    pub fn is_profitable(&self) -> bool {
        self.unrealized_pl >= Decimal::ZERO
    }
}
