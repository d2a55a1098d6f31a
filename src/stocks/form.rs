use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::types::{OrderRequest, OrderType, Side};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderFormError {
    #[error("Please search for a stock first.")]
    NoSymbol,
    #[error("Please enter a valid quantity.")]
    Quantity,
    #[error("Please enter a valid limit price.")]
    LimitPrice,
    #[error("Please enter a valid stop price.")]
    StopPrice,
    #[error("Please enter valid stop and limit prices.")]
    StopLimitPrices,
    #[error("Please enter a valid trail percent.")]
    TrailPercent,
}

/// Raw order form fields as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderForm {
    pub quantity: String,
    pub time_in_force: String,
    pub limit_price: String,
    pub stop_price: String,
    pub trail_percent: String,
}

impl OrderForm {
    /// Validates the fields `order_type` needs and builds the request.
    /// Quantities are whole shares; fractional input is truncated.
    pub fn to_request(
        &self,
        symbol: Option<&str>,
        order_type: OrderType,
        side: Side,
    ) -> Result<OrderRequest, OrderFormError> {
        let symbol = symbol
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(OrderFormError::NoSymbol)?;

        let qty = positive(&self.quantity)
            .map(|q| q.trunc())
            .filter(|q| *q > Decimal::ZERO)
            .ok_or(OrderFormError::Quantity)?;

        let mut request = OrderRequest::market(symbol, side, qty);
        request.order_type = order_type;
        request.time_in_force = self.time_in_force.parse().unwrap_or_default();

        match order_type {
            OrderType::Market => {}
            OrderType::Limit => {
                request.limit_price = Some(positive(&self.limit_price).ok_or(OrderFormError::LimitPrice)?);
            }
            OrderType::Stop => {
                request.stop_price = Some(positive(&self.stop_price).ok_or(OrderFormError::StopPrice)?);
            }
            OrderType::StopLimit => {
                let stop = positive(&self.stop_price).ok_or(OrderFormError::StopLimitPrices)?;
                let limit = positive(&self.limit_price).ok_or(OrderFormError::StopLimitPrices)?;
                request.stop_price = Some(stop);
                request.limit_price = Some(limit);
            }
            OrderType::TrailingStop => {
                request.trail_percent = Some(positive(&self.trail_percent).ok_or(OrderFormError::TrailPercent)?);
            }
        }

        Ok(request)
    }
}

fn positive(text: &str) -> Option<Decimal> {
    Decimal::from_str(text.trim()).ok().filter(|v| *v > Decimal::ZERO)
}
