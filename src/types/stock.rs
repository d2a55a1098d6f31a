use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub portfolio_value: Decimal,
    #[serde(default)]
    pub buying_power: Decimal,
    #[serde(default)]
    pub cash: Decimal,
    #[serde(default)]
    pub equity: Option<Decimal>,
    #[serde(default)]
    pub last_equity: Option<Decimal>,
}

impl Account {
    pub fn empty() -> Self {
        Self {
            portfolio_value: Decimal::ZERO,
            buying_power: Decimal::ZERO,
            cash: Decimal::ZERO,
            equity: None,
            last_equity: None,
        }
    }

    /// Change since the previous close as `(amount, percent)`.
    /// Only available when both equity figures are present and non-zero.
    pub fn daily_pl(&self) -> Option<(Decimal, Decimal)> {
        let equity = self.equity.filter(|e| !e.is_zero())?;
        let last_equity = self.last_equity.filter(|e| !e.is_zero())?;
        let pl = equity.checked_sub(last_equity)?;
        let percent = pl.checked_div(last_equity)?.checked_mul(Decimal::from(100))?;
        Some((pl, percent))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub volume: i64,
    #[serde(default)]
    pub open: Option<Decimal>,
    #[serde(default)]
    pub high: Option<Decimal>,
    #[serde(default)]
    pub low: Option<Decimal>,
    #[serde(default)]
    pub previous_close: Option<Decimal>,
    #[serde(default)]
    pub latest_trading_day: Option<String>,
}

impl StockQuote {
    pub fn is_up(&self) -> bool {
        self.change >= Decimal::ZERO
    }
}

/// One point of a price history series, timestamps in epoch millis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: i64,
    pub price: f64,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub volume: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "ALL")]
    All,
}

impl Timeframe {
    pub fn all() -> [Timeframe; 6] {
        [
            Timeframe::OneDay,
            Timeframe::OneWeek,
            Timeframe::OneMonth,
            Timeframe::ThreeMonths,
            Timeframe::OneYear,
            Timeframe::All,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneDay => "1D",
            Timeframe::OneWeek => "1W",
            Timeframe::OneMonth => "1M",
            Timeframe::ThreeMonths => "3M",
            Timeframe::OneYear => "1Y",
            Timeframe::All => "ALL",
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1D" => Ok(Timeframe::OneDay),
            "1W" => Ok(Timeframe::OneWeek),
            "1M" => Ok(Timeframe::OneMonth),
            "3M" => Ok(Timeframe::ThreeMonths),
            "1Y" => Ok(Timeframe::OneYear),
            "ALL" => Ok(Timeframe::All),
            other => Err(format!("unknown timeframe: {}", other)),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display name for well-known tickers when the quote source has none
pub fn company_name(symbol: &str) -> String {
    let known = match symbol {
        "AAPL" => "Apple Inc.",
        "MSFT" => "Microsoft Corporation",
        "GOOGL" => "Alphabet Inc.",
        "AMZN" => "Amazon.com Inc.",
        "META" => "Meta Platforms Inc.",
        "TSLA" => "Tesla Inc.",
        "NVDA" => "NVIDIA Corporation",
        "JPM" => "JPMorgan Chase & Co.",
        "V" => "Visa Inc.",
        "JNJ" => "Johnson & Johnson",
        "WMT" => "Walmart Inc.",
        "PG" => "Procter & Gamble Co.",
        "MA" => "Mastercard Inc.",
        "UNH" => "UnitedHealth Group Inc.",
        "HD" => "Home Depot Inc.",
        _ => return format!("{} Inc.", symbol),
    };
    known.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_daily_pl() {
        let account = Account {
            portfolio_value: dec!(10500),
            buying_power: dec!(4000),
            cash: dec!(2000),
            equity: Some(dec!(10500)),
            last_equity: Some(dec!(10000)),
        };
        assert_eq!(account.daily_pl(), Some((dec!(500), dec!(5))));

        let loss = Account { equity: Some(dec!(9000)), ..account.clone() };
        assert_eq!(loss.daily_pl(), Some((dec!(-1000), dec!(-10))));
    }

    #[test]
    fn test_daily_pl_requires_both_figures() {
        assert_eq!(Account::empty().daily_pl(), None);

        let account = Account {
            equity: Some(dec!(100)),
            last_equity: Some(Decimal::ZERO),
            ..Account::empty()
        };
        assert_eq!(account.daily_pl(), None);
    }

    #[test]
    fn test_timeframe_round_trip_names() {
        for timeframe in Timeframe::all() {
            assert_eq!(timeframe.as_str().parse::<Timeframe>(), Ok(timeframe));
        }
        assert_eq!("all".parse::<Timeframe>(), Ok(Timeframe::All));
        assert!("5Y".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_company_name() {
        assert_eq!(company_name("NVDA"), "NVIDIA Corporation");
        assert_eq!(company_name("XYZ"), "XYZ Inc.");
    }
}
