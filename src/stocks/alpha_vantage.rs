use chrono::{NaiveDate, NaiveDateTime};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, warn};

use super::value_decimal;
use crate::config::AlphaVantageSettings;
use crate::error::ApiError;
use crate::types::{company_name, HistoryPoint, StockQuote, Timeframe};

/// Alpha Vantage query parameters for one chart timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesRequest {
    pub function: &'static str,
    pub interval: Option<&'static str>,
    /// Most recent points to keep; `None` keeps the whole series
    pub limit: Option<usize>,
    pub full_output: bool,
}

impl SeriesRequest {
    pub fn for_timeframe(timeframe: Timeframe) -> Self {
        match timeframe {
            Timeframe::OneDay => Self::intraday("5min", 78),
            Timeframe::OneWeek => Self::intraday("60min", 35),
            Timeframe::OneMonth => Self::series("TIME_SERIES_DAILY", Some(30)),
            Timeframe::ThreeMonths => Self::series("TIME_SERIES_DAILY", Some(90)),
            Timeframe::OneYear => Self::series("TIME_SERIES_WEEKLY", Some(52)),
            Timeframe::All => Self::series("TIME_SERIES_MONTHLY", None),
        }
    }

    fn intraday(interval: &'static str, limit: usize) -> Self {
        Self {
            function: "TIME_SERIES_INTRADAY",
            interval: Some(interval),
            limit: Some(limit),
            full_output: true,
        }
    }

    fn series(function: &'static str, limit: Option<usize>) -> Self {
        Self {
            function,
            interval: None,
            limit,
            full_output: false,
        }
    }
}

/// Rate-limited Alpha Vantage client for quotes and price history
#[derive(Clone)]
pub struct AlphaVantageClient {
    http: Client,
    api_key: String,
    base_url: String,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl AlphaVantageClient {
    pub fn new(settings: &AlphaVantageSettings) -> Result<Self, ApiError> {
        if settings.api_key.trim().is_empty() {
            return Err(ApiError::Config("missing Alpha Vantage API key".to_string()));
        }
        let per_minute = NonZeroU32::new(settings.requests_per_minute)
            .ok_or_else(|| ApiError::Config("requests_per_minute must be > 0".to_string()))?;

        Ok(Self {
            http: Client::new(),
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        })
    }

    pub async fn global_quote(&self, symbol: &str) -> Result<StockQuote, ApiError> {
        let json = self.fetch(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)]).await?;
        parse_global_quote(&json, symbol)
    }

    pub async fn time_series(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<HistoryPoint>, ApiError> {
        let request = SeriesRequest::for_timeframe(timeframe);
        let mut params = vec![("function", request.function), ("symbol", symbol)];
        if let Some(interval) = request.interval {
            params.push(("interval", interval));
        }
        if request.full_output {
            params.push(("outputsize", "full"));
        }

        let json = self.fetch(&params).await?;
        let points = parse_time_series(&json, request.limit)?;
        debug!("Processed {} history points for {} ({})", points.len(), symbol, timeframe);
        Ok(points)
    }

    async fn fetch(&self, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        if self.limiter.check().is_err() {
            warn!("Local Alpha Vantage request budget exhausted");
            return Err(ApiError::RateLimited(
                "API rate limit reached. Please try again in a moment.".to_string(),
            ));
        }

        let url = format!("{}/query", self.base_url);
        debug!("GET {} {:?}", url, params);
        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }

        let json: Value = response.json().await?;
        check_provider_notice(&json)?;
        Ok(json)
    }
}

/// `Note`/`Information` mean the key hit its quota; `Error Message` means
/// the call itself was invalid, which for a symbol lookup is "not found".
pub fn check_provider_notice(json: &Value) -> Result<(), ApiError> {
    for key in ["Note", "Information"] {
        if let Some(msg) = json.get(key).and_then(Value::as_str) {
            warn!("Alpha Vantage notice: {}", msg);
            return Err(ApiError::RateLimited(msg.to_string()));
        }
    }
    if let Some(msg) = json.get("Error Message").and_then(Value::as_str) {
        return Err(ApiError::NotFound(msg.to_string()));
    }
    Ok(())
}

pub fn parse_global_quote(json: &Value, symbol: &str) -> Result<StockQuote, ApiError> {
    let quote = json
        .get("Global Quote")
        .and_then(Value::as_object)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::NotFound(format!("Stock symbol '{}' not found", symbol)))?;

    let number = |key: &str| quote.get(key).and_then(value_decimal);
    let price = number("05. price")
        .ok_or_else(|| ApiError::Decode(format!("quote for {} has no price", symbol)))?;
    let resolved = quote
        .get("01. symbol")
        .and_then(Value::as_str)
        .unwrap_or(symbol)
        .to_string();

    Ok(StockQuote {
        name: company_name(&resolved),
        symbol: resolved,
        price,
        change: number("09. change").unwrap_or(Decimal::ZERO),
        change_percent: number("10. change percent").unwrap_or(Decimal::ZERO),
        volume: number("06. volume").and_then(|v| v.to_i64()).unwrap_or(0),
        open: number("02. open"),
        high: number("03. high"),
        low: number("04. low"),
        previous_close: number("08. previous close"),
        latest_trading_day: quote
            .get("07. latest trading day")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Reads the first `*Time Series*` object, oldest first, keeping the last
/// `limit` points
pub fn parse_time_series(json: &Value, limit: Option<usize>) -> Result<Vec<HistoryPoint>, ApiError> {
    let series = json
        .as_object()
        .and_then(|obj| obj.iter().find(|(k, _)| k.contains("Time Series")))
        .and_then(|(_, v)| v.as_object())
        .ok_or_else(|| ApiError::Decode("missing time series in response".to_string()))?;

    let mut points: Vec<HistoryPoint> = series
        .iter()
        .filter_map(|(ts, bar)| {
            let timestamp = parse_timestamp(ts)?;
            let bar = bar.as_object()?;
            Some(HistoryPoint {
                timestamp,
                price: bar_number(bar, &["4. close"])?,
                open: bar_number(bar, &["1. open"]).unwrap_or(0.0),
                high: bar_number(bar, &["2. high"]).unwrap_or(0.0),
                low: bar_number(bar, &["3. low"]).unwrap_or(0.0),
                volume: bar_number(bar, &["5. volume", "6. volume"]).map(|v| v as i64).unwrap_or(0),
            })
        })
        .collect();

    points.sort_by_key(|p| p.timestamp);
    if let Some(limit) = limit {
        let skip = points.len().saturating_sub(limit);
        points.drain(..skip);
    }
    Ok(points)
}

fn bar_number(bar: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|k| bar.get(*k))
        .find_map(|v| value_decimal(v).and_then(|d| d.to_f64()))
}

fn parse_timestamp(ts: &str) -> Option<i64> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    let date = NaiveDate::parse_from_str(ts, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn global_quote() -> Value {
        json!({"Global Quote": {
            "01. symbol": "MSFT", "02. open": "415.0000", "03. high": "420.1000",
            "04. low": "413.5500", "05. price": "418.2300", "06. volume": "18244800",
            "07. latest trading day": "2024-05-03", "08. previous close": "414.0100",
            "09. change": "4.2200", "10. change percent": "1.0193%"
        }})
    }

    #[test]
    fn test_parse_global_quote() {
        let quote = parse_global_quote(&global_quote(), "msft").unwrap();
        assert_eq!(quote.symbol, "MSFT");
        assert_eq!(quote.name, "Microsoft Corporation");
        assert_eq!(quote.price, dec!(418.23));
        assert_eq!(quote.change_percent, dec!(1.0193));
        assert_eq!(quote.volume, 18_244_800);
        assert_eq!(quote.previous_close, Some(dec!(414.01)));
        assert_eq!(quote.latest_trading_day.as_deref(), Some("2024-05-03"));
    }

    #[test]
    fn test_empty_quote_is_not_found() {
        let err = parse_global_quote(&json!({"Global Quote": {}}), "ZZZZ").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(matches!(parse_global_quote(&json!({}), "ZZZZ"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_provider_notices() {
        let note = json!({"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"});
        assert!(matches!(check_provider_notice(&note), Err(ApiError::RateLimited(_))));

        let info = json!({"Information": "premium endpoint"});
        assert!(matches!(check_provider_notice(&info), Err(ApiError::RateLimited(_))));

        let bad = json!({"Error Message": "Invalid API call."});
        assert!(matches!(check_provider_notice(&bad), Err(ApiError::NotFound(_))));

        assert!(check_provider_notice(&global_quote()).is_ok());
    }

    #[test]
    fn test_parse_time_series_orders_and_limits() {
        let json = json!({
            "Meta Data": {"1. Information": "Daily Prices"},
            "Time Series (Daily)": {
                "2024-05-03": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "103", "5. volume": "10"},
                "2024-05-01": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "101", "5. volume": "10"},
                "2024-05-02": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "102", "5. volume": "10"},
                "garbage": {"4. close": "1"}
            }
        });

        let all = parse_time_series(&json, None).unwrap();
        assert_eq!(all.iter().map(|p| p.price).collect::<Vec<_>>(), vec![101.0, 102.0, 103.0]);

        let last_two = parse_time_series(&json, Some(2)).unwrap();
        assert_eq!(last_two.iter().map(|p| p.price).collect::<Vec<_>>(), vec![102.0, 103.0]);
        assert!(last_two[0].timestamp < last_two[1].timestamp);
    }

    #[test]
    fn test_intraday_timestamps() {
        let json = json!({"Time Series (5min)": {
            "2024-05-03 15:55:00": {"4. close": "10.5"},
            "2024-05-03 16:00:00": {"4. close": "10.75"}
        }});
        let points = parse_time_series(&json, Some(78)).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].timestamp - points[0].timestamp, 5 * 60 * 1000);
        assert!(parse_time_series(&json!({"Meta Data": {}}), None).is_err());
    }

    #[test]
    fn test_timeframe_mapping() {
        let day = SeriesRequest::for_timeframe(Timeframe::OneDay);
        assert_eq!((day.function, day.interval, day.limit), ("TIME_SERIES_INTRADAY", Some("5min"), Some(78)));
        assert!(day.full_output);

        let week = SeriesRequest::for_timeframe(Timeframe::OneWeek);
        assert_eq!((week.interval, week.limit), (Some("60min"), Some(35)));

        assert_eq!(SeriesRequest::for_timeframe(Timeframe::ThreeMonths).limit, Some(90));
        assert_eq!(SeriesRequest::for_timeframe(Timeframe::OneYear).function, "TIME_SERIES_WEEKLY");
        let all = SeriesRequest::for_timeframe(Timeframe::All);
        assert_eq!((all.function, all.limit), ("TIME_SERIES_MONTHLY", None));
    }

    #[tokio::test]
    async fn test_local_rate_limit() {
        let settings = AlphaVantageSettings {
            api_key: "demo".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            requests_per_minute: 1,
        };
        let client = AlphaVantageClient::new(&settings).unwrap();

        // The first call consumes the budget (and fails on the closed port)
        assert!(!matches!(client.global_quote("AAPL").await, Err(ApiError::RateLimited(_))));
        assert!(matches!(client.global_quote("AAPL").await, Err(ApiError::RateLimited(_))));
    }

    #[test]
    fn test_requires_key() {
        let settings = AlphaVantageSettings::default();
        assert!(matches!(AlphaVantageClient::new(&settings), Err(ApiError::Config(_))));
    }
}
