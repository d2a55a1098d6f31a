use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::ApiError;
use crate::types::{normalize_monthly, FieldDocument, MONTHS_PER_YEAR};

/// `{documents: [...]}` payload of the list endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeData {
    #[serde(default)]
    pub documents: Vec<Value>,
    #[serde(default = "zero_months")]
    pub monthly_incomes: Vec<f64>,
    #[serde(default)]
    pub yearly_income: f64,
}

impl Default for IncomeData {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            monthly_incomes: zero_months(),
            yearly_income: 0.0,
        }
    }
}

fn zero_months() -> Vec<f64> {
    vec![0.0; MONTHS_PER_YEAR]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub name: String,
    pub category: String,
    pub total: f64,
    /// ISO date, `YYYY-MM-DD`
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIncome {
    pub name: String,
    pub total: f64,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default)]
    pub recurring: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceSheetKind {
    Asset,
    Liability,
}

impl BalanceSheetKind {
    fn endpoint(&self) -> &'static str {
        match self {
            BalanceSheetKind::Asset => "/api/assets",
            BalanceSheetKind::Liability => "/api/liabilities",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceSheetKind::Asset => "asset",
            BalanceSheetKind::Liability => "liability",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetItem {
    pub name: String,
    pub amount: f64,
}

/// Client for the dashboard endpoints.
///
/// Reads never fail: any error is logged and replaced by an empty payload of
/// the same shape. Writes return the error to the caller.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    client: Client,
    base_url: String,
    dashboard_timeout: Duration,
}

impl DashboardClient {
    pub fn new(base_url: impl Into<String>, dashboard_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            dashboard_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_dashboard_data(&self) -> FieldDocument {
        let url = format!("{}/api/homeData", self.base_url);
        let request = self.client.get(&url).timeout(self.dashboard_timeout);
        match send_json::<Value>(request).await {
            Ok(body) => FieldDocument::from_value(body),
            Err(e) => {
                error!("Error fetching dashboard data: {}", e);
                fallback_dashboard_document()
            }
        }
    }

    pub async fn fetch_expenses_data(&self) -> DocumentList {
        self.get_or_default("/api/expenses", "expenses").await
    }

    /// Monthly incomes always come back with one entry per month
    pub async fn fetch_income_data(&self) -> IncomeData {
        let mut income: IncomeData = self.get_or_default("/api/income", "income").await;
        income.monthly_incomes = normalize_monthly(&income.monthly_incomes).to_vec();
        income
    }

    pub async fn fetch_bills_data(&self) -> DocumentList {
        self.get_or_default("/api/bills", "bills").await
    }

    pub async fn fetch_portfolio_data(&self) -> DocumentList {
        self.get_or_default("/api/portfolio", "portfolio").await
    }

    pub async fn add_expense(&self, expense: &NewExpense) -> Result<Value, ApiError> {
        self.post("/api/expenses", expense)
            .await
            .inspect_err(|e| error!("Error adding expense: {}", e))
    }

    pub async fn add_income(&self, income: &NewIncome) -> Result<Value, ApiError> {
        self.post("/api/income", income)
            .await
            .inspect_err(|e| error!("Error adding income: {}", e))
    }

    pub async fn save_asset_liability(
        &self,
        kind: BalanceSheetKind,
        item: &BalanceSheetItem,
    ) -> Result<Value, ApiError> {
        self.post(kind.endpoint(), item)
            .await
            .inspect_err(|e| error!("Error saving {}: {}", kind.as_str(), e))
    }

    async fn get_or_default<T>(&self, path: &str, what: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        match send_json::<T>(self.client.get(&url)).await {
            Ok(data) => data,
            Err(e) => {
                error!("Error fetching {} data: {}", what, e);
                T::default()
            }
        }
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);
        let created = send_json::<Value>(self.client.post(&url).json(body)).await?;
        info!("Created resource at {}", path);
        Ok(created)
    }
}

async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::from_status(status));
    }
    Ok(response.json::<T>().await?)
}

/// The document shown when `/api/homeData` is unreachable: every total is
/// zero, both breakdowns are JSON strings of zeros and every monthly series
/// has twelve zero entries.
pub fn fallback_dashboard_document() -> FieldDocument {
    let empty_months: Vec<Value> = (0..MONTHS_PER_YEAR).map(|_| json!({"integerValue": "0"})).collect();
    let zero = json!({"integerValue": "0"});

    FieldDocument::from_value(json!({
        "fields": {
            "netWorth": zero,
            "totalIncome": zero,
            "totalExpenses": zero,
            "billsDue": zero,
            "totalInvestments": zero,
            "netWorthBreakdown": {"stringValue": json!({"cash": 0, "stocks": 0, "crypto": 0}).to_string()},
            "totalIncomeBreakdown": {"stringValue": json!({"salary": 0, "bonus": 0, "other": 0}).to_string()},
            "monthlyExpenses": {"arrayValue": {"values": empty_months}},
            "monthlyIncomes": {"arrayValue": {"values": empty_months}},
            "monthlyStockValues": {"arrayValue": {"values": empty_months}},
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DashboardSummary;
    use axum::{http::StatusCode, routing::get, Json, Router};

    /// Serves `router` on an ephemeral port and returns its base URL
    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// A base URL nothing listens on
    async fn dead_backend() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    fn assert_is_fallback(doc: &FieldDocument) {
        let summary = DashboardSummary::from_document(doc);
        assert_eq!(summary.net_worth, 0);
        assert_eq!(summary.total_income, 0);
        assert_eq!(summary.total_expenses, 0);
        assert_eq!(summary.bills_due, 0);
        assert_eq!(summary.total_investments, 0);
        assert_eq!(doc.array("monthlyExpenses"), vec![0.0; 12]);
        assert_eq!(doc.array("monthlyIncomes"), vec![0.0; 12]);
        assert_eq!(doc.array("monthlyStockValues"), vec![0.0; 12]);
        assert_eq!(summary.net_worth_breakdown.keys().collect::<Vec<_>>(), vec!["cash", "crypto", "stocks"]);
        assert!(summary.income_breakdown.values().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_dashboard_fallback_on_network_failure() {
        let client = DashboardClient::new(dead_backend().await, Duration::from_secs(10));
        let doc = client.fetch_dashboard_data().await;
        assert_is_fallback(&doc);
    }

    #[tokio::test]
    async fn test_dashboard_fallback_on_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = DashboardClient::new(format!("http://{}", addr), Duration::from_millis(200));
        let doc = client.fetch_dashboard_data().await;
        assert_is_fallback(&doc);
    }

    #[tokio::test]
    async fn test_dashboard_success_and_error_status() {
        let router = Router::new().route(
            "/api/homeData",
            get(|| async {
                Json(json!({"fields": {
                    "netWorth": {"integerValue": "52000"},
                    "billsDue": {"integerValue": "2"}
                }}))
            }),
        );
        let client = DashboardClient::new(spawn_backend(router).await, Duration::from_secs(5));
        let doc = client.fetch_dashboard_data().await;
        assert_eq!(doc.int("netWorth"), 52000);
        assert_eq!(doc.int("billsDue"), 2);

        let failing = Router::new().route(
            "/api/homeData",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let client = DashboardClient::new(spawn_backend(failing).await, Duration::from_secs(5));
        assert_is_fallback(&client.fetch_dashboard_data().await);
    }

    #[tokio::test]
    async fn test_list_fallbacks() {
        let client = DashboardClient::new(dead_backend().await, Duration::from_secs(1));
        assert!(client.fetch_expenses_data().await.documents.is_empty());
        assert!(client.fetch_bills_data().await.documents.is_empty());
        assert!(client.fetch_portfolio_data().await.documents.is_empty());

        let income = client.fetch_income_data().await;
        assert!(income.documents.is_empty());
        assert_eq!(income.monthly_incomes, vec![0.0; 12]);
        assert_eq!(income.yearly_income, 0.0);
    }

    #[tokio::test]
    async fn test_list_fetch_success() {
        let router = Router::new().route(
            "/api/bills",
            get(|| async { Json(json!({"documents": [{"name": "rent"}, {"name": "power"}]})) }),
        );
        let client = DashboardClient::new(spawn_backend(router).await, Duration::from_secs(5));
        assert_eq!(client.fetch_bills_data().await.documents.len(), 2);
    }

    #[tokio::test]
    async fn test_short_monthly_incomes_are_padded() {
        let router = Router::new().route(
            "/api/income",
            get(|| async { Json(json!({"documents": [], "monthlyIncomes": [100.0, 250.5], "yearlyIncome": 350.5})) }),
        );
        let client = DashboardClient::new(spawn_backend(router).await, Duration::from_secs(5));
        let income = client.fetch_income_data().await;

        let mut expected = vec![0.0; 12];
        expected[0] = 100.0;
        expected[1] = 250.5;
        assert_eq!(income.monthly_incomes, expected);
        assert_eq!(income.yearly_income, 350.5);
    }

    #[tokio::test]
    async fn test_writes_propagate_errors() {
        let client = DashboardClient::new(dead_backend().await, Duration::from_secs(1));
        let expense = NewExpense {
            name: "Groceries".to_string(),
            category: "food".to_string(),
            total: 54.2,
            date: "2024-05-02".to_string(),
        };
        assert!(matches!(client.add_expense(&expense).await, Err(ApiError::Network(_))));

        let router = Router::new().route(
            "/api/assets",
            axum::routing::post(|| async { StatusCode::BAD_REQUEST }),
        );
        let client = DashboardClient::new(spawn_backend(router).await, Duration::from_secs(5));
        let item = BalanceSheetItem { name: "Car".to_string(), amount: 12000.0 };
        let err = client
            .save_asset_liability(BalanceSheetKind::Asset, &item)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_write_echoes_created_resource() {
        let router = Router::new().route(
            "/api/income",
            axum::routing::post(|Json(body): Json<Value>| async move {
                Json(json!({"fields": {"name": {"stringValue": body["name"]}}}))
            }),
        );
        let client = DashboardClient::new(spawn_backend(router).await, Duration::from_secs(5));
        let income = NewIncome {
            name: "Salary".to_string(),
            total: 4200.0,
            date: "2024-05-01".to_string(),
            frequency: Some("monthly".to_string()),
            recurring: true,
        };
        let created = client.add_income(&income).await.unwrap();
        assert_eq!(created["fields"]["name"]["stringValue"], "Salary");
    }
}
