use serde::Serialize;
use std::collections::BTreeMap;

use super::document::{normalize_monthly, FieldDocument, MONTHS_PER_YEAR};

/// Typed view of the `/api/homeData` document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub net_worth: i64,
    pub total_income: i64,
    pub total_expenses: i64,
    pub bills_due: i64,
    pub total_investments: i64,
    pub net_worth_breakdown: BTreeMap<String, f64>,
    pub income_breakdown: BTreeMap<String, f64>,
    pub monthly_expenses: [f64; MONTHS_PER_YEAR],
    pub monthly_incomes: [f64; MONTHS_PER_YEAR],
    pub monthly_stock_values: [f64; MONTHS_PER_YEAR],
}

impl DashboardSummary {
    pub fn from_document(doc: &FieldDocument) -> Self {
        Self {
            net_worth: doc.int("netWorth"),
            total_income: doc.int("totalIncome"),
            total_expenses: doc.int("totalExpenses"),
            bills_due: doc.int("billsDue"),
            total_investments: doc.int("totalInvestments"),
            net_worth_breakdown: doc.map("netWorthBreakdown"),
            income_breakdown: doc.map("totalIncomeBreakdown"),
            monthly_expenses: normalize_monthly(&doc.array("monthlyExpenses")),
            monthly_incomes: normalize_monthly(&doc.array("monthlyIncomes")),
            monthly_stock_values: normalize_monthly(&doc.array("monthlyStockValues")),
        }
    }

    /// Monthly expenses summed into Q1..Q4
    pub fn quarterly_expenses(&self) -> [f64; 4] {
        let mut quarters = [0.0; 4];
        for (month, value) in self.monthly_expenses.iter().enumerate() {
            quarters[month / 3] += value;
        }
        quarters
    }

    pub fn yearly_expenses(&self) -> f64 {
        self.monthly_expenses.iter().sum()
    }
}
