//! Home dashboard charts built from the summary document

use crate::charts::{BarChart, GroupedBarChart, PieChart, Series, MONTH_LABELS};
use crate::types::DashboardSummary;

pub const CHART_NAMES: [&str; 5] = [
    "monthly-expenses",
    "net-worth",
    "income-breakdown",
    "quarterly-expenses",
    "income-vs-expenses",
];

#[derive(Debug, Clone)]
pub struct DashboardCharts {
    pub monthly_expenses: String,
    pub net_worth: String,
    pub income_breakdown: String,
    pub quarterly_expenses: String,
    pub income_vs_expenses: String,
}

impl DashboardCharts {
    pub fn render(summary: &DashboardSummary) -> Self {
        let months: Vec<String> = MONTH_LABELS.iter().map(|m| m.to_string()).collect();

        let monthly_expenses =
            BarChart::new("Monthly Expenses", months.clone(), summary.monthly_expenses.to_vec()).render();

        let net_worth = BarChart::new(
            "Net Worth Breakdown",
            summary.net_worth_breakdown.keys().map(|k| title_case(k)).collect(),
            summary.net_worth_breakdown.values().cloned().collect(),
        )
        .render();

        let income_breakdown = PieChart::new(
            "Income Breakdown",
            summary
                .income_breakdown
                .iter()
                .map(|(k, v)| (title_case(k), *v))
                .collect(),
        )
        .render();

        let quarterly_expenses = PieChart::new(
            "Quarterly Expenses",
            summary
                .quarterly_expenses()
                .iter()
                .enumerate()
                .map(|(q, v)| (format!("Q{}", q + 1), *v))
                .collect(),
        )
        .render();

        let income_vs_expenses = GroupedBarChart::new(
            "Income vs Expenses",
            months,
            vec![
                Series::new("Income", "#59a14f", summary.monthly_incomes.to_vec()),
                Series::new("Expenses", "#e15759", summary.monthly_expenses.to_vec()),
            ],
        )
        .render();

        Self {
            monthly_expenses,
            net_worth,
            income_breakdown,
            quarterly_expenses,
            income_vs_expenses,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let svg = match name {
            "monthly-expenses" => &self.monthly_expenses,
            "net-worth" => &self.net_worth,
            "income-breakdown" => &self.income_breakdown,
            "quarterly-expenses" => &self.quarterly_expenses,
            "income-vs-expenses" => &self.income_vs_expenses,
            _ => return None,
        };
        Some(svg.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        CHART_NAMES
            .iter()
            .filter_map(move |name| self.get(name).map(|svg| (*name, svg)))
    }
}

fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
