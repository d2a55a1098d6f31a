//! Process-local expense list
//!
//! Entries live only as long as the tracker; nothing is written anywhere.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::info;

use crate::format::format_currency;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Please enter a valid amount greater than zero.")]
    InvalidAmount,
    #[error("Please enter a category.")]
    EmptyCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseEntry {
    pub amount: Decimal,
    pub category: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseTracker {
    entries: Vec<ExpenseEntry>,
}

impl ExpenseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expense(&mut self, amount: Decimal, category: &str) -> Result<&ExpenseEntry, TrackerError> {
        // the running total has to stay representable
        if amount <= Decimal::ZERO || self.total_spending().checked_add(amount).is_none() {
            return Err(TrackerError::InvalidAmount);
        }
        let category = category.trim();
        if category.is_empty() {
            return Err(TrackerError::EmptyCategory);
        }

        self.entries.push(ExpenseEntry {
            amount,
            category: category.to_string(),
            added_at: Utc::now(),
        });
        info!("Tracked expense: {} in {}", format_currency(amount), category);

        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn entries(&self) -> &[ExpenseEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_spending(&self) -> Decimal {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Category totals in the order each category first appeared
    pub fn spending_by_category(&self) -> Vec<(String, Decimal)> {
        let mut totals: Vec<(String, Decimal)> = Vec::new();
        for entry in &self.entries {
            match totals.iter_mut().find(|(c, _)| *c == entry.category) {
                Some((_, total)) => *total += entry.amount,
                None => totals.push((entry.category.clone(), entry.amount)),
            }
        }
        totals
    }

    /// `"category: $total"` lines
    pub fn category_lines(&self) -> Vec<String> {
        self.spending_by_category()
            .into_iter()
            .map(|(category, total)| format!("{}: {}", category, format_currency(total)))
            .collect()
    }
}

impl fmt::Display for ExpenseTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Expense Tracker ===")?;
        writeln!(f, "Entries:        {}", self.entries.len())?;
        writeln!(f, "Total Spending: {}", format_currency(self.total_spending()))?;
        if !self.entries.is_empty() {
            writeln!(f, "\nBy category:")?;
            for line in self.category_lines() {
                writeln!(f, "  {}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_add_and_totals() {
        let mut tracker = ExpenseTracker::new();
        tracker.add_expense(dec!(12.50), "Food").unwrap();
        tracker.add_expense(dec!(40), " Transport ").unwrap();
        tracker.add_expense(dec!(7.25), "Food").unwrap();

        assert_eq!(tracker.total_spending(), dec!(59.75));
        assert_eq!(
            tracker.spending_by_category(),
            vec![("Food".to_string(), dec!(19.75)), ("Transport".to_string(), dec!(40))]
        );
        assert_eq!(tracker.category_lines(), vec!["Food: $19.75", "Transport: $40.00"]);
    }

    #[test]
    fn test_rejects_invalid_entries_without_mutation() {
        let mut tracker = ExpenseTracker::new();
        tracker.add_expense(dec!(5), "Coffee").unwrap();

        assert_eq!(tracker.add_expense(dec!(0), "Food"), Err(TrackerError::InvalidAmount));
        assert_eq!(tracker.add_expense(dec!(-3), "Food"), Err(TrackerError::InvalidAmount));
        assert_eq!(tracker.add_expense(dec!(3), "   "), Err(TrackerError::EmptyCategory));
        assert_eq!(tracker.entries().len(), 1);
        assert_eq!(tracker.total_spending(), dec!(5));
    }

    #[test]
    fn test_rejects_amount_that_overflows_total() {
        let mut tracker = ExpenseTracker::new();
        tracker.add_expense(Decimal::MAX, "Yacht").unwrap();

        assert_eq!(tracker.add_expense(Decimal::MAX, "Yacht"), Err(TrackerError::InvalidAmount));
        assert_eq!(tracker.add_expense(dec!(1), "Food"), Err(TrackerError::InvalidAmount));
        assert_eq!(tracker.entries().len(), 1);
        assert_eq!(tracker.total_spending(), Decimal::MAX);
        assert_eq!(tracker.category_lines().len(), 1);
    }

    #[test]
    fn test_display() {
        let mut tracker = ExpenseTracker::new();
        assert!(tracker.to_string().contains("Total Spending: $0.00"));
        tracker.add_expense(dec!(1234.5), "Rent").unwrap();
        let text = tracker.to_string();
        assert!(text.contains("Total Spending: $1,234.50"));
        assert!(text.contains("  Rent: $1,234.50"));
    }
}
