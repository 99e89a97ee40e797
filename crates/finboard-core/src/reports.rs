//! Report structures for dashboard output

use chrono::NaiveDate;
use finboard_config::CurrencyConfig;
use finboard_utils::{format_money, NumberFormat};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, CurrencyBreakdown};
use crate::currency::ConversionResult;
use crate::time::ReportPeriod;
use crate::types::{BudgetStatus, TransactionType, VarianceStatus};

// ==================== Overview Structures ====================

/// System-wide figures for the admin view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOverview {
    pub currency: String,
    pub user_count: usize,
    pub transaction_count: usize,
    pub active_budget_count: usize,
    pub savings_goal_count: usize,
    pub income: Aggregate,
    pub expenses: Aggregate,
    pub net_balance: f64,
    /// Bar widths in percent, relative to the largest of the three figures
    pub income_bar: f64,
    pub expenses_bar: f64,
    pub balance_bar: f64,
}

/// One user's all-time totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: String,
    pub name: String,
    pub email: String,
    /// The user's own currency
    pub currency: String,
    pub income: ConversionResult,
    pub expenses: ConversionResult,
    pub net: ConversionResult,
    pub transaction_count: usize,
    pub budget_count: usize,
    pub savings_goal_count: usize,
    pub category_count: usize,
    pub balance_bar: f64,
}

/// Current month against the previous one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: String,
    pub previous_month: String,
    pub income: ConversionResult,
    pub expenses: ConversionResult,
    pub balance: ConversionResult,
    pub previous_income: ConversionResult,
    pub previous_expenses: ConversionResult,
    /// Percent change from the previous month
    pub income_change: f64,
    pub expenses_change: f64,
}

// ==================== Budget Structures ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub budget_id: String,
    pub user_id: String,
    pub budget_name: String,
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total: ConversionResult,
    pub spent: ConversionResult,
    pub remaining: ConversionResult,
    /// Whole percent spent, capped at 100
    pub percentage: f64,
    pub status: BudgetStatus,
}

/// Totals across a user's active budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetOverview {
    pub currency: String,
    pub active_count: usize,
    pub total_allocated: f64,
    pub total_spent: f64,
    pub percentage: f64,
    pub on_track: usize,
    pub at_risk: usize,
    pub over_budget: usize,
}

/// Allocated against spent for one budget, admin analytics view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetVariance {
    pub budget_id: String,
    pub budget_name: String,
    pub user_id: String,
    pub user_name: String,
    pub allocated: ConversionResult,
    pub spent: ConversionResult,
    /// Allocated minus spent in the display currency; negative when overspent
    pub variance: f64,
    /// Rounded, not capped
    pub percent_used: f64,
    pub status: VarianceStatus,
}

// ==================== Savings Structures ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsProgress {
    pub goal_id: String,
    pub user_id: String,
    pub goal_name: String,
    pub deadline: Option<NaiveDate>,
    pub target: ConversionResult,
    pub current: ConversionResult,
    pub percentage: f64,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsOverview {
    pub currency: String,
    pub total_target: f64,
    pub total_saved: f64,
    pub percentage: f64,
    pub active_count: usize,
    pub completed_count: usize,
}

// ==================== Activity Structures ====================

/// Expense total for one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpending {
    pub category: String,
    pub amount: ConversionResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub transaction_id: String,
    pub user_id: String,
    pub user_name: String,
    pub transaction_type: TransactionType,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: ConversionResult,
}

// ==================== Ledger Structures ====================

/// One line of the general ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub transaction_id: String,
    pub date: Option<NaiveDate>,
    pub description: String,
    pub user_id: String,
    pub user_name: String,
    pub transaction_type: TransactionType,
    /// Expense amount in the display currency, 0 for income
    pub debit: f64,
    /// Income amount in the display currency, 0 for expenses
    pub credit: f64,
    /// Running balance after this entry
    pub balance: f64,
}

/// Every transaction in date order with a running balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralLedger {
    pub currency: String,
    pub entries: Vec<LedgerEntry>,
    pub total_debits: f64,
    pub total_credits: f64,
    pub closing_balance: f64,
}

// ==================== Financial Structures ====================

/// Income and expenses within one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFlow {
    /// e.g. "Mar 2024"
    pub month: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

/// Transactions sharing a description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionTotal {
    pub description: String,
    pub count: usize,
    pub amount: f64,
}

/// Transaction volume by age in days
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgingBuckets {
    /// 30 days old or newer
    pub current: f64,
    pub days_31_60: f64,
    pub days_61_90: f64,
    /// Older than 90 days, or undated
    pub over_90: f64,
}

impl AgingBuckets {
    /// Add an amount that is `age_days` old
    pub fn add(&mut self, age_days: Option<i64>, amount: f64) {
        match age_days {
            Some(days) if days <= 30 => self.current += amount,
            Some(days) if days <= 60 => self.days_31_60 += amount,
            Some(days) if days <= 90 => self.days_61_90 += amount,
            _ => self.over_90 += amount,
        }
    }

    pub fn total(&self) -> f64 {
        self.current + self.days_31_60 + self.days_61_90 + self.over_90
    }
}

/// Income statement over a reporting period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialReport {
    pub currency: String,
    pub period: ReportPeriod,
    /// First day included, `None` for all time
    pub start_date: Option<NaiveDate>,
    pub transaction_count: usize,
    pub total_income: f64,
    pub total_expense: f64,
    pub net_position: f64,
    /// Absolute net position spread over the months with activity
    pub monthly_average: f64,
    /// Oldest month first
    pub monthly: Vec<MonthlyFlow>,
    pub top_income: Vec<DescriptionTotal>,
    pub top_expenses: Vec<DescriptionTotal>,
    pub aging: AgingBuckets,
}

// ==================== Rebase Structures ====================

/// A stored amount and what it becomes in the new currency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rebased {
    pub before: f64,
    pub after: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebasedTransaction {
    pub transaction_id: String,
    pub amount: Rebased,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebasedBudget {
    pub budget_id: String,
    pub total_amount: Rebased,
    pub spent_amount: Rebased,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebasedSavingsGoal {
    pub goal_id: String,
    pub target_amount: Rebased,
    pub current_amount: Rebased,
}

/// Updates needed when a user switches currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebasePlan {
    pub user_id: String,
    pub from_currency: String,
    pub to_currency: String,
    pub transactions: Vec<RebasedTransaction>,
    pub budgets: Vec<RebasedBudget>,
    pub savings_goals: Vec<RebasedSavingsGoal>,
}

impl RebasePlan {
    /// Nothing changes when the currency stays the same
    pub fn is_noop(&self) -> bool {
        self.from_currency == self.to_currency
    }

    pub fn record_count(&self) -> usize {
        self.transactions.len() + self.budgets.len() + self.savings_goals.len()
    }
}

// ==================== Formatting ====================

/// Renders amounts with the configured symbols and separators
#[derive(Debug, Clone)]
pub struct MoneyFormatter<'a> {
    config: &'a CurrencyConfig,
    format: NumberFormat,
}

impl<'a> MoneyFormatter<'a> {
    pub fn new(config: &'a CurrencyConfig) -> Self {
        Self {
            config,
            format: NumberFormat {
                decimal_places: config.decimal_places as usize,
                thousands_separator: config.thousands_separator.clone(),
                decimal_separator: config.decimal_separator.clone(),
            },
        }
    }

    /// `"$ 1,234.50"`
    pub fn money(&self, value: f64, code: &str) -> String {
        format_money(value, self.config.symbol(code), &self.format)
    }

    /// The converted side of a conversion
    pub fn converted(&self, result: &ConversionResult) -> String {
        self.money(result.converted_amount, &result.target_currency)
    }

    /// `"Converted from: $ 10.00, Rs 5,000.00"`.
    ///
    /// Each subtotal is already in the target currency; the symbol marks the
    /// source it came from.
    pub fn breakdown_text(&self, breakdown: &CurrencyBreakdown) -> String {
        let parts: Vec<String> = breakdown
            .iter()
            .map(|(code, amount)| self.money(amount, code))
            .collect();
        format!("Converted from: {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_uses_symbols() {
        let config = CurrencyConfig::default();
        let fmt = MoneyFormatter::new(&config);
        assert_eq!(fmt.money(1234.5, "USD"), "$ 1,234.50");
        assert_eq!(fmt.money(5000.0, "PKR"), "Rs 5,000.00");
        assert_eq!(fmt.money(3.0, "CHF"), "CHF 3.00");
    }

    #[test]
    fn test_breakdown_text() {
        let config = CurrencyConfig::default();
        let fmt = MoneyFormatter::new(&config);
        let mut breakdown = CurrencyBreakdown::new();
        breakdown.add("USD", 10.0);
        breakdown.add("PKR", 5000.0);
        assert_eq!(
            fmt.breakdown_text(&breakdown),
            "Converted from: Rs 5,000.00, $ 10.00"
        );
    }

    #[test]
    fn test_aging_buckets() {
        let mut aging = AgingBuckets::default();
        aging.add(Some(-3), 1.0);
        aging.add(Some(30), 2.0);
        aging.add(Some(31), 4.0);
        aging.add(Some(90), 8.0);
        aging.add(Some(91), 16.0);
        aging.add(None, 32.0);
        assert_eq!(aging.current, 3.0);
        assert_eq!(aging.days_31_60, 4.0);
        assert_eq!(aging.days_61_90, 8.0);
        assert_eq!(aging.over_90, 48.0);
        assert_eq!(aging.total(), 63.0);
    }

    #[test]
    fn test_rebase_plan_noop() {
        let plan = RebasePlan {
            user_id: "u1".to_string(),
            from_currency: "USD".to_string(),
            to_currency: "USD".to_string(),
            transactions: vec![],
            budgets: vec![],
            savings_goals: vec![],
        };
        assert!(plan.is_noop());
        assert_eq!(plan.record_count(), 0);
    }
}
