//! Basic enumerations shared by records and reports

use serde::{Deserialize, Serialize};

/// Direction of a transaction or category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in (salary, refunds)
    Income,
    /// Money going out (food, rent)
    Expense,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
        }
    }
}

/// Health of a budget based on how much of it has been spent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Below the at-risk threshold
    OnTrack,
    /// Between the at-risk and over-budget thresholds
    AtRisk,
    /// At or above the over-budget threshold
    OverBudget,
}

impl BudgetStatus {
    /// Classify a raw (unrounded, uncapped) spent percentage
    pub fn classify(spent_percentage: f64, at_risk: f64, over_budget: f64) -> Self {
        if spent_percentage >= over_budget {
            BudgetStatus::OverBudget
        } else if spent_percentage >= at_risk {
            BudgetStatus::AtRisk
        } else {
            BudgetStatus::OnTrack
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetStatus::OnTrack => write!(f, "on_track"),
            BudgetStatus::AtRisk => write!(f, "at_risk"),
            BudgetStatus::OverBudget => write!(f, "over_budget"),
        }
    }
}

/// Budget standing in the variance analytics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatus {
    UnderBudget,
    /// From the critical threshold up to fully spent
    Critical,
    /// Fully spent or beyond
    OverBudget,
}

impl VarianceStatus {
    /// Share of the allocation at which a budget counts as over
    pub const OVER_BUDGET: f64 = 100.0;

    /// Classify a raw percent-used figure
    pub fn classify(percent_used: f64, critical: f64) -> Self {
        if percent_used >= Self::OVER_BUDGET {
            VarianceStatus::OverBudget
        } else if percent_used >= critical {
            VarianceStatus::Critical
        } else {
            VarianceStatus::UnderBudget
        }
    }
}

impl std::fmt::Display for VarianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarianceStatus::UnderBudget => write!(f, "Under Budget"),
            VarianceStatus::Critical => write!(f, "Critical"),
            VarianceStatus::OverBudget => write!(f, "Over Budget"),
        }
    }
}
