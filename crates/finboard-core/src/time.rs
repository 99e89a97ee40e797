//! Calendar month windows and reporting periods

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::Transaction;

/// An inclusive calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthWindow {
    /// The month that contains `date`
    pub fn containing(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let next_month = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
        };
        let end = next_month.and_then(|d| d.pred_opt()).unwrap_or(date);
        Self { start, end }
    }

    /// The calendar month before this one
    pub fn previous(&self) -> Self {
        match self.start.pred_opt() {
            Some(last_day) => Self::containing(last_day),
            None => *self,
        }
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        *date >= self.start && *date <= self.end
    }

    /// e.g. "June 2024"
    pub fn label(&self) -> String {
        self.start.format("%B %Y").to_string()
    }

    /// e.g. "Jun 2024"
    pub fn short_label(&self) -> String {
        self.start.format("%b %Y").to_string()
    }
}

/// How far back a financial report reaches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    #[default]
    All,
    /// Since the first of the current month
    Month,
    /// Since the first day of the current calendar quarter
    Quarter,
    /// Since January 1st
    Year,
}

impl ReportPeriod {
    /// First day included in the period, `None` when unbounded
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            ReportPeriod::All => None,
            ReportPeriod::Month => NaiveDate::from_ymd_opt(today.year(), today.month(), 1),
            ReportPeriod::Quarter => {
                let first_month = (today.month() - 1) / 3 * 3 + 1;
                NaiveDate::from_ymd_opt(today.year(), first_month, 1)
            }
            ReportPeriod::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1),
        }
    }
}

impl std::str::FromStr for ReportPeriod {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ReportPeriod::All),
            "month" => Ok(ReportPeriod::Month),
            "quarter" => Ok(ReportPeriod::Quarter),
            "year" => Ok(ReportPeriod::Year),
            _ => Err(format!("Invalid report period: {} (expected all, month, quarter or year)", s)),
        }
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportPeriod::All => write!(f, "all"),
            ReportPeriod::Month => write!(f, "month"),
            ReportPeriod::Quarter => write!(f, "quarter"),
            ReportPeriod::Year => write!(f, "year"),
        }
    }
}

/// Records that can be placed on the calendar
pub trait TimeFilter {
    fn in_month(&self, window: &MonthWindow) -> bool;
}

impl TimeFilter for Transaction {
    fn in_month(&self, window: &MonthWindow) -> bool {
        // Undated transactions never belong to a month
        self.transaction_date
            .map(|date| window.contains(&date))
            .unwrap_or(false)
    }
}
