//! Record models for the five collections served by the data service
//!
//! Documents arrive as loosely typed JSON. Each record type is checked once,
//! here, so that the conversion and report code can rely on typed fields.

use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::currency::{parse_amount, DEFAULT_CURRENCY};
use crate::error::{CoreError, CoreResult, ErrorDetails};
use crate::types::TransactionType;

// ==================== Field helpers ====================

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    // "2024-06-15 10:30:00" and similar
    s.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

fn de_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_amount(&value).map_err(serde::de::Error::custom)
}

fn de_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", s))),
    }
}

fn de_currency<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(normalize_currency(raw.as_deref()))
}

fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

/// Trim and upper-case a currency code, defaulting to PKR when blank
pub fn normalize_currency(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(code) if !code.is_empty() => code.to_uppercase(),
        _ => DEFAULT_CURRENCY.to_string(),
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn require_user_id(collection: &str, id: &str, user_id: &str) -> CoreResult<()> {
    if user_id.trim().is_empty() {
        return Err(CoreError::ValidationError {
            message: format!("{} record '{}' has no user_id", collection, id),
        });
    }
    Ok(())
}

// ==================== Boundary trait ====================

/// A record type that can be built from a data-service document
pub trait Document: DeserializeOwned {
    /// Collection name, used in error messages
    const COLLECTION: &'static str;
    /// Fields holding monetary amounts
    const AMOUNT_FIELDS: &'static [&'static str];

    /// Semantic checks beyond the field types
    fn validate(&self) -> CoreResult<()>;

    /// Deserialize and validate a single document
    fn from_document(doc: &Value) -> CoreResult<Self> {
        for field in Self::AMOUNT_FIELDS {
            if let Some(value) = doc.get(*field) {
                parse_amount(value).map_err(|_| CoreError::InvalidAmount {
                    value: format!("{}.{} = {}", Self::COLLECTION, field, value),
                })?;
            }
        }

        let record: Self = serde_json::from_value(doc.clone()).map_err(|e| CoreError::InvalidFormat {
            message: format!("{}: {}", Self::COLLECTION, e),
        })?;
        record.validate()?;
        Ok(record)
    }
}

// ==================== Records ====================

/// User profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Document id
    #[serde(rename = "$id", alias = "id", default)]
    pub id: String,
    /// Owning account id, referenced by every other record
    pub user_id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    /// Currency the user's amounts are recorded in
    #[serde(default = "default_currency", deserialize_with = "de_currency")]
    pub currency: String,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub created_at: Option<NaiveDate>,
}

impl Document for UserProfile {
    const COLLECTION: &'static str = "profiles";
    const AMOUNT_FIELDS: &'static [&'static str] = &[];

    fn validate(&self) -> CoreResult<()> {
        require_user_id(Self::COLLECTION, &self.id, &self.user_id)
    }
}

impl UserProfile {
    /// Name to show, falling back to the email address
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.email
        } else {
            &self.full_name
        }
    }
}

/// Income or expense entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "$id", alias = "id", default)]
    pub id: String,
    pub user_id: String,
    /// Amount in the owner's currency
    #[serde(default, deserialize_with = "de_amount")]
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub budget_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub transaction_date: Option<NaiveDate>,
}

impl Document for Transaction {
    const COLLECTION: &'static str = "transactions";
    const AMOUNT_FIELDS: &'static [&'static str] = &["amount"];

    fn validate(&self) -> CoreResult<()> {
        require_user_id(Self::COLLECTION, &self.id, &self.user_id)
    }
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }

    /// Whether the transaction falls inside `[start, end]`; open ends match
    pub fn within(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
        match self.transaction_date {
            None => false,
            Some(date) => start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e),
        }
    }
}

/// Spending budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    #[serde(rename = "$id", alias = "id", default)]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub budget_name: String,
    #[serde(default, deserialize_with = "de_amount")]
    pub total_amount: f64,
    #[serde(default, deserialize_with = "de_amount")]
    pub spent_amount: f64,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_active: bool,
}

impl Document for Budget {
    const COLLECTION: &'static str = "budgets";
    const AMOUNT_FIELDS: &'static [&'static str] = &["total_amount", "spent_amount"];

    fn validate(&self) -> CoreResult<()> {
        require_user_id(Self::COLLECTION, &self.id, &self.user_id)?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(CoreError::ValidationError {
                    message: format!(
                        "budget '{}' ends ({}) before it starts ({})",
                        self.budget_name, end, start
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Savings goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    #[serde(rename = "$id", alias = "id", default)]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub goal_name: String,
    #[serde(default, deserialize_with = "de_amount")]
    pub target_amount: f64,
    #[serde(default, deserialize_with = "de_amount")]
    pub current_amount: f64,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub is_completed: bool,
}

impl Document for SavingsGoal {
    const COLLECTION: &'static str = "savings_goals";
    const AMOUNT_FIELDS: &'static [&'static str] = &["target_amount", "current_amount"];

    fn validate(&self) -> CoreResult<()> {
        require_user_id(Self::COLLECTION, &self.id, &self.user_id)
    }
}

/// Transaction category; `user_id` is empty for built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "$id", alias = "id", default)]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    #[serde(default)]
    pub is_default: bool,
}

impl Document for Category {
    const COLLECTION: &'static str = "categories";
    const AMOUNT_FIELDS: &'static [&'static str] = &[];

    fn validate(&self) -> CoreResult<()> {
        if self.category_name.trim().is_empty() {
            return Err(CoreError::ValidationError {
                message: format!("category '{}' has no name", self.id),
            });
        }
        Ok(())
    }
}

// ==================== Snapshot ====================

/// A document that failed boundary validation and was left out
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRecord {
    pub collection: String,
    pub index: usize,
    pub error: ErrorDetails,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    profiles: Vec<Value>,
    #[serde(default)]
    transactions: Vec<Value>,
    #[serde(default)]
    budgets: Vec<Value>,
    #[serde(default)]
    savings_goals: Vec<Value>,
    #[serde(default)]
    categories: Vec<Value>,
}

/// Everything the dashboard reads, already fetched from the data service
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub profiles: Vec<UserProfile>,
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
    pub savings_goals: Vec<SavingsGoal>,
    pub categories: Vec<Category>,
    /// Documents skipped during loading
    pub rejected: Vec<RejectedRecord>,
}

fn collect_valid<T: Document>(docs: &[Value], rejected: &mut Vec<RejectedRecord>) -> Vec<T> {
    let mut records = Vec::with_capacity(docs.len());
    for (index, doc) in docs.iter().enumerate() {
        match T::from_document(doc) {
            Ok(record) => records.push(record),
            Err(error) => {
                log::warn!(
                    target: "finboard::snapshot",
                    "Skipping {}[{}]: {}",
                    T::COLLECTION,
                    index,
                    error
                );
                rejected.push(RejectedRecord {
                    collection: T::COLLECTION.to_string(),
                    index,
                    error: error.to_details(),
                });
            }
        }
    }
    records
}

impl Snapshot {
    /// Parse a snapshot, skipping documents that fail validation
    pub fn from_json_str(content: &str) -> CoreResult<Self> {
        let raw: RawSnapshot = serde_json::from_str(content).map_err(|e| CoreError::InvalidFormat {
            message: e.to_string(),
        })?;

        let mut rejected = Vec::new();
        let snapshot = Snapshot {
            profiles: collect_valid(&raw.profiles, &mut rejected),
            transactions: collect_valid(&raw.transactions, &mut rejected),
            budgets: collect_valid(&raw.budgets, &mut rejected),
            savings_goals: collect_valid(&raw.savings_goals, &mut rejected),
            categories: collect_valid(&raw.categories, &mut rejected),
            rejected,
        };

        log::info!(
            target: "finboard::snapshot",
            "Loaded {} profiles, {} transactions, {} budgets, {} savings goals, {} categories ({} rejected)",
            snapshot.profiles.len(),
            snapshot.transactions.len(),
            snapshot.budgets.len(),
            snapshot.savings_goals.len(),
            snapshot.categories.len(),
            snapshot.rejected.len()
        );

        Ok(snapshot)
    }

    /// Read and parse a snapshot file
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Index profiles by `user_id`
    pub fn profile_index(&self) -> HashMap<&str, &UserProfile> {
        self.profiles.iter().map(|p| (p.user_id.as_str(), p)).collect()
    }

    pub fn profile(&self, user_id: &str) -> Option<&UserProfile> {
        self.profiles.iter().find(|p| p.user_id == user_id)
    }

    pub fn transactions_of<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.transactions.iter().filter(move |t| t.user_id == user_id)
    }

    pub fn budgets_of<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a Budget> + 'a {
        self.budgets.iter().filter(move |b| b.user_id == user_id)
    }

    pub fn savings_goals_of<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a SavingsGoal> + 'a {
        self.savings_goals.iter().filter(move |g| g.user_id == user_id)
    }

    /// Categories owned by the user, excluding shared defaults
    pub fn categories_of<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a Category> + 'a {
        self.categories
            .iter()
            .filter(move |c| c.user_id.as_deref() == Some(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 15);
        assert_eq!(parse_date("2024-06-15"), expected);
        assert_eq!(parse_date("2024-06-15T10:30:00.000+00:00"), expected);
        assert_eq!(parse_date("2024-06-15 10:30:00"), expected);
        assert_eq!(parse_date("15/06/2024"), None);
    }

    #[test]
    fn test_transaction_from_document() {
        let doc = json!({
            "$id": "tx-1",
            "user_id": "u1",
            "amount": "250.50",
            "type": "expense",
            "category_id": "",
            "description": "  ",
            "transaction_date": "2024-06-15T00:00:00.000+00:00"
        });
        let tx = Transaction::from_document(&doc).unwrap();
        assert_eq!(tx.id, "tx-1");
        assert_eq!(tx.amount, 250.5);
        assert!(tx.is_expense());
        assert_eq!(tx.category_id, None);
        assert_eq!(tx.description, None);
        assert_eq!(tx.transaction_date, NaiveDate::from_ymd_opt(2024, 6, 15));
    }

    #[test]
    fn test_null_amount_is_zero() {
        let doc = json!({ "user_id": "u1", "amount": null, "type": "income" });
        let tx = Transaction::from_document(&doc).unwrap();
        assert_eq!(tx.amount, 0.0);
    }

    #[test]
    fn test_non_numeric_amount_rejected() {
        let doc = json!({ "user_id": "u1", "amount": "lots", "type": "income" });
        let err = Transaction::from_document(&doc).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
        assert!(err.to_string().contains("transactions.amount"));
    }

    #[test]
    fn test_missing_user_id_rejected() {
        let doc = json!({ "user_id": " ", "amount": 5, "type": "income" });
        let err = Transaction::from_document(&doc).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError { .. }));
    }

    #[test]
    fn test_unknown_type_is_invalid_format() {
        let doc = json!({ "user_id": "u1", "amount": 5, "type": "transfer" });
        let err = Transaction::from_document(&doc).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
    }

    #[test]
    fn test_profile_currency_normalized() {
        let doc = json!({ "$id": "p1", "user_id": "u1", "full_name": "", "email": "a@b.c", "currency": " usd " });
        let profile = UserProfile::from_document(&doc).unwrap();
        assert_eq!(profile.currency, "USD");
        assert_eq!(profile.display_name(), "a@b.c");

        let doc = json!({ "user_id": "u2", "currency": null });
        assert_eq!(UserProfile::from_document(&doc).unwrap().currency, "PKR");

        let doc = json!({ "user_id": "u3" });
        assert_eq!(UserProfile::from_document(&doc).unwrap().currency, "PKR");
    }

    #[test]
    fn test_budget_window_validated() {
        let doc = json!({
            "user_id": "u1",
            "budget_name": "Food",
            "total_amount": 100,
            "start_date": "2024-06-30",
            "end_date": "2024-06-01"
        });
        assert!(matches!(
            Budget::from_document(&doc),
            Err(CoreError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_budget_amount_field_checked() {
        let doc = json!({ "user_id": "u1", "total_amount": 100, "spent_amount": {"x": 1} });
        let err = Budget::from_document(&doc).unwrap_err();
        assert!(err.to_string().contains("budgets.spent_amount"));
    }

    #[test]
    fn test_transaction_within_window() {
        let doc = json!({ "user_id": "u1", "amount": 5, "type": "expense", "transaction_date": "2024-06-15" });
        let tx = Transaction::from_document(&doc).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 6, 1);
        let end = NaiveDate::from_ymd_opt(2024, 6, 30);
        assert!(tx.within(start, end));
        assert!(tx.within(None, None));
        assert!(!tx.within(end, None));
    }

    #[test]
    fn test_snapshot_skips_bad_records() {
        let content = json!({
            "profiles": [{ "user_id": "u1", "full_name": "Ayesha", "currency": "USD" }],
            "transactions": [
                { "user_id": "u1", "amount": 10, "type": "income" },
                { "user_id": "u1", "amount": "ten", "type": "income" }
            ],
            "categories": [{ "category_name": "Food", "type": "expense", "user_id": null, "is_default": true }]
        })
        .to_string();

        let snapshot = Snapshot::from_json_str(&content).unwrap();
        assert_eq!(snapshot.profiles.len(), 1);
        assert_eq!(snapshot.transactions.len(), 1);
        assert_eq!(snapshot.rejected.len(), 1);
        assert_eq!(snapshot.rejected[0].collection, "transactions");
        assert_eq!(snapshot.rejected[0].index, 1);
        assert!(snapshot.budgets.is_empty());
        assert_eq!(snapshot.categories_of("u1").count(), 0);
        assert_eq!(snapshot.profile("u1").map(|p| p.currency.as_str()), Some("USD"));
    }

    #[test]
    fn test_snapshot_rejects_non_object() {
        let err = Snapshot::from_json_str("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
    }
}
