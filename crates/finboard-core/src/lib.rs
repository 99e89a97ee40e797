//! Multi-currency conversion, aggregation and dashboard reports

pub mod aggregate;
pub mod currency;
pub mod error;
pub mod models;
pub mod reports;
pub mod time;
pub mod types;

use chrono::NaiveDate;
use finboard_config::{BudgetConfig, Config, DashboardConfig};
use std::collections::{BTreeMap, HashMap};

pub use aggregate::{aggregate, bar_width, percent_change, percentage, try_percentage, Aggregate, CurrencyBreakdown};
pub use currency::{round_half_up, round_to_cents, ConversionResult, ExchangeRateTable, BASE_CURRENCY, DEFAULT_CURRENCY};
pub use error::{degrade, CoreError, CoreResult, ErrorCode, ErrorDetails, ErrorSeverity};
pub use models::{Budget, Category, Document, SavingsGoal, Snapshot, Transaction, UserProfile};
pub use reports::*;
pub use time::{MonthWindow, ReportPeriod, TimeFilter};
pub use types::{BudgetStatus, TransactionType, VarianceStatus};

/// Label for expenses without a known category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Report builder over a loaded snapshot
///
/// Every figure is converted from the owning user's currency into the
/// display currency with the same rate table.
#[derive(Debug, Clone)]
pub struct Dashboard {
    rates: ExchangeRateTable,
    snapshot: Snapshot,
    display_currency: String,
    budgets: BudgetConfig,
    settings: DashboardConfig,
}

impl Dashboard {
    /// Create a dashboard with default thresholds and list sizes
    pub fn new(rates: ExchangeRateTable, snapshot: Snapshot, display_currency: &str) -> Self {
        Self {
            rates,
            snapshot,
            display_currency: models::normalize_currency(Some(display_currency)),
            budgets: BudgetConfig::default(),
            settings: DashboardConfig::default(),
        }
    }

    /// Create a dashboard from configuration, validating it first
    pub fn from_config(config: &Config, snapshot: Snapshot) -> CoreResult<Self> {
        config.validate()?;

        Ok(Self {
            rates: ExchangeRateTable::from_config(&config.currency),
            snapshot,
            display_currency: config.currency.default_currency.clone(),
            budgets: config.budgets.clone(),
            settings: config.dashboard.clone(),
        })
    }

    pub fn with_thresholds(mut self, budgets: BudgetConfig) -> Self {
        self.budgets = budgets;
        self
    }

    pub fn with_settings(mut self, settings: DashboardConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Switch the currency reports are shown in
    pub fn set_display_currency(&mut self, code: &str) {
        let code = models::normalize_currency(Some(code));
        if !self.rates.contains(&code) {
            log::warn!(
                target: "finboard::dashboard",
                "Display currency {} has no rate; amounts will use rate 1",
                code
            );
        }
        log::debug!(target: "finboard::dashboard", "Display currency set to {}", code);
        self.display_currency = code;
    }

    pub fn display_currency(&self) -> &str {
        &self.display_currency
    }

    pub fn rates(&self) -> &ExchangeRateTable {
        &self.rates
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn settings(&self) -> &DashboardConfig {
        &self.settings
    }

    // ==================== Helpers ====================

    fn require_profile(&self, user_id: &str) -> CoreResult<&UserProfile> {
        self.snapshot.profile(user_id).ok_or_else(|| CoreError::UserNotFound {
            user_id: user_id.to_string(),
        })
    }

    /// Currency a user's records are stored in
    fn owner_currency(&self, user_id: &str) -> &str {
        self.snapshot
            .profile(user_id)
            .map(|p| p.currency.as_str())
            .unwrap_or(DEFAULT_CURRENCY)
    }

    fn show(&self, amount: f64, from: &str) -> ConversionResult {
        self.rates.convert_for_display(amount, from, &self.display_currency)
    }

    // ==================== Overviews ====================

    /// System-wide totals across every user
    pub fn admin_overview(&self) -> AdminOverview {
        let profiles = self.snapshot.profile_index();
        let currency_of =
            |t: &Transaction| profiles.get(t.user_id.as_str()).copied().map(|p| p.currency.as_str());

        let income = aggregate(
            &self.rates,
            self.snapshot.transactions.iter().filter(|t| t.is_income()),
            |t| t.amount,
            currency_of,
            &self.display_currency,
        );
        let expenses = aggregate(
            &self.rates,
            self.snapshot.transactions.iter().filter(|t| t.is_expense()),
            |t| t.amount,
            currency_of,
            &self.display_currency,
        );

        let net_balance = income.total - expenses.total;
        let max_value = income.total.max(expenses.total).max(net_balance.abs());

        log::debug!(
            target: "finboard::dashboard",
            "Admin overview in {}: income {}, expenses {}, {} fallback conversions",
            self.display_currency,
            income.total,
            expenses.total,
            income.fallback_count + expenses.fallback_count
        );

        AdminOverview {
            currency: self.display_currency.clone(),
            user_count: self.snapshot.profiles.len(),
            transaction_count: self.snapshot.transactions.len(),
            active_budget_count: self.snapshot.budgets.iter().filter(|b| b.is_active).count(),
            savings_goal_count: self.snapshot.savings_goals.len(),
            income_bar: bar_width(income.total, max_value),
            expenses_bar: bar_width(expenses.total, max_value),
            balance_bar: bar_width(net_balance, max_value),
            income,
            expenses,
            net_balance,
        }
    }

    /// All-time totals for one user
    pub fn user_summary(&self, user_id: &str) -> CoreResult<UserSummary> {
        let profile = self.require_profile(user_id)?;
        let currency = profile.currency.as_str();

        let (income, expenses) = sum_by_type(self.snapshot.transactions_of(user_id));
        let net = income - expenses;
        let balance_bar = (net.abs() / income.max(expenses).max(1.0) * 100.0).min(100.0);

        Ok(UserSummary {
            user_id: profile.user_id.clone(),
            name: profile.display_name().to_string(),
            email: profile.email.clone(),
            currency: currency.to_string(),
            income: self.show(income, currency),
            expenses: self.show(expenses, currency),
            net: self.show(net, currency),
            transaction_count: self.snapshot.transactions_of(user_id).count(),
            budget_count: self.snapshot.budgets_of(user_id).count(),
            savings_goal_count: self.snapshot.savings_goals_of(user_id).count(),
            category_count: self.snapshot.categories_of(user_id).count(),
            balance_bar,
        })
    }

    /// The month containing `reference` against the month before it
    pub fn monthly_summary(&self, user_id: &str, reference: NaiveDate) -> CoreResult<MonthlySummary> {
        let currency = self.require_profile(user_id)?.currency.as_str();

        let current = MonthWindow::containing(reference);
        let previous = current.previous();

        let (income, expenses) =
            sum_by_type(self.snapshot.transactions_of(user_id).filter(|t| t.in_month(&current)));
        let (last_income, last_expenses) =
            sum_by_type(self.snapshot.transactions_of(user_id).filter(|t| t.in_month(&previous)));

        Ok(MonthlySummary {
            month: current.label(),
            previous_month: previous.label(),
            income: self.show(income, currency),
            expenses: self.show(expenses, currency),
            balance: self.show(income - expenses, currency),
            previous_income: self.show(last_income, currency),
            previous_expenses: self.show(last_expenses, currency),
            income_change: percent_change(income, last_income),
            expenses_change: percent_change(expenses, last_expenses),
        })
    }

    // ==================== Budgets ====================

    /// Expense transactions charged to `budget` inside its date window
    pub fn recompute_budget_spent<'a>(
        budget: &Budget,
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> f64 {
        transactions
            .into_iter()
            .filter(|t| t.is_expense())
            .filter(|t| t.budget_id.as_deref() == Some(budget.id.as_str()))
            .filter(|t| t.within(budget.start_date, budget.end_date))
            .map(|t| t.amount)
            .sum()
    }

    fn budget_row(&self, budget: &Budget, spent: f64) -> BudgetProgress {
        let currency = self.owner_currency(&budget.user_id);
        let raw_ratio = if budget.total_amount > 0.0 {
            spent / budget.total_amount * 100.0
        } else {
            0.0
        };

        BudgetProgress {
            budget_id: budget.id.clone(),
            user_id: budget.user_id.clone(),
            budget_name: budget.budget_name.clone(),
            is_active: budget.is_active,
            start_date: budget.start_date,
            end_date: budget.end_date,
            total: self.show(budget.total_amount, currency),
            spent: self.show(spent, currency),
            remaining: self.show(budget.total_amount - spent, currency),
            percentage: degrade(
                try_percentage(spent, budget.total_amount),
                0.0,
                "budget percentage",
            ),
            status: BudgetStatus::classify(
                raw_ratio,
                self.budgets.at_risk_threshold,
                self.budgets.over_budget_threshold,
            ),
        }
    }

    /// Progress of every budget, or of one user's budgets.
    ///
    /// Across all users the stored `spent_amount` is reported. For a single
    /// user the spent figure is recomputed from their transactions.
    pub fn budget_progress(&self, user_id: Option<&str>) -> Vec<BudgetProgress> {
        match user_id {
            None => self
                .snapshot
                .budgets
                .iter()
                .map(|b| self.budget_row(b, b.spent_amount))
                .collect(),
            Some(user_id) => self
                .snapshot
                .budgets_of(user_id)
                .map(|b| {
                    let spent = Self::recompute_budget_spent(b, self.snapshot.transactions_of(user_id));
                    self.budget_row(b, spent)
                })
                .collect(),
        }
    }

    /// Totals and health counts over a user's active budgets
    pub fn budget_overview(&self, user_id: &str) -> CoreResult<BudgetOverview> {
        self.require_profile(user_id)?;

        let active: Vec<BudgetProgress> = self
            .budget_progress(Some(user_id))
            .into_iter()
            .filter(|b| b.is_active)
            .collect();

        let total_allocated: f64 = active.iter().map(|b| b.total.converted_amount).sum();
        let total_spent: f64 = active.iter().map(|b| b.spent.converted_amount).sum();
        let count = |status: BudgetStatus| active.iter().filter(|b| b.status == status).count();

        Ok(BudgetOverview {
            currency: self.display_currency.clone(),
            active_count: active.len(),
            total_allocated,
            total_spent,
            percentage: percentage(total_spent, total_allocated),
            on_track: count(BudgetStatus::OnTrack),
            at_risk: count(BudgetStatus::AtRisk),
            over_budget: count(BudgetStatus::OverBudget),
        })
    }

    // ==================== Savings ====================

    /// Progress of every savings goal, or of one user's goals
    pub fn savings_progress(&self, user_id: Option<&str>) -> Vec<SavingsProgress> {
        self.snapshot
            .savings_goals
            .iter()
            .filter(|g| user_id.map_or(true, |id| g.user_id == id))
            .map(|goal| {
                let currency = self.owner_currency(&goal.user_id);
                SavingsProgress {
                    goal_id: goal.id.clone(),
                    user_id: goal.user_id.clone(),
                    goal_name: goal.goal_name.clone(),
                    deadline: goal.deadline,
                    target: self.show(goal.target_amount, currency),
                    current: self.show(goal.current_amount, currency),
                    percentage: degrade(
                        try_percentage(goal.current_amount, goal.target_amount),
                        0.0,
                        "savings percentage",
                    ),
                    is_completed: goal.is_completed,
                }
            })
            .collect()
    }

    pub fn savings_overview(&self, user_id: &str) -> CoreResult<SavingsOverview> {
        self.require_profile(user_id)?;

        let goals = self.savings_progress(Some(user_id));
        let total_target: f64 = goals.iter().map(|g| g.target.converted_amount).sum();
        let total_saved: f64 = goals.iter().map(|g| g.current.converted_amount).sum();
        let completed_count = goals.iter().filter(|g| g.is_completed).count();

        Ok(SavingsOverview {
            currency: self.display_currency.clone(),
            total_target,
            total_saved,
            percentage: percentage(total_saved, total_target),
            active_count: goals.len() - completed_count,
            completed_count,
        })
    }

    // ==================== Activity ====================

    /// Largest expense categories for a user, biggest first
    pub fn category_spending(&self, user_id: &str, limit: usize) -> CoreResult<Vec<CategorySpending>> {
        let currency = self.require_profile(user_id)?.currency.as_str();

        let names: HashMap<&str, &str> = self
            .snapshot
            .categories
            .iter()
            .map(|c| (c.id.as_str(), c.category_name.as_str()))
            .collect();

        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for tx in self.snapshot.transactions_of(user_id).filter(|t| t.is_expense()) {
            let name = tx
                .category_id
                .as_deref()
                .and_then(|id| names.get(id).copied())
                .unwrap_or(UNCATEGORIZED);
            *totals.entry(name).or_insert(0.0) += tx.amount;
        }

        let mut ranked: Vec<(&str, f64)> = totals.into_iter().filter(|(_, amount)| *amount > 0.0).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(limit);

        Ok(ranked
            .into_iter()
            .map(|(category, amount)| CategorySpending {
                category: category.to_string(),
                amount: self.show(amount, currency),
            })
            .collect())
    }

    /// Most recent transactions across all users, newest first
    pub fn recent_activity(&self, limit: usize) -> Vec<ActivityEntry> {
        let profiles = self.snapshot.profile_index();

        let mut transactions: Vec<&Transaction> = self.snapshot.transactions.iter().collect();
        // Undated entries sort last
        transactions.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));

        transactions
            .into_iter()
            .take(limit)
            .map(|tx| {
                let owner = profiles.get(tx.user_id.as_str()).copied();
                let currency = owner.map(|p| p.currency.as_str()).unwrap_or(DEFAULT_CURRENCY);
                ActivityEntry {
                    transaction_id: tx.id.clone(),
                    user_id: tx.user_id.clone(),
                    user_name: owner
                        .map(|p| p.display_name().to_string())
                        .unwrap_or_else(|| "Unknown".to_string()),
                    transaction_type: tx.transaction_type,
                    description: tx.description.clone(),
                    date: tx.transaction_date,
                    amount: self.show(tx.amount, currency),
                }
            })
            .collect()
    }

    // ==================== Ledger & Analytics ====================

    /// Every transaction, oldest first, with a running balance.
    ///
    /// Income is a credit and expenses a debit. Undated transactions sort
    /// before dated ones.
    pub fn general_ledger(&self) -> GeneralLedger {
        let profiles = self.snapshot.profile_index();

        let mut transactions: Vec<&Transaction> = self.snapshot.transactions.iter().collect();
        transactions.sort_by_key(|t| t.transaction_date);

        let mut ledger = GeneralLedger {
            currency: self.display_currency.clone(),
            entries: Vec::with_capacity(transactions.len()),
            total_debits: 0.0,
            total_credits: 0.0,
            closing_balance: 0.0,
        };

        for tx in transactions {
            let owner = profiles.get(tx.user_id.as_str()).copied();
            let currency = owner.map(|p| p.currency.as_str()).unwrap_or(DEFAULT_CURRENCY);
            let amount = self.show(tx.amount, currency).converted_amount;

            let (debit, credit) = match tx.transaction_type {
                TransactionType::Income => (0.0, amount),
                TransactionType::Expense => (amount, 0.0),
            };
            ledger.total_debits += debit;
            ledger.total_credits += credit;
            ledger.closing_balance += credit - debit;

            ledger.entries.push(LedgerEntry {
                transaction_id: tx.id.clone(),
                date: tx.transaction_date,
                description: tx.description.clone().unwrap_or_else(|| "Transaction".to_string()),
                user_id: tx.user_id.clone(),
                user_name: owner
                    .map(|p| p.display_name().to_string())
                    .unwrap_or_else(|| "Unknown User".to_string()),
                transaction_type: tx.transaction_type,
                debit,
                credit,
                balance: ledger.closing_balance,
            });
        }

        ledger
    }

    /// Allocated against stored spent for every budget
    pub fn budget_variance(&self) -> Vec<BudgetVariance> {
        let profiles = self.snapshot.profile_index();

        self.snapshot
            .budgets
            .iter()
            .map(|budget| {
                let owner = profiles.get(budget.user_id.as_str()).copied();
                let currency = owner.map(|p| p.currency.as_str()).unwrap_or(DEFAULT_CURRENCY);
                let allocated = self.show(budget.total_amount, currency);
                let spent = self.show(budget.spent_amount, currency);

                let percent_used = if allocated.converted_amount > 0.0 {
                    spent.converted_amount / allocated.converted_amount * 100.0
                } else {
                    0.0
                };

                BudgetVariance {
                    budget_id: budget.id.clone(),
                    budget_name: budget.budget_name.clone(),
                    user_id: budget.user_id.clone(),
                    user_name: owner
                        .map(|p| p.display_name().to_string())
                        .unwrap_or_else(|| "Unknown".to_string()),
                    variance: allocated.converted_amount - spent.converted_amount,
                    percent_used: round_half_up(percent_used),
                    status: VarianceStatus::classify(percent_used, self.budgets.variance_critical_threshold),
                    allocated,
                    spent,
                }
            })
            .collect()
    }

    /// Income statement for `period`, measured back from `today`.
    ///
    /// A bounded period only sees dated transactions on or after its start.
    /// Undated transactions count toward totals and descriptions for
    /// [`ReportPeriod::All`], stay out of the monthly series, and age as
    /// older than 90 days.
    pub fn financials(&self, period: ReportPeriod, today: NaiveDate) -> FinancialReport {
        let start_date = period.start_date(today);
        let profiles = self.snapshot.profile_index();

        let mut transactions: Vec<&Transaction> = self
            .snapshot
            .transactions
            .iter()
            .filter(|t| match start_date {
                Some(start) => t.transaction_date.map_or(false, |date| date >= start),
                None => true,
            })
            .collect();
        transactions.sort_by_key(|t| t.transaction_date);

        let mut total_income = 0.0;
        let mut total_expense = 0.0;
        let mut aging = AgingBuckets::default();
        let mut months: BTreeMap<NaiveDate, MonthlyFlow> = BTreeMap::new();
        let mut income_by: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
        let mut expense_by: BTreeMap<&str, (usize, f64)> = BTreeMap::new();

        for &tx in &transactions {
            let currency = profiles
                .get(tx.user_id.as_str())
                .copied()
                .map(|p| p.currency.as_str())
                .unwrap_or(DEFAULT_CURRENCY);
            let amount = self.show(tx.amount, currency).converted_amount;

            let (by_description, fallback) = match tx.transaction_type {
                TransactionType::Income => {
                    total_income += amount;
                    (&mut income_by, "Other Income")
                }
                TransactionType::Expense => {
                    total_expense += amount;
                    (&mut expense_by, "Other Expense")
                }
            };
            let description = tx.description.as_deref().unwrap_or(fallback);
            let entry = by_description.entry(description).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += amount;

            if let Some(date) = tx.transaction_date {
                let window = MonthWindow::containing(date);
                let flow = months.entry(window.start).or_insert_with(|| MonthlyFlow {
                    month: window.short_label(),
                    income: 0.0,
                    expense: 0.0,
                    net: 0.0,
                });
                match tx.transaction_type {
                    TransactionType::Income => flow.income += amount,
                    TransactionType::Expense => flow.expense += amount,
                }
                flow.net = flow.income - flow.expense;
            }

            let age_days = tx
                .transaction_date
                .map(|date| today.signed_duration_since(date).num_days());
            aging.add(age_days, amount);
        }

        let net_position = total_income - total_expense;
        let monthly_average = if months.is_empty() {
            0.0
        } else {
            net_position.abs() / months.len() as f64
        };
        let limit = self.settings.top_descriptions_count;

        log::debug!(
            target: "finboard::dashboard",
            "Financials for period {} in {}: {} transactions over {} months",
            period,
            self.display_currency,
            transactions.len(),
            months.len()
        );

        FinancialReport {
            currency: self.display_currency.clone(),
            period,
            start_date,
            transaction_count: transactions.len(),
            total_income,
            total_expense,
            net_position,
            monthly_average,
            monthly: months.into_values().collect(),
            top_income: top_descriptions(income_by, limit),
            top_expenses: top_descriptions(expense_by, limit),
            aging,
        }
    }

    // ==================== Currency Change ====================

    /// Amounts to store when a user switches currency.
    ///
    /// Transactions are rounded to whole units; budgets and savings goals keep
    /// cents. The new currency must have a rate.
    pub fn currency_rebase(&self, user_id: &str, new_currency: &str) -> CoreResult<RebasePlan> {
        let profile = self.require_profile(user_id)?;
        let from = profile.currency.as_str();
        let to = models::normalize_currency(Some(new_currency));
        self.rates.require_rate(&to)?;

        let mut plan = RebasePlan {
            user_id: user_id.to_string(),
            from_currency: from.to_string(),
            to_currency: to.clone(),
            transactions: Vec::new(),
            budgets: Vec::new(),
            savings_goals: Vec::new(),
        };
        if plan.is_noop() {
            return Ok(plan);
        }

        let rebase = |amount: f64| Rebased {
            before: amount,
            after: self.rates.convert(amount, from, &to),
        };

        plan.transactions = self
            .snapshot
            .transactions_of(user_id)
            .map(|t| RebasedTransaction {
                transaction_id: t.id.clone(),
                amount: Rebased {
                    before: t.amount,
                    after: round_half_up(self.rates.convert(t.amount, from, &to)),
                },
            })
            .collect();
        plan.budgets = self
            .snapshot
            .budgets_of(user_id)
            .map(|b| RebasedBudget {
                budget_id: b.id.clone(),
                total_amount: rebase(b.total_amount),
                spent_amount: rebase(b.spent_amount),
            })
            .collect();
        plan.savings_goals = self
            .snapshot
            .savings_goals_of(user_id)
            .map(|g| RebasedSavingsGoal {
                goal_id: g.id.clone(),
                target_amount: rebase(g.target_amount),
                current_amount: rebase(g.current_amount),
            })
            .collect();

        log::info!(
            target: "finboard::dashboard",
            "Rebase plan for {}: {} -> {}, {} records",
            user_id,
            plan.from_currency,
            plan.to_currency,
            plan.record_count()
        );

        Ok(plan)
    }
}

/// Largest description totals first
fn top_descriptions(totals: BTreeMap<&str, (usize, f64)>, limit: usize) -> Vec<DescriptionTotal> {
    let mut ranked: Vec<DescriptionTotal> = totals
        .into_iter()
        .map(|(description, (count, amount))| DescriptionTotal {
            description: description.to_string(),
            count,
            amount,
        })
        .collect();
    ranked.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    ranked.truncate(limit);
    ranked
}

/// Raw income and expense sums in the owner's currency
fn sum_by_type<'a>(transactions: impl Iterator<Item = &'a Transaction>) -> (f64, f64) {
    transactions.fold((0.0, 0.0), |(income, expenses), t| match t.transaction_type {
        TransactionType::Income => (income + t.amount, expenses),
        TransactionType::Expense => (income, expenses + t.amount),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> Snapshot {
        let content = json!({
            "profiles": [
                { "$id": "p1", "user_id": "u1", "full_name": "Ayesha Khan", "email": "ayesha@example.com", "currency": "USD" },
                { "$id": "p2", "user_id": "u2", "full_name": "Bilal Ahmed", "email": "bilal@example.com", "currency": "PKR" }
            ],
            "transactions": [
                { "$id": "t1", "user_id": "u1", "amount": 100, "type": "income", "transaction_date": "2024-06-02" },
                { "$id": "t2", "user_id": "u1", "amount": 200, "type": "income", "transaction_date": "2024-05-10" },
                { "$id": "t3", "user_id": "u2", "amount": 5000, "type": "income", "transaction_date": "2024-06-05" },
                { "$id": "t4", "user_id": "u1", "amount": 40, "type": "expense", "category_id": "c1", "budget_id": "b1", "transaction_date": "2024-06-03" },
                { "$id": "t5", "user_id": "u1", "amount": 25, "type": "expense", "category_id": "c2", "budget_id": "b1", "transaction_date": "2024-06-20" },
                { "$id": "t6", "user_id": "u1", "amount": 15, "type": "expense", "budget_id": "b1", "transaction_date": "2024-07-01" },
                { "$id": "t7", "user_id": "u1", "amount": 10, "type": "expense", "category_id": "gone", "transaction_date": "2024-05-15" }
            ],
            "budgets": [
                { "$id": "b1", "user_id": "u1", "budget_name": "June", "total_amount": 80, "spent_amount": 0,
                  "start_date": "2024-06-01", "end_date": "2024-06-30", "is_active": true },
                { "$id": "b2", "user_id": "u1", "budget_name": "Old", "total_amount": 50, "spent_amount": 10, "is_active": false },
                { "$id": "b3", "user_id": "u2", "budget_name": "Rent", "total_amount": 0, "spent_amount": 500, "is_active": true }
            ],
            "savings_goals": [
                { "$id": "g1", "user_id": "u1", "goal_name": "Laptop", "target_amount": 1000, "current_amount": 250 },
                { "$id": "g2", "user_id": "u1", "goal_name": "Trip", "target_amount": 500, "current_amount": 500, "is_completed": true }
            ],
            "categories": [
                { "$id": "c1", "category_name": "Food", "type": "expense", "is_default": true },
                { "$id": "c2", "user_id": "u1", "category_name": "Books", "type": "expense" }
            ]
        })
        .to_string();
        Snapshot::from_json_str(&content).unwrap()
    }

    fn dashboard(currency: &str) -> Dashboard {
        Dashboard::new(ExchangeRateTable::default(), snapshot(), currency)
    }

    #[test]
    fn test_admin_overview_in_pkr() {
        let overview = dashboard("PKR").admin_overview();
        assert_eq!(overview.user_count, 2);
        assert_eq!(overview.transaction_count, 7);
        assert_eq!(overview.active_budget_count, 2);
        assert_eq!(overview.savings_goal_count, 2);

        assert!((overview.income.breakdown.get("USD").unwrap() - 83333.34).abs() < 1e-6);
        assert_eq!(overview.income.breakdown.get("PKR"), Some(5000.0));
        assert!((overview.income.total - 88333.34).abs() < 1e-6);
        assert_eq!(overview.income_bar, 100.0);
        assert!(overview.expenses_bar < overview.balance_bar);
    }

    #[test]
    fn test_user_summary() {
        let summary = dashboard("USD").user_summary("u1").unwrap();
        assert_eq!(summary.name, "Ayesha Khan");
        assert_eq!(summary.income.converted_amount, 300.0);
        assert_eq!(summary.expenses.converted_amount, 90.0);
        assert_eq!(summary.net.converted_amount, 210.0);
        assert_eq!(summary.net.label, "USD");
        assert_eq!(summary.budget_count, 2);
        assert_eq!(summary.category_count, 1);
        assert!((summary.balance_bar - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_user() {
        let err = dashboard("PKR").user_summary("nobody").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UserNotFound);
    }

    #[test]
    fn test_monthly_summary() {
        let reference = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let summary = dashboard("USD").monthly_summary("u1", reference).unwrap();
        assert_eq!(summary.month, "June 2024");
        assert_eq!(summary.previous_month, "May 2024");
        assert_eq!(summary.income.converted_amount, 100.0);
        assert_eq!(summary.expenses.converted_amount, 65.0);
        assert_eq!(summary.income_change, -50.0);
        assert_eq!(summary.expenses_change, 550.0);
        assert_eq!(summary.balance.converted_amount, 35.0);
    }

    #[test]
    fn test_recompute_budget_spent_uses_window() {
        let board = dashboard("USD");
        let budget = &board.snapshot().budgets[0];
        let spent = Dashboard::recompute_budget_spent(budget, &board.snapshot().transactions);
        assert_eq!(spent, 65.0);
    }

    #[test]
    fn test_budget_progress_for_user() {
        let progress = dashboard("USD").budget_progress(Some("u1"));
        assert_eq!(progress.len(), 2);
        let june = &progress[0];
        assert_eq!(june.spent.converted_amount, 65.0);
        assert_eq!(june.percentage, 81.0);
        assert_eq!(june.status, BudgetStatus::AtRisk);
        assert_eq!(june.remaining.converted_amount, 15.0);
    }

    #[test]
    fn test_budget_progress_zero_total() {
        let progress = dashboard("PKR").budget_progress(None);
        let rent = progress.iter().find(|b| b.budget_id == "b3").unwrap();
        assert_eq!(rent.percentage, 0.0);
        assert_eq!(rent.status, BudgetStatus::OnTrack);
        assert_eq!(rent.spent.converted_amount, 500.0);
    }

    #[test]
    fn test_budget_overview_counts_active_only() {
        let overview = dashboard("USD").budget_overview("u1").unwrap();
        assert_eq!(overview.active_count, 1);
        assert_eq!(overview.total_allocated, 80.0);
        assert_eq!(overview.total_spent, 65.0);
        assert_eq!(overview.at_risk, 1);
        assert_eq!(overview.on_track + overview.over_budget, 0);
    }

    #[test]
    fn test_savings_overview() {
        let overview = dashboard("USD").savings_overview("u1").unwrap();
        assert_eq!(overview.total_target, 1500.0);
        assert_eq!(overview.total_saved, 750.0);
        assert_eq!(overview.percentage, 50.0);
        assert_eq!(overview.active_count, 1);
        assert_eq!(overview.completed_count, 1);

        let progress = dashboard("USD").savings_progress(Some("u1"));
        assert_eq!(progress[0].percentage, 25.0);
    }

    #[test]
    fn test_category_spending() {
        let spending = dashboard("USD").category_spending("u1", 4).unwrap();
        let names: Vec<&str> = spending.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Food", "Books", UNCATEGORIZED]);
        assert_eq!(spending[2].amount.converted_amount, 25.0);

        let top = dashboard("USD").category_spending("u1", 1).unwrap();
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn test_recent_activity_newest_first() {
        let activity = dashboard("PKR").recent_activity(3);
        let ids: Vec<&str> = activity.iter().map(|a| a.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["t6", "t5", "t3"]);
        assert_eq!(activity[0].user_name, "Ayesha Khan");
        assert_eq!(activity[0].amount.label, "USD → PKR");
    }

    #[test]
    fn test_currency_rebase() {
        let plan = dashboard("PKR").currency_rebase("u1", "pkr").unwrap();
        assert_eq!(plan.from_currency, "USD");
        assert_eq!(plan.to_currency, "PKR");
        assert_eq!(plan.transactions.len(), 6);
        // 40 USD is 11111.11 PKR, stored as whole units
        let t4 = plan.transactions.iter().find(|t| t.transaction_id == "t4").unwrap();
        assert_eq!(t4.amount.after, 11111.0);

        let b1 = plan.budgets.iter().find(|b| b.budget_id == "b1").unwrap();
        assert_eq!(b1.total_amount.after, 22222.22);

        let g1 = &plan.savings_goals[0];
        assert_eq!(g1.target_amount.after, 277777.78);
    }

    #[test]
    fn test_currency_rebase_rejects_unknown_target() {
        let err = dashboard("PKR").currency_rebase("u1", "CHF").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownCurrencyCode);
    }

    #[test]
    fn test_currency_rebase_same_currency_is_noop() {
        let plan = dashboard("PKR").currency_rebase("u1", "USD").unwrap();
        assert!(plan.is_noop());
        assert_eq!(plan.record_count(), 0);
    }

    #[test]
    fn test_general_ledger_running_balance() {
        let ledger = dashboard("USD").general_ledger();
        let ids: Vec<&str> = ledger.entries.iter().map(|e| e.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t7", "t1", "t4", "t3", "t5", "t6"]);

        let balances: Vec<f64> = ledger.entries.iter().map(|e| e.balance).collect();
        assert_eq!(balances, vec![200.0, 190.0, 290.0, 250.0, 268.0, 243.0, 228.0]);

        let t3 = &ledger.entries[4];
        assert_eq!(t3.credit, 18.0);
        assert_eq!(t3.debit, 0.0);
        assert_eq!(t3.user_name, "Bilal Ahmed");
        assert_eq!(t3.description, "Transaction");

        assert_eq!(ledger.total_credits, 318.0);
        assert_eq!(ledger.total_debits, 90.0);
        assert_eq!(ledger.closing_balance, 228.0);
    }

    #[test]
    fn test_budget_variance() {
        let rows = dashboard("USD").budget_variance();
        assert_eq!(rows.len(), 3);

        let june = &rows[0];
        assert_eq!(june.variance, 80.0);
        assert_eq!(june.percent_used, 0.0);
        assert_eq!(june.status, VarianceStatus::UnderBudget);
        assert_eq!(june.user_name, "Ayesha Khan");

        let old = &rows[1];
        assert_eq!(old.percent_used, 20.0);
        assert_eq!(old.variance, 40.0);

        // Nothing allocated: overspent but no percentage
        let rent = &rows[2];
        assert_eq!(rent.percent_used, 0.0);
        assert_eq!(rent.status, VarianceStatus::UnderBudget);
        assert!((rent.variance + 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_budget_variance_uses_configured_threshold() {
        let thresholds = BudgetConfig {
            variance_critical_threshold: 20.0,
            ..BudgetConfig::default()
        };
        let rows = dashboard("USD").with_thresholds(thresholds).budget_variance();
        assert_eq!(rows[1].status, VarianceStatus::Critical);
        assert_eq!(rows[0].status, VarianceStatus::UnderBudget);
    }

    #[test]
    fn test_financials_all_time() {
        let today = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        let report = dashboard("USD").financials(ReportPeriod::All, today);

        assert_eq!(report.start_date, None);
        assert_eq!(report.transaction_count, 7);
        assert_eq!(report.total_income, 318.0);
        assert_eq!(report.total_expense, 90.0);
        assert_eq!(report.net_position, 228.0);
        assert_eq!(report.monthly_average, 76.0);

        let months: Vec<&str> = report.monthly.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["May 2024", "Jun 2024", "Jul 2024"]);
        assert_eq!(report.monthly[1].income, 118.0);
        assert_eq!(report.monthly[1].expense, 65.0);
        assert_eq!(report.monthly[1].net, 53.0);

        assert_eq!(report.top_income.len(), 1);
        assert_eq!(report.top_income[0].description, "Other Income");
        assert_eq!(report.top_income[0].count, 3);
        assert_eq!(report.top_expenses[0].count, 4);
        assert_eq!(report.top_expenses[0].amount, 90.0);

        assert_eq!(report.aging.current, 40.0);
        assert_eq!(report.aging.days_31_60, 168.0);
        assert_eq!(report.aging.days_61_90, 200.0);
        assert_eq!(report.aging.over_90, 0.0);
    }

    #[test]
    fn test_financials_current_month() {
        let today = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        let report = dashboard("USD").financials(ReportPeriod::Month, today);

        assert_eq!(report.start_date, NaiveDate::from_ymd_opt(2024, 7, 1));
        assert_eq!(report.transaction_count, 1);
        assert_eq!(report.total_income, 0.0);
        assert_eq!(report.net_position, -15.0);
        assert_eq!(report.monthly_average, 15.0);
        assert!(report.top_income.is_empty());
    }

    #[test]
    fn test_financials_empty_period() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let report = dashboard("PKR").financials(ReportPeriod::Year, today);
        assert_eq!(report.transaction_count, 0);
        assert_eq!(report.monthly_average, 0.0);
        assert!(report.monthly.is_empty());
        assert_eq!(report.aging.total(), 0.0);
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let mut config = Config::default();
        config.currency.rates.insert("USD".to_string(), -1.0);
        let err = Dashboard::from_config(&config, snapshot()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConfigError);
        assert!(!err.is_recoverable());
    }
}
