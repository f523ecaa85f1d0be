//! Derived budget figures and spending warnings.

use crate::{BudgetField, BudgetRecord};
use serde::Serialize;

/// Days used to spread monthly expenses into a daily figure.
pub const DAYS_PER_MONTH: f64 = 30.0;

const SUBSCRIPTIONS_LIMIT: f64 = 0.30;
const FOOD_LIMIT: f64 = 0.40;
const MIN_SAVINGS_RATE: f64 = 20.0;

/// Something in the budget worth pointing out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BudgetWarning {
    /// Subscriptions above 30% of income.
    HighSubscriptions { percent_of_income: f64 },
    /// Food above 40% of income.
    HighFood { percent_of_income: f64 },
    /// Spending more than earning.
    ExpensesExceedIncome { overspend: f64 },
    /// Saving less than 20% of income.
    LowSavingsRate { savings_rate: f64 },
}

/// One category's slice of total expenses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub field: BudgetField,
    pub amount: f64,
    /// Percentage of total expenses
    pub percent: f64,
}

/// Figures derived from a budget record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub total_expenses: f64,
    pub savings: f64,
    /// Expenses as a percentage of income (0 without income)
    pub burn_rate: f64,
    /// Savings as a percentage of income (0 without income)
    pub savings_rate: f64,
    pub daily_spend: f64,
    pub category_shares: Vec<CategoryShare>,
    pub warnings: Vec<BudgetWarning>,
}

impl BudgetSummary {
    pub fn from_record(budget: &BudgetRecord) -> Self {
        let income = budget.income;
        let total_expenses: f64 = BudgetField::EXPENSES
            .iter()
            .map(|field| budget.get(*field))
            .sum();
        let savings = income - total_expenses;

        let (burn_rate, savings_rate) = if income > 0.0 {
            (
                total_expenses / income * 100.0,
                savings / income * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        let category_shares = if total_expenses > 0.0 {
            BudgetField::EXPENSES
                .iter()
                .map(|field| (*field, budget.get(*field)))
                .filter(|(_, amount)| *amount > 0.0)
                .map(|(field, amount)| CategoryShare {
                    field,
                    amount,
                    percent: amount / total_expenses * 100.0,
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut warnings = Vec::new();
        if income > 0.0 {
            if budget.subscriptions / income > SUBSCRIPTIONS_LIMIT {
                warnings.push(BudgetWarning::HighSubscriptions {
                    percent_of_income: budget.subscriptions / income * 100.0,
                });
            }
            if budget.food / income > FOOD_LIMIT {
                warnings.push(BudgetWarning::HighFood {
                    percent_of_income: budget.food / income * 100.0,
                });
            }
            if savings < 0.0 {
                warnings.push(BudgetWarning::ExpensesExceedIncome {
                    overspend: -savings,
                });
            } else if savings_rate < MIN_SAVINGS_RATE {
                warnings.push(BudgetWarning::LowSavingsRate { savings_rate });
            }
        }

        Self {
            total_expenses,
            savings,
            burn_rate,
            savings_rate,
            daily_spend: total_expenses / DAYS_PER_MONTH,
            category_shares,
            warnings,
        }
    }
}
