//! Financial plan arithmetic.
//!
//! Everything here is pure: the handlers load totals from the database and
//! pass them in. Negative inputs are clamped to zero, so the only signed
//! outputs are the ones that are meant to signal overspending
//! ([`monthly_budget_free`] and [`remaining_limit`]).

use crate::models::FinancialPlan;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Days the monthly surplus is spread over
pub const DAYS_PER_MONTH: u32 = 30;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Amount set aside each month, either absolute or a percentage of income
pub fn savings_amount(plan: &FinancialPlan) -> Decimal {
    let income = non_negative(plan.monthly_income);
    let target = non_negative(plan.savings_target);

    if plan.is_percent_target {
        // Saturates instead of overflowing; the surplus is then clamped away
        income
            .checked_mul(target)
            .map(|product| product / ONE_HUNDRED)
            .unwrap_or(Decimal::MAX)
    } else {
        target
    }
}

/// `income - savings - fixed`, before spreading over the month
pub fn monthly_surplus(plan: &FinancialPlan, total_fixed: Decimal) -> Decimal {
    non_negative(plan.monthly_income)
        .saturating_sub(savings_amount(plan))
        .saturating_sub(non_negative(total_fixed))
}

/// `max(0, floor(surplus / 30))`
pub fn daily_limit(plan: &FinancialPlan, total_fixed: Decimal) -> Decimal {
    let per_day = monthly_surplus(plan, total_fixed) / Decimal::from(DAYS_PER_MONTH);
    non_negative(per_day.floor())
}

/// Safe balance: what is left of the month's income after savings, all
/// spending and the fixed bills. Negative means overspent.
pub fn monthly_budget_free(
    plan: &FinancialPlan,
    total_spent_all_time: Decimal,
    total_fixed: Decimal,
) -> Decimal {
    monthly_surplus(plan, total_fixed).saturating_sub(non_negative(total_spent_all_time))
}

/// What may still be spent today. Negative means the daily limit was exceeded.
pub fn remaining_limit(daily_limit: Decimal, spent_today: Decimal) -> Decimal {
    daily_limit.saturating_sub(non_negative(spent_today))
}

/// Share of today's limit already used, capped at 100
pub fn usage_percentage(daily_limit: Decimal, spent_today: Decimal) -> Decimal {
    if daily_limit <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let used = non_negative(spent_today)
        .checked_div(daily_limit)
        .and_then(|ratio| ratio.checked_mul(ONE_HUNDRED))
        .unwrap_or(ONE_HUNDRED);
    used.min(ONE_HUNDRED).round_dp(2)
}

/// Aggregates loaded from the ledger
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub spent_today: Decimal,
    pub total_spent_all_time: Decimal,
    pub total_fixed: Decimal,
}

/// Everything the dashboard shows about the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub monthly_income: Decimal,
    pub savings_amount: Decimal,
    pub total_fixed: Decimal,
    pub daily_limit: Decimal,
    pub spent_today: Decimal,
    pub remaining_limit: Decimal,
    pub usage_percentage: Decimal,
    pub is_over_limit: bool,
    pub total_spent_all_time: Decimal,
    pub monthly_budget_free: Decimal,
}

impl BudgetSummary {
    /// Build the summary around the user's stored daily limit, which may be a
    /// manual override rather than the derived value
    pub fn compute(plan: &FinancialPlan, daily_limit: Decimal, totals: LedgerTotals) -> Self {
        let spent_today = non_negative(totals.spent_today);

        Self {
            monthly_income: non_negative(plan.monthly_income),
            savings_amount: savings_amount(plan),
            total_fixed: non_negative(totals.total_fixed),
            daily_limit,
            spent_today,
            remaining_limit: remaining_limit(daily_limit, spent_today),
            usage_percentage: usage_percentage(daily_limit, spent_today),
            is_over_limit: spent_today > daily_limit,
            total_spent_all_time: non_negative(totals.total_spent_all_time),
            monthly_budget_free: monthly_budget_free(
                plan,
                totals.total_spent_all_time,
                totals.total_fixed,
            ),
        }
    }
}
