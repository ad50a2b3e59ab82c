//! Pure finance arithmetic over ledger records: monthly summaries,
//! category and source groupings, compound growth projections and goal
//! solvers.
//!
//! Nothing here touches the clock or the store; callers pass in the
//! records and reference dates.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{
    ledger::{ExpenseEntry, IncomeEntry},
    month,
};

/// How far out the goal solvers search, in months (50 years).
pub const GOAL_HORIZON_MONTHS: u32 = 600;

/// Days assumed per month when projecting calendar dates forward.
const DAYS_PER_MONTH: i64 = 30;

/// Income and expense totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// The month the totals cover.
    #[serde(rename = "mes_ano", with = "month::serde_key")]
    pub month: Date,

    /// The sum of income amounts dated within the month.
    #[serde(rename = "total_rendimentos")]
    pub total_income: f64,

    /// The sum of expense amounts dated within the month.
    #[serde(rename = "total_gastos")]
    pub total_expense: f64,

    /// Income minus expenses.
    #[serde(rename = "saldo_mensal")]
    pub net_balance: f64,
}

/// One simulated month of compound growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    /// Months since the start of the projection. Month zero is the
    /// starting balance before any growth.
    #[serde(rename = "mes")]
    pub month: u32,

    /// The balance at the end of this month.
    #[serde(rename = "saldo")]
    pub balance: f64,

    /// The projected calendar date, assuming 30-day months.
    #[serde(rename = "data")]
    pub date: Date,
}

/// Sum the incomes and expenses dated within `month`'s calendar month.
///
/// `month` may be any day of that month; the summary reports the first
/// day.
pub fn monthly_summary(
    incomes: &[IncomeEntry],
    expenses: &[ExpenseEntry],
    month: Date,
) -> MonthlySummary {
    let total_income = incomes
        .iter()
        .filter(|entry| month::same(entry.date, month))
        .map(|entry| entry.amount)
        .sum::<f64>();
    let total_expense = expenses
        .iter()
        .filter(|entry| month::same(entry.date, month))
        .map(|entry| entry.amount)
        .sum::<f64>();

    MonthlySummary {
        month: month::first_day(month),
        total_income,
        total_expense,
        net_balance: total_income - total_expense,
    }
}

/// Every month that has at least one income or expense record, in
/// chronological order.
pub fn distinct_months(incomes: &[IncomeEntry], expenses: &[ExpenseEntry]) -> Vec<Date> {
    let mut months = HashSet::new();

    for date in incomes
        .iter()
        .map(|entry| entry.date)
        .chain(expenses.iter().map(|entry| entry.date))
    {
        months.insert(month::first_day(date));
    }

    let mut sorted: Vec<_> = months.into_iter().collect();
    sorted.sort();
    sorted
}

/// Total expense amounts per category.
pub fn expenses_by_category(expenses: &[ExpenseEntry]) -> HashMap<String, f64> {
    let mut totals = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
    }

    totals
}

/// Total income amounts per source.
pub fn income_by_source(incomes: &[IncomeEntry]) -> HashMap<String, f64> {
    let mut totals = HashMap::new();

    for income in incomes {
        *totals.entry(income.source.clone()).or_insert(0.0) += income.amount;
    }

    totals
}

/// Simulate `months` months of compound growth with a fixed monthly
/// contribution.
///
/// Each month the balance grows by one twelfth of `annual_rate`
/// (a percentage), then receives the contribution. The returned series
/// has `months + 1` points: point zero is the starting balance.
///
/// Projected dates step forward 30 days per month from `start`, a
/// deliberately flat approximation. Callers keep `months` within
/// [GOAL_HORIZON_MONTHS] so the dates stay inside the supported
/// calendar range.
pub fn compound_growth(
    initial_balance: f64,
    monthly_contribution: f64,
    annual_rate: f64,
    months: u32,
    start: Date,
) -> Vec<ProjectionPoint> {
    let rate = monthly_rate(annual_rate);

    let mut series = Vec::with_capacity(months as usize + 1);
    series.push(ProjectionPoint {
        month: 0,
        balance: initial_balance,
        date: start,
    });

    let mut balance = initial_balance;
    for month in 1..=months {
        balance = balance * (1.0 + rate) + monthly_contribution;
        series.push(ProjectionPoint {
            month,
            balance,
            date: start + Duration::days(DAYS_PER_MONTH * i64::from(month)),
        });
    }

    series
}

/// The fixed monthly contribution needed to grow `current_balance` to
/// `target` in `months` months at `annual_rate` percent.
///
/// Returns zero when no contribution is needed: the term is zero
/// months, or the current balance alone compounds past the target.
///
/// ```
/// use cofrinho_rs::calculator::required_contribution;
///
/// let contribution = required_contribution(10_000.0, 0.0, 0.0, 10);
/// assert_eq!(contribution, 1000.0);
/// ```
pub fn required_contribution(
    target: f64,
    current_balance: f64,
    annual_rate: f64,
    months: u32,
) -> f64 {
    if months == 0 {
        return 0.0;
    }

    let rate = monthly_rate(annual_rate);
    let growth = (1.0 + rate).powi(months as i32);
    let remaining = target - current_balance * growth;

    if remaining <= 0.0 {
        return 0.0;
    }

    let contribution = if rate > 0.0 {
        // Future value of an annuity, solved for the payment.
        remaining * rate / (growth - 1.0)
    } else {
        remaining / f64::from(months)
    };

    contribution.max(0.0)
}

/// How many months of fixed contributions it takes to grow
/// `current_balance` to `target` at `annual_rate` percent.
///
/// Returns `Some(0)` when the balance already covers the target, and
/// `None` when the target is still unreached at the
/// [GOAL_HORIZON_MONTHS] horizon. Crossing the target exactly on the
/// horizon's final month still counts as unreached.
pub fn required_months(
    target: f64,
    current_balance: f64,
    monthly_contribution: f64,
    annual_rate: f64,
) -> Option<u32> {
    let rate = monthly_rate(annual_rate);

    let mut balance = current_balance;
    let mut months = 0;
    while balance < target && months < GOAL_HORIZON_MONTHS {
        balance = balance * (1.0 + rate) + monthly_contribution;
        months += 1;
    }

    (months < GOAL_HORIZON_MONTHS).then_some(months)
}

fn monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / 100.0 / 12.0
}


#[cfg(test)]
mod grouping_tests {
    use time::macros::date;

    use super::{
        distinct_months, expenses_by_category, income_by_source,
        test_records::{expense, income},
    };

    #[test]
    fn expenses_by_category_sums_repeated_categories() {
        let expenses = vec![
            expense("Moradia", 1200.0, date!(2024 - 05 - 05)),
            expense("Moradia", 150.0, date!(2024 - 05 - 10)),
            expense("Lazer", 80.0, date!(2024 - 05 - 12)),
        ];

        let totals = expenses_by_category(&expenses);

        assert_eq!(totals.len(), 2);
        assert_eq!(totals["Moradia"], 1350.0);
        assert_eq!(totals["Lazer"], 80.0);
    }

    #[test]
    fn income_by_source_sums_repeated_sources() {
        let incomes = vec![
            income("Salário", 4500.0, date!(2024 - 05 - 01)),
            income("Freelance", 800.0, date!(2024 - 05 - 20)),
            income("Freelance", 200.0, date!(2024 - 06 - 02)),
        ];

        let totals = income_by_source(&incomes);

        assert_eq!(totals.len(), 2);
        assert_eq!(totals["Salário"], 4500.0);
        assert_eq!(totals["Freelance"], 1000.0);
    }

    #[test]
    fn distinct_months_are_unique_and_sorted() {
        let incomes = vec![
            income("Salário", 4500.0, date!(2024 - 06 - 01)),
            income("Salário", 4500.0, date!(2024 - 04 - 01)),
        ];
        let expenses = vec![
            expense("Moradia", 1200.0, date!(2024 - 04 - 25)),
            expense("Moradia", 1200.0, date!(2024 - 05 - 25)),
        ];

        let months = distinct_months(&incomes, &expenses);

        assert_eq!(
            months,
            vec![
                date!(2024 - 04 - 01),
                date!(2024 - 05 - 01),
                date!(2024 - 06 - 01)
            ]
        );
    }
}

#[cfg(test)]
mod compound_growth_tests {
    use time::macros::date;

    use super::compound_growth;

    #[test]
    fn zero_rate_and_contribution_keep_the_balance_constant() {
        let series = compound_growth(500.0, 0.0, 0.0, 6, date!(2024 - 01 - 01));

        assert_eq!(series.len(), 7);
        for point in &series {
            assert_eq!(point.balance, 500.0);
        }
    }

    #[test]
    fn point_zero_is_the_unmodified_starting_balance() {
        let series = compound_growth(1000.0, 100.0, 12.0, 3, date!(2024 - 01 - 01));

        assert_eq!(series[0].month, 0);
        assert_eq!(series[0].balance, 1000.0);
        assert_eq!(series[0].date, date!(2024 - 01 - 01));
    }

    #[test]
    fn growth_is_applied_before_the_contribution() {
        // 12% a year is 1% a month: 1000 * 1.01 + 100, not (1000 + 100) * 1.01.
        let series = compound_growth(1000.0, 100.0, 12.0, 2, date!(2024 - 01 - 01));

        assert!((series[1].balance - 1110.0).abs() < 1e-9);
        assert!((series[2].balance - 1221.1).abs() < 1e-9);
    }

    #[test]
    fn dates_step_thirty_days_per_month() {
        let series = compound_growth(0.0, 0.0, 0.0, 3, date!(2024 - 01 - 01));

        assert_eq!(series[1].date, date!(2024 - 01 - 31));
        assert_eq!(series[2].date, date!(2024 - 03 - 01));
        assert_eq!(series[3].date, date!(2024 - 03 - 31));
    }

    #[test]
    fn months_are_numbered_from_zero() {
        let series = compound_growth(0.0, 50.0, 10.0, 4, date!(2024 - 01 - 01));

        let months: Vec<_> = series.iter().map(|point| point.month).collect();
        assert_eq!(months, vec![0, 1, 2, 3, 4]);
    }
}
