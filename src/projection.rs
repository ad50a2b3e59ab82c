//! The projection endpoints: compound growth simulation and the two
//! goal solvers.
//!
//! Balance and rate parameters fall back to the savings account when
//! omitted, so clients can ask "what if" questions without repeating
//! stored values.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    AppState, Error,
    calculator::{self, GOAL_HORIZON_MONTHS, ProjectionPoint},
    ledger::LedgerStore,
};

/// The state needed to serve the projection endpoints.
#[derive(Debug, Clone)]
pub struct ProjectionEndpointState {
    /// The shared ledger store.
    pub ledger: Arc<Mutex<LedgerStore>>,

    /// The timezone offset used to date the projected series.
    pub local_offset: UtcOffset,
}

impl FromRef<AppState> for ProjectionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            ledger: state.ledger.clone(),
            local_offset: state.local_offset,
        }
    }
}

/// Query parameters for the growth projection.
#[derive(Debug, Deserialize)]
pub struct ProjectionParams {
    /// The balance to start from. Defaults to the savings balance.
    #[serde(rename = "saldo_inicial")]
    pub initial_balance: Option<f64>,

    /// The amount added at the end of each month.
    #[serde(rename = "aporte_mensal")]
    pub monthly_contribution: f64,

    /// The annual growth rate as a percentage. Defaults to the stored
    /// rate.
    #[serde(rename = "taxa_anual")]
    pub annual_rate: Option<f64>,

    /// How many months to project.
    #[serde(rename = "meses")]
    pub months: u32,
}

/// Query parameters for the required contribution solver.
#[derive(Debug, Deserialize)]
pub struct ContributionParams {
    /// The balance the plan aims for.
    #[serde(rename = "valor_meta")]
    pub target: f64,

    /// The balance already saved. Defaults to the savings balance.
    #[serde(rename = "saldo_atual")]
    pub current_balance: Option<f64>,

    /// How many months the plan allows.
    #[serde(rename = "prazo_meses")]
    pub term_months: u32,

    /// The annual growth rate as a percentage. Defaults to the stored
    /// rate.
    #[serde(rename = "taxa_anual")]
    pub annual_rate: Option<f64>,
}

/// Query parameters for the time-to-goal solver.
#[derive(Debug, Deserialize)]
pub struct TimeToGoalParams {
    /// The balance the plan aims for.
    #[serde(rename = "valor_meta")]
    pub target: f64,

    /// The balance already saved. Defaults to the savings balance.
    #[serde(rename = "saldo_atual")]
    pub current_balance: Option<f64>,

    /// The amount added at the end of each month.
    #[serde(rename = "aporte_mensal")]
    pub monthly_contribution: f64,

    /// The annual growth rate as a percentage. Defaults to the stored
    /// rate.
    #[serde(rename = "taxa_anual")]
    pub annual_rate: Option<f64>,
}

/// A simulated growth series with its totals.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectionReport {
    /// One point per month, starting at month zero.
    #[serde(rename = "serie")]
    pub series: Vec<ProjectionPoint>,

    /// The balance at the end of the last month.
    #[serde(rename = "saldo_final")]
    pub final_balance: f64,

    /// The starting balance plus every contribution.
    #[serde(rename = "total_investido")]
    pub total_invested: f64,

    /// The final balance minus the invested total.
    #[serde(rename = "rendimento_total")]
    pub total_growth: f64,
}

/// The monthly contribution that reaches a target, with its totals.
#[derive(Debug, Serialize, Deserialize)]
pub struct ContributionReport {
    /// The monthly contribution needed to reach the target in time.
    #[serde(rename = "aporte_necessario")]
    pub required_contribution: f64,

    /// The contribution summed over the whole term.
    #[serde(rename = "total_aportes")]
    pub total_contributed: f64,

    /// The part of the target covered by growth rather than deposits.
    #[serde(rename = "rendimento_esperado")]
    pub expected_growth: f64,
}

/// How long a savings plan takes to reach a target.
#[derive(Debug, Serialize, Deserialize)]
pub struct TimeToGoalReport {
    /// Whether the target is reached within the planning horizon.
    #[serde(rename = "alcancavel")]
    pub reachable: bool,

    /// The number of months needed, when reachable.
    #[serde(rename = "total_meses")]
    pub total_months: Option<u32>,

    /// The whole years within the total.
    #[serde(rename = "anos")]
    pub years: Option<u32>,

    /// The months left over after the whole years.
    #[serde(rename = "meses")]
    pub months: Option<u32>,
}

fn ensure_non_negative(value: f64, name: &str) -> Result<f64, Error> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidInput(format!(
            "{name} must be a non-negative number"
        )))
    }
}

fn ensure_positive(value: f64, name: &str) -> Result<f64, Error> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidInput(format!("{name} must be a positive number")))
    }
}

fn ensure_term(months: u32) -> Result<u32, Error> {
    if (1..=GOAL_HORIZON_MONTHS).contains(&months) {
        Ok(months)
    } else {
        Err(Error::InvalidInput(format!(
            "the term must be between 1 and {GOAL_HORIZON_MONTHS} months"
        )))
    }
}

fn savings_snapshot(state: &ProjectionEndpointState) -> Result<(f64, f64), Error> {
    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let savings = ledger.savings();

    Ok((savings.balance, savings.annual_rate))
}

/// Simulate compound growth month by month.
///
/// # Errors
/// Returns [Error::InvalidInput] if a parameter is out of range or not
/// a finite number.
pub async fn get_projection(
    State(state): State<ProjectionEndpointState>,
    Query(params): Query<ProjectionParams>,
) -> Result<Response, Error> {
    let (stored_balance, stored_rate) = savings_snapshot(&state)?;

    let initial_balance = ensure_non_negative(
        params.initial_balance.unwrap_or(stored_balance),
        "the initial balance",
    )?;
    let contribution =
        ensure_non_negative(params.monthly_contribution, "the monthly contribution")?;
    let annual_rate =
        ensure_non_negative(params.annual_rate.unwrap_or(stored_rate), "the annual rate")?;
    let months = ensure_term(params.months)?;

    let start = OffsetDateTime::now_utc().to_offset(state.local_offset).date();
    let series = calculator::compound_growth(initial_balance, contribution, annual_rate, months, start);

    let final_balance = series.last().map_or(initial_balance, |point| point.balance);
    let total_invested = initial_balance + contribution * f64::from(months);

    Ok(Json(ProjectionReport {
        series,
        final_balance,
        total_invested,
        total_growth: final_balance - total_invested,
    })
    .into_response())
}

/// Solve for the monthly contribution that reaches a target.
///
/// # Errors
/// Returns [Error::InvalidInput] if a parameter is out of range or not
/// a finite number.
pub async fn get_required_contribution(
    State(state): State<ProjectionEndpointState>,
    Query(params): Query<ContributionParams>,
) -> Result<Response, Error> {
    let (stored_balance, stored_rate) = savings_snapshot(&state)?;

    let target = ensure_positive(params.target, "the goal target")?;
    let current_balance = ensure_non_negative(
        params.current_balance.unwrap_or(stored_balance),
        "the current balance",
    )?;
    let annual_rate =
        ensure_non_negative(params.annual_rate.unwrap_or(stored_rate), "the annual rate")?;
    let term_months = ensure_term(params.term_months)?;

    let required_contribution =
        calculator::required_contribution(target, current_balance, annual_rate, term_months);
    let total_contributed = required_contribution * f64::from(term_months);

    Ok(Json(ContributionReport {
        required_contribution,
        total_contributed,
        expected_growth: target - current_balance - total_contributed,
    })
    .into_response())
}

/// Solve for how many months a plan needs to reach a target.
///
/// # Errors
/// Returns [Error::InvalidInput] if a parameter is out of range or not
/// a finite number.
pub async fn get_required_months(
    State(state): State<ProjectionEndpointState>,
    Query(params): Query<TimeToGoalParams>,
) -> Result<Response, Error> {
    let (stored_balance, stored_rate) = savings_snapshot(&state)?;

    let target = ensure_positive(params.target, "the goal target")?;
    let current_balance = ensure_non_negative(
        params.current_balance.unwrap_or(stored_balance),
        "the current balance",
    )?;
    let contribution =
        ensure_non_negative(params.monthly_contribution, "the monthly contribution")?;
    let annual_rate =
        ensure_non_negative(params.annual_rate.unwrap_or(stored_rate), "the annual rate")?;

    let report =
        match calculator::required_months(target, current_balance, contribution, annual_rate) {
            Some(total_months) => TimeToGoalReport {
                reachable: true,
                total_months: Some(total_months),
                years: Some(total_months / 12),
                months: Some(total_months % 12),
            },
            None => TimeToGoalReport {
                reachable: false,
                total_months: None,
                years: None,
                months: None,
            },
        };

    Ok(Json(report).into_response())
}
