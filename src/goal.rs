//! The goal endpoints: listing goals with their contribution plans and
//! creating new goals.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    calculator::{self, GOAL_HORIZON_MONTHS},
    ledger::{Goal, LedgerStore},
};

/// The state needed to serve the goal endpoints.
#[derive(Debug, Clone)]
pub struct GoalEndpointState {
    /// The shared ledger store.
    pub ledger: Arc<Mutex<LedgerStore>>,
}

impl FromRef<AppState> for GoalEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            ledger: state.ledger.clone(),
        }
    }
}

/// A goal together with the plan derived from the current savings
/// account: the monthly contribution that reaches the target within the
/// term, and how far along the balance already is.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct GoalWithPlan {
    /// The stored goal.
    #[serde(flatten)]
    pub goal: Goal,

    /// The monthly contribution needed to reach the target in time.
    #[serde(rename = "aporte_necessario")]
    pub required_contribution: f64,

    /// The balance as a percentage of the target, capped at 100.
    #[serde(rename = "progresso")]
    pub progress: f64,
}

/// The payload for creating a goal.
#[derive(Debug, Deserialize)]
pub struct NewGoal {
    /// What the goal is called.
    #[serde(rename = "nome")]
    pub name: String,

    /// The balance the goal aims for.
    #[serde(rename = "valor_meta")]
    pub target_amount: f64,

    /// How many months the goal allows.
    #[serde(rename = "prazo_meses")]
    pub term_months: u32,

    /// Free-form note.
    #[serde(rename = "descricao", default)]
    pub description: String,
}

/// List every goal with its contribution plan.
///
/// Plans are computed against the savings balance and rate at the time
/// of the request, so the same goal reports a smaller contribution as
/// the balance grows.
pub async fn get_goals(State(state): State<GoalEndpointState>) -> Result<Response, Error> {
    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let savings = ledger.savings();
    let goals: Vec<GoalWithPlan> = ledger
        .goals()
        .iter()
        .map(|goal| GoalWithPlan {
            required_contribution: calculator::required_contribution(
                goal.target_amount,
                savings.balance,
                savings.annual_rate,
                goal.term_months,
            ),
            progress: (savings.balance / goal.target_amount * 100.0).min(100.0),
            goal: goal.clone(),
        })
        .collect();

    Ok(Json(goals).into_response())
}

/// Create a goal and respond with the stored record.
///
/// # Errors
/// Returns [Error::InvalidInput] if the name is blank, the target is
/// not positive, or the term is zero or longer than the planning
/// horizon.
pub async fn create_goal(
    State(state): State<GoalEndpointState>,
    Json(new_goal): Json<NewGoal>,
) -> Result<Response, Error> {
    let name = new_goal.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput(
            "the goal name must not be blank".to_owned(),
        ));
    }
    if new_goal.target_amount <= 0.0 {
        return Err(Error::InvalidInput(
            "the goal target must be greater than zero".to_owned(),
        ));
    }
    if !(1..=GOAL_HORIZON_MONTHS).contains(&new_goal.term_months) {
        return Err(Error::InvalidInput(format!(
            "the goal term must be between 1 and {GOAL_HORIZON_MONTHS} months"
        )));
    }

    let mut ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let goal = ledger.add_goal(
        name.to_owned(),
        new_goal.target_amount,
        new_goal.term_months,
        new_goal.description,
    )?;

    Ok((StatusCode::CREATED, Json(goal)).into_response())
}
