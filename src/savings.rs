//! The savings endpoints: the account overview, the movement history
//! and the annual rate.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    ledger::{LedgerStore, MovementKind, SavingsMovement},
    month,
};

/// The state needed to serve the savings endpoints.
#[derive(Debug, Clone)]
pub struct SavingsEndpointState {
    /// The shared ledger store.
    pub ledger: Arc<Mutex<LedgerStore>>,
}

impl FromRef<AppState> for SavingsEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            ledger: state.ledger.clone(),
        }
    }
}

/// A snapshot of the savings account.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct SavingsOverview {
    /// The current balance.
    #[serde(rename = "saldo_atual")]
    pub balance: f64,

    /// The annual growth rate as a percentage.
    #[serde(rename = "taxa_cdi")]
    pub annual_rate: f64,

    /// How many movements the history holds.
    #[serde(rename = "total_movimentacoes")]
    pub movement_count: usize,
}

impl SavingsOverview {
    fn from_ledger(ledger: &LedgerStore) -> Self {
        let savings = ledger.savings();

        Self {
            balance: savings.balance,
            annual_rate: savings.annual_rate,
            movement_count: savings.movements.len(),
        }
    }
}

/// Filters for listing savings movements. All filters are optional and
/// combine with AND.
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    /// Keep only movements of this kind.
    #[serde(rename = "operacao")]
    pub kind: Option<MovementKind>,

    /// Keep only movements dated within this `YYYY-MM` month.
    #[serde(rename = "mes")]
    pub month: Option<String>,
}

/// The payload for recording a savings movement.
#[derive(Debug, Deserialize)]
pub struct NewMovement {
    /// Whether money goes in or out.
    #[serde(rename = "operacao")]
    pub kind: MovementKind,

    /// The amount moved.
    #[serde(rename = "valor")]
    pub amount: f64,

    /// Free-form note.
    #[serde(rename = "descricao", default)]
    pub description: String,
}

/// The payload for setting the annual rate.
#[derive(Debug, Deserialize)]
pub struct RateUpdate {
    /// The new annual growth rate as a percentage.
    #[serde(rename = "taxa_cdi")]
    pub annual_rate: f64,
}

/// A snapshot of the savings account balance, rate and history size.
pub async fn get_savings(State(state): State<SavingsEndpointState>) -> Result<Response, Error> {
    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    Ok(Json(SavingsOverview::from_ledger(&ledger)).into_response())
}

/// List the savings movements in insertion order, applying `filter`.
///
/// # Errors
/// Returns [Error::InvalidMonthKey] if the month filter is malformed.
pub async fn get_movements(
    State(state): State<SavingsEndpointState>,
    Query(filter): Query<MovementFilter>,
) -> Result<Response, Error> {
    let month = filter.month.as_deref().map(month::parse_key).transpose()?;

    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let movements: Vec<SavingsMovement> = ledger
        .savings()
        .movements
        .iter()
        .filter(|movement| filter.kind.is_none_or(|kind| movement.kind == kind))
        .filter(|movement| month.is_none_or(|month| month::same(movement.date, month)))
        .cloned()
        .collect();

    Ok(Json(movements).into_response())
}

/// Record a deposit or withdrawal and respond with the stored movement.
///
/// The balance check and the mutation happen under a single lock so a
/// concurrent withdrawal cannot sneak past the check.
///
/// # Errors
/// Returns [Error::InvalidInput] if the amount is not positive or a
/// withdrawal exceeds the balance.
pub async fn create_movement(
    State(state): State<SavingsEndpointState>,
    Json(new_movement): Json<NewMovement>,
) -> Result<Response, Error> {
    if new_movement.amount <= 0.0 {
        return Err(Error::InvalidInput(
            "the movement amount must be greater than zero".to_owned(),
        ));
    }

    let mut ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    if new_movement.kind == MovementKind::Withdrawal
        && new_movement.amount > ledger.savings().balance
    {
        return Err(Error::InvalidInput(
            "the withdrawal exceeds the savings balance".to_owned(),
        ));
    }

    let movement = ledger.record_savings_movement(
        new_movement.kind,
        new_movement.amount,
        new_movement.description,
    )?;

    Ok((StatusCode::CREATED, Json(movement)).into_response())
}

/// Set the annual growth rate and respond with the updated overview.
///
/// # Errors
/// Returns [Error::InvalidInput] if the rate is not positive.
pub async fn update_rate(
    State(state): State<SavingsEndpointState>,
    Json(update): Json<RateUpdate>,
) -> Result<Response, Error> {
    if update.annual_rate <= 0.0 {
        return Err(Error::InvalidInput(
            "the annual rate must be greater than zero".to_owned(),
        ));
    }

    let mut ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    ledger.set_annual_rate(update.annual_rate)?;

    Ok(Json(SavingsOverview::from_ledger(&ledger)).into_response())
}
