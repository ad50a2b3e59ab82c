//! The income endpoints: listing with filters, creation and deletion.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    ledger::{IncomeEntry, LedgerStore, RecordId},
    month,
};

/// The state needed to serve the income endpoints.
#[derive(Debug, Clone)]
pub struct IncomeEndpointState {
    /// The shared ledger store.
    pub ledger: Arc<Mutex<LedgerStore>>,
}

impl FromRef<AppState> for IncomeEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            ledger: state.ledger.clone(),
        }
    }
}

/// Filters for listing income records. All filters are optional and
/// combine with AND.
#[derive(Debug, Default, Deserialize)]
pub struct IncomeFilter {
    /// Keep only records dated within this `YYYY-MM` month.
    #[serde(rename = "mes")]
    pub month: Option<String>,

    /// Keep only records with exactly this source.
    #[serde(rename = "fonte")]
    pub source: Option<String>,
}

/// The payload for creating an income record.
#[derive(Debug, Deserialize)]
pub struct NewIncome {
    /// Where the money came from.
    #[serde(rename = "fonte")]
    pub source: String,

    /// The amount received.
    #[serde(rename = "valor")]
    pub amount: f64,

    /// The day the money arrived.
    #[serde(rename = "data")]
    pub date: Date,

    /// Free-form note.
    #[serde(rename = "descricao", default)]
    pub description: String,
}

/// List the income records in insertion order, applying `filter`.
///
/// # Errors
/// Returns [Error::InvalidMonthKey] if the month filter is malformed.
pub async fn get_incomes(
    State(state): State<IncomeEndpointState>,
    Query(filter): Query<IncomeFilter>,
) -> Result<Response, Error> {
    let month = filter.month.as_deref().map(month::parse_key).transpose()?;

    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let incomes: Vec<IncomeEntry> = ledger
        .incomes()
        .iter()
        .filter(|entry| month.is_none_or(|month| month::same(entry.date, month)))
        .filter(|entry| {
            filter
                .source
                .as_deref()
                .is_none_or(|source| entry.source == source)
        })
        .cloned()
        .collect();

    Ok(Json(incomes).into_response())
}

/// Create an income record and respond with it.
///
/// # Errors
/// Returns [Error::InvalidInput] if the source is blank or the amount
/// is not positive.
pub async fn create_income(
    State(state): State<IncomeEndpointState>,
    Json(new_income): Json<NewIncome>,
) -> Result<Response, Error> {
    let source = new_income.source.trim();
    if source.is_empty() {
        return Err(Error::InvalidInput(
            "the income source must not be blank".to_owned(),
        ));
    }
    if new_income.amount <= 0.0 {
        return Err(Error::InvalidInput(
            "the income amount must be greater than zero".to_owned(),
        ));
    }

    let mut ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let entry = ledger.add_income(
        source.to_owned(),
        new_income.amount,
        new_income.date,
        new_income.description,
    )?;

    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

/// Delete the income record `income_id`.
///
/// Deleting an id that does not exist still responds with no content,
/// matching the store's retain semantics.
pub async fn delete_income(
    State(state): State<IncomeEndpointState>,
    Path(income_id): Path<RecordId>,
) -> Result<Response, Error> {
    let mut ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    ledger.delete_income(income_id)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
