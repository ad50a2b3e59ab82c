//! The expense endpoints: listing with filters, creation, deletion and
//! the category catalog.

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
    ledger::{ExpenseEntry, LedgerStore, RecordId},
    month,
};

/// The default expense categories offered to clients, in display order.
///
/// The catalog is advisory: expenses store their category as free text,
/// and documents restored from backups may use labels outside this
/// list.
pub const EXPENSE_CATEGORIES: [&str; 12] = [
    "Moradia",
    "Alimentação",
    "Transporte",
    "Saúde",
    "Educação",
    "Lazer",
    "Vestuário",
    "Tecnologia",
    "Utilidades",
    "Presentes",
    "Documentos",
    "Outros",
];

/// The state needed to serve the expense endpoints.
#[derive(Debug, Clone)]
pub struct ExpenseEndpointState {
    /// The shared ledger store.
    pub ledger: Arc<Mutex<LedgerStore>>,
}

impl FromRef<AppState> for ExpenseEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            ledger: state.ledger.clone(),
        }
    }
}

/// Filters for listing expense records. All filters are optional and
/// combine with AND.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseFilter {
    /// Keep only records dated within this `YYYY-MM` month.
    #[serde(rename = "mes")]
    pub month: Option<String>,

    /// Keep only records with exactly this category.
    #[serde(rename = "categoria")]
    pub category: Option<String>,
}

/// The payload for creating an expense record.
#[derive(Debug, Deserialize)]
pub struct NewExpense {
    /// The spending category.
    #[serde(rename = "categoria")]
    pub category: String,

    /// The amount spent.
    #[serde(rename = "valor")]
    pub amount: f64,

    /// The day the money was spent.
    #[serde(rename = "data")]
    pub date: Date,

    /// Free-form note.
    #[serde(rename = "descricao", default)]
    pub description: String,
}

/// List the expense records in insertion order, applying `filter`.
///
/// # Errors
/// Returns [Error::InvalidMonthKey] if the month filter is malformed.
pub async fn get_expenses(
    State(state): State<ExpenseEndpointState>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Response, Error> {
    let month = filter.month.as_deref().map(month::parse_key).transpose()?;

    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let expenses: Vec<ExpenseEntry> = ledger
        .expenses()
        .iter()
        .filter(|entry| month.is_none_or(|month| month::same(entry.date, month)))
        .filter(|entry| {
            filter
                .category
                .as_deref()
                .is_none_or(|category| entry.category == category)
        })
        .cloned()
        .collect();

    Ok(Json(expenses).into_response())
}

/// Create an expense record and respond with it.
///
/// The category is not checked against [EXPENSE_CATEGORIES]; any
/// non-blank label is accepted.
///
/// # Errors
/// Returns [Error::InvalidInput] if the category is blank or the amount
/// is not positive.
pub async fn create_expense(
    State(state): State<ExpenseEndpointState>,
    Json(new_expense): Json<NewExpense>,
) -> Result<Response, Error> {
    let category = new_expense.category.trim();
    if category.is_empty() {
        return Err(Error::InvalidInput(
            "the expense category must not be blank".to_owned(),
        ));
    }
    if new_expense.amount <= 0.0 {
        return Err(Error::InvalidInput(
            "the expense amount must be greater than zero".to_owned(),
        ));
    }

    let mut ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let entry = ledger.add_expense(
        category.to_owned(),
        new_expense.amount,
        new_expense.date,
        new_expense.description,
    )?;

    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

/// Delete the expense record `expense_id`.
///
/// Deleting an id that does not exist still responds with no content,
/// matching the store's retain semantics.
pub async fn delete_expense(
    State(state): State<ExpenseEndpointState>,
    Path(expense_id): Path<RecordId>,
) -> Result<Response, Error> {
    let mut ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    ledger.delete_expense(expense_id)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// The category catalog, for populating client pickers.
pub async fn get_categories() -> Response {
    Json(EXPENSE_CATEGORIES).into_response()
}
