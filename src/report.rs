//! The report endpoints: monthly summaries, the all-time overview and
//! the category and source breakdowns.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    AppState, Error, calculator,
    ledger::{ExpenseEntry, IncomeEntry, LedgerStore},
    month,
};

/// The state needed to serve the report endpoints.
#[derive(Debug, Clone)]
pub struct ReportEndpointState {
    /// The shared ledger store.
    pub ledger: Arc<Mutex<LedgerStore>>,

    /// The timezone offset used to resolve "the current month".
    pub local_offset: UtcOffset,
}

impl FromRef<AppState> for ReportEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            ledger: state.ledger.clone(),
            local_offset: state.local_offset,
        }
    }
}

/// An optional `YYYY-MM` month filter.
#[derive(Debug, Default, Deserialize)]
pub struct MonthFilter {
    /// The month to report on.
    #[serde(rename = "mes")]
    pub month: Option<String>,
}

/// All-time totals across the whole ledger.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct OverviewReport {
    /// The sum of every income amount.
    #[serde(rename = "total_rendimentos")]
    pub total_income: f64,

    /// The sum of every expense amount.
    #[serde(rename = "total_gastos")]
    pub total_expense: f64,

    /// Income minus expenses.
    #[serde(rename = "saldo_liquido")]
    pub net_balance: f64,

    /// The current savings balance.
    #[serde(rename = "saldo_poupanca")]
    pub savings_balance: f64,
}

/// The summary for one month, defaulting to the current month in the
/// configured timezone.
///
/// # Errors
/// Returns [Error::InvalidMonthKey] if the month filter is malformed.
pub async fn get_summary(
    State(state): State<ReportEndpointState>,
    Query(filter): Query<MonthFilter>,
) -> Result<Response, Error> {
    let month = match filter.month.as_deref() {
        Some(key) => month::parse_key(key)?,
        None => OffsetDateTime::now_utc().to_offset(state.local_offset).date(),
    };

    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let summary = calculator::monthly_summary(ledger.incomes(), ledger.expenses(), month);

    Ok(Json(summary).into_response())
}

/// Summaries for every month that has at least one record, in ascending
/// month order.
pub async fn get_monthly_summaries(
    State(state): State<ReportEndpointState>,
) -> Result<Response, Error> {
    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let summaries: Vec<_> = calculator::distinct_months(ledger.incomes(), ledger.expenses())
        .into_iter()
        .map(|month| calculator::monthly_summary(ledger.incomes(), ledger.expenses(), month))
        .collect();

    Ok(Json(summaries).into_response())
}

/// All-time totals plus the savings balance.
pub async fn get_overview(State(state): State<ReportEndpointState>) -> Result<Response, Error> {
    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let total_income: f64 = ledger.incomes().iter().map(|entry| entry.amount).sum();
    let total_expense: f64 = ledger.expenses().iter().map(|entry| entry.amount).sum();

    Ok(Json(OverviewReport {
        total_income,
        total_expense,
        net_balance: total_income - total_expense,
        savings_balance: ledger.savings().balance,
    })
    .into_response())
}

/// Expense totals grouped by category, optionally limited to one month.
///
/// # Errors
/// Returns [Error::InvalidMonthKey] if the month filter is malformed.
pub async fn get_expenses_by_category(
    State(state): State<ReportEndpointState>,
    Query(filter): Query<MonthFilter>,
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
        .cloned()
        .collect();
    let totals: HashMap<String, f64> = calculator::expenses_by_category(&expenses);

    Ok(Json(totals).into_response())
}

/// Income totals grouped by source, optionally limited to one month.
///
/// # Errors
/// Returns [Error::InvalidMonthKey] if the month filter is malformed.
pub async fn get_income_by_source(
    State(state): State<ReportEndpointState>,
    Query(filter): Query<MonthFilter>,
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
        .cloned()
        .collect();
    let totals: HashMap<String, f64> = calculator::income_by_source(&incomes);

    Ok(Json(totals).into_response())
}

#[cfg(test)]
mod report_endpoint_tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use tempfile::{TempDir, tempdir};
    use time::{OffsetDateTime, UtcOffset, macros::date};

    use crate::{calculator::MonthlySummary, endpoints, ledger::LedgerStore};

    use super::{
        OverviewReport, ReportEndpointState, get_expenses_by_category, get_income_by_source,
        get_monthly_summaries, get_overview, get_summary,
    };

    fn new_test_server() -> (TestServer, Arc<Mutex<LedgerStore>>, TempDir) {
        let directory = tempdir().expect("could not create temp directory");
        let ledger = Arc::new(Mutex::new(LedgerStore::open(
            directory.path().join("ledger.json"),
            UtcOffset::UTC,
        )));
        let state = ReportEndpointState {
            ledger: ledger.clone(),
            local_offset: UtcOffset::UTC,
        };

        let app = Router::new()
            .route(endpoints::SUMMARY, get(get_summary))
            .route(endpoints::MONTHLY_SUMMARIES, get(get_monthly_summaries))
            .route(endpoints::OVERVIEW, get(get_overview))
            .route(
                endpoints::EXPENSES_BY_CATEGORY,
                get(get_expenses_by_category),
            )
            .route(endpoints::INCOMES_BY_SOURCE, get(get_income_by_source))
            .with_state(state);

        let server = TestServer::try_new(app).expect("could not create test server");

        (server, ledger, directory)
    }

    #[tokio::test]
    async fn summarises_the_requested_month() {
        let (server, ledger, _directory) = new_test_server();
        {
            let mut ledger = ledger.lock().expect("could not lock ledger");
            ledger
                .add_income(
                    "Salário".to_owned(),
                    3_000.0,
                    date!(2024 - 05 - 05),
                    String::new(),
                )
                .expect("could not seed income");
            ledger
                .add_expense(
                    "Moradia".to_owned(),
                    1_200.0,
                    date!(2024 - 05 - 10),
                    String::new(),
                )
                .expect("could not seed expense");
            ledger
                .add_expense(
                    "Lazer".to_owned(),
                    300.0,
                    date!(2024 - 06 - 02),
                    String::new(),
                )
                .expect("could not seed expense");
        }

        let response = server
            .get(endpoints::SUMMARY)
            .add_query_param("mes", "2024-05")
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<MonthlySummary>(),
            MonthlySummary {
                month: date!(2024 - 05 - 01),
                total_income: 3_000.0,
                total_expense: 1_200.0,
                net_balance: 1_800.0,
            }
        );
    }

    #[tokio::test]
    async fn the_summary_defaults_to_the_current_month() {
        let (server, ledger, _directory) = new_test_server();
        let today = OffsetDateTime::now_utc().date();
        ledger
            .lock()
            .expect("could not lock ledger")
            .add_income("Freela".to_owned(), 450.0, today, String::new())
            .expect("could not seed income");

        let summary = server
            .get(endpoints::SUMMARY)
            .await
            .json::<MonthlySummary>();

        assert_eq!(summary.total_income, 450.0);
    }

    #[tokio::test]
    async fn rejects_malformed_month_filters() {
        let (server, _ledger, _directory) = new_test_server();

        let response = server
            .get(endpoints::SUMMARY)
            .add_query_param("mes", "maio de 2024")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lists_summaries_for_every_recorded_month_in_order() {
        let (server, ledger, _directory) = new_test_server();
        {
            let mut ledger = ledger.lock().expect("could not lock ledger");
            ledger
                .add_expense(
                    "Lazer".to_owned(),
                    300.0,
                    date!(2024 - 06 - 02),
                    String::new(),
                )
                .expect("could not seed expense");
            ledger
                .add_income(
                    "Salário".to_owned(),
                    3_000.0,
                    date!(2024 - 05 - 05),
                    String::new(),
                )
                .expect("could not seed income");
        }

        let summaries = server
            .get(endpoints::MONTHLY_SUMMARIES)
            .await
            .json::<Vec<MonthlySummary>>();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].month, date!(2024 - 05 - 01));
        assert_eq!(summaries[1].month, date!(2024 - 06 - 01));
    }

    #[tokio::test]
    async fn the_overview_totals_the_whole_ledger() {
        let (server, ledger, _directory) = new_test_server();
        {
            let mut ledger = ledger.lock().expect("could not lock ledger");
            ledger
                .add_income(
                    "Salário".to_owned(),
                    3_000.0,
                    date!(2024 - 05 - 05),
                    String::new(),
                )
                .expect("could not seed income");
            ledger
                .add_income(
                    "Freela".to_owned(),
                    500.0,
                    date!(2024 - 06 - 20),
                    String::new(),
                )
                .expect("could not seed income");
            ledger
                .add_expense(
                    "Moradia".to_owned(),
                    1_200.0,
                    date!(2024 - 05 - 10),
                    String::new(),
                )
                .expect("could not seed expense");
            ledger
                .record_savings_movement(
                    crate::ledger::MovementKind::Deposit,
                    1_000.0,
                    String::new(),
                )
                .expect("could not seed savings");
        }

        let response = server.get(endpoints::OVERVIEW).await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<OverviewReport>(),
            OverviewReport {
                total_income: 3_500.0,
                total_expense: 1_200.0,
                net_balance: 2_300.0,
                savings_balance: 1_000.0,
            }
        );
    }

    #[tokio::test]
    async fn groups_expenses_by_category_within_a_month() {
        let (server, ledger, _directory) = new_test_server();
        {
            let mut ledger = ledger.lock().expect("could not lock ledger");
            ledger
                .add_expense(
                    "Moradia".to_owned(),
                    1_200.0,
                    date!(2024 - 05 - 10),
                    String::new(),
                )
                .expect("could not seed expense");
            ledger
                .add_expense(
                    "Moradia".to_owned(),
                    150.0,
                    date!(2024 - 05 - 20),
                    String::new(),
                )
                .expect("could not seed expense");
            ledger
                .add_expense(
                    "Moradia".to_owned(),
                    1_200.0,
                    date!(2024 - 06 - 10),
                    String::new(),
                )
                .expect("could not seed expense");
        }

        let totals = server
            .get(endpoints::EXPENSES_BY_CATEGORY)
            .add_query_param("mes", "2024-05")
            .await
            .json::<HashMap<String, f64>>();

        assert_eq!(totals.len(), 1);
        assert_eq!(totals["Moradia"], 1_350.0);
    }

    #[tokio::test]
    async fn groups_income_by_source() {
        let (server, ledger, _directory) = new_test_server();
        {
            let mut ledger = ledger.lock().expect("could not lock ledger");
            ledger
                .add_income(
                    "Salário".to_owned(),
                    3_000.0,
                    date!(2024 - 05 - 05),
                    String::new(),
                )
                .expect("could not seed income");
            ledger
                .add_income(
                    "Freela".to_owned(),
                    500.0,
                    date!(2024 - 05 - 20),
                    String::new(),
                )
                .expect("could not seed income");
        }

        let totals = server
            .get(endpoints::INCOMES_BY_SOURCE)
            .await
            .json::<HashMap<String, f64>>();

        assert_eq!(totals.len(), 2);
        assert_eq!(totals["Salário"], 3_000.0);
        assert_eq!(totals["Freela"], 500.0);
    }
}
