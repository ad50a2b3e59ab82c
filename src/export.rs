//! The export endpoints: CSV downloads of each record list, the backup
//! document and restore.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    body::Bytes,
    extract::{FromRef, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    ledger::{LedgerDocument, LedgerStore},
};

/// The timestamp woven into backup file names.
const BACKUP_STAMP: &[BorrowedFormatItem] =
    format_description!("[year][month][day]_[hour][minute][second]");

/// The state needed to serve the export endpoints.
#[derive(Debug, Clone)]
pub struct ExportEndpointState {
    /// The shared ledger store.
    pub ledger: Arc<Mutex<LedgerStore>>,

    /// The timezone offset used to stamp backup file names.
    pub local_offset: UtcOffset,
}

impl FromRef<AppState> for ExportEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            ledger: state.ledger.clone(),
            local_offset: state.local_offset,
        }
    }
}

/// How many records of each kind a restored document holds.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct RestoreReport {
    /// The number of income records restored.
    #[serde(rename = "rendimentos")]
    pub income_count: usize,

    /// The number of expense records restored.
    #[serde(rename = "gastos")]
    pub expense_count: usize,

    /// The number of savings movements restored.
    #[serde(rename = "movimentacoes")]
    pub movement_count: usize,

    /// The number of goals restored.
    #[serde(rename = "objetivos")]
    pub goal_count: usize,
}

/// Render `records` as CSV with a header row taken from the serialized
/// field names.
///
/// The header row is only written once there is at least one record, so
/// an empty list renders as an empty string.
fn render_csv<R: Serialize>(records: &[R]) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for record in records {
        writer
            .serialize(record)
            .map_err(|error| Error::Export(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::Export(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::Export(error.to_string()))
}

fn csv_attachment(file_name: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Download the income records as `rendimentos.csv`.
pub async fn get_incomes_csv(State(state): State<ExportEndpointState>) -> Result<Response, Error> {
    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let body = render_csv(ledger.incomes())?;

    Ok(csv_attachment("rendimentos.csv", body))
}

/// Download the expense records as `gastos.csv`.
pub async fn get_expenses_csv(
    State(state): State<ExportEndpointState>,
) -> Result<Response, Error> {
    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let body = render_csv(ledger.expenses())?;

    Ok(csv_attachment("gastos.csv", body))
}

/// Download the savings movements as `historico_poupanca.csv`.
pub async fn get_movements_csv(
    State(state): State<ExportEndpointState>,
) -> Result<Response, Error> {
    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let body = render_csv(&ledger.savings().movements)?;

    Ok(csv_attachment("historico_poupanca.csv", body))
}

/// Download the whole ledger document as a timestamped JSON attachment.
///
/// The body is byte-for-byte what the store writes to disk, so a saved
/// backup can be dropped in place of the data file or posted to the
/// restore endpoint.
pub async fn get_backup(State(state): State<ExportEndpointState>) -> Result<Response, Error> {
    let ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    let body = serde_json::to_string_pretty(ledger.document())
        .map_err(|error| Error::Export(error.to_string()))?;
    let stamp = OffsetDateTime::now_utc()
        .to_offset(state.local_offset)
        .format(BACKUP_STAMP)
        .map_err(|error| Error::Export(error.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"backup_financas_{stamp}.json\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// Replace the whole ledger with a previously downloaded backup and
/// respond with the record counts.
///
/// # Errors
/// Returns [Error::InvalidBackup] if the body does not decode as a
/// ledger document. A failed decode leaves the current ledger
/// untouched.
pub async fn restore_backup(
    State(state): State<ExportEndpointState>,
    body: Bytes,
) -> Result<Response, Error> {
    let document: LedgerDocument =
        serde_json::from_slice(&body).map_err(|error| Error::InvalidBackup(error.to_string()))?;

    let mut ledger = state
        .ledger
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire ledger lock: {error}"))
        .map_err(|_| Error::LedgerLock)?;

    ledger.replace_document(document)?;

    Ok(Json(RestoreReport {
        income_count: ledger.incomes().len(),
        expense_count: ledger.expenses().len(),
        movement_count: ledger.savings().movements.len(),
        goal_count: ledger.goals().len(),
    })
    .into_response())
}

#[cfg(test)]
mod export_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router,
        http::StatusCode,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use serde_json::json;
    use tempfile::{TempDir, tempdir};
    use time::{UtcOffset, macros::date};

    use crate::{
        endpoints,
        ledger::{LedgerDocument, LedgerStore, MovementKind},
    };

    use super::{
        ExportEndpointState, RestoreReport, get_backup, get_expenses_csv, get_incomes_csv,
        get_movements_csv, restore_backup,
    };

    fn new_test_server() -> (TestServer, Arc<Mutex<LedgerStore>>, TempDir) {
        let directory = tempdir().expect("could not create temp directory");
        let ledger = Arc::new(Mutex::new(LedgerStore::open(
            directory.path().join("ledger.json"),
            UtcOffset::UTC,
        )));
        let state = ExportEndpointState {
            ledger: ledger.clone(),
            local_offset: UtcOffset::UTC,
        };

        let app = Router::new()
            .route(endpoints::INCOMES_CSV, get(get_incomes_csv))
            .route(endpoints::EXPENSES_CSV, get(get_expenses_csv))
            .route(endpoints::SAVINGS_MOVEMENTS_CSV, get(get_movements_csv))
            .route(endpoints::BACKUP, get(get_backup))
            .route(endpoints::RESTORE, post(restore_backup))
            .with_state(state);

        let server = TestServer::try_new(app).expect("could not create test server");

        (server, ledger, directory)
    }

    #[tokio::test]
    async fn income_csv_uses_the_document_field_names() {
        let (server, ledger, _directory) = new_test_server();
        ledger
            .lock()
            .expect("could not lock ledger")
            .add_income(
                "Salário".to_owned(),
                3_000.0,
                date!(2024 - 05 - 05),
                String::new(),
            )
            .expect("could not seed income");

        let response = server.get(endpoints::INCOMES_CSV).await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "text/csv; charset=utf-8");
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=\"rendimentos.csv\""
        );
        let body = response.text();
        let mut lines = body.lines();
        assert_eq!(
            lines.next(),
            Some("id,fonte,valor,data,descricao,timestamp")
        );
        assert!(lines.next().is_some_and(|line| line.contains("Salário")));
    }

    #[tokio::test]
    async fn movement_csv_includes_the_balance_snapshots() {
        let (server, ledger, _directory) = new_test_server();
        ledger
            .lock()
            .expect("could not lock ledger")
            .record_savings_movement(MovementKind::Deposit, 1_000.0, "Reserva".to_owned())
            .expect("could not seed savings");

        let response = server.get(endpoints::SAVINGS_MOVEMENTS_CSV).await;

        response.assert_status_ok();
        let body = response.text();
        assert!(body.starts_with(
            "id,operacao,valor,saldo_anterior,saldo_atual,data,descricao,timestamp"
        ));
        assert!(body.contains("deposito"));
    }

    #[tokio::test]
    async fn exporting_an_empty_list_yields_an_empty_file() {
        let (server, _ledger, _directory) = new_test_server();

        let response = server.get(endpoints::EXPENSES_CSV).await;

        response.assert_status_ok();
        assert_eq!(response.text(), "");
    }

    #[tokio::test]
    async fn the_backup_is_a_loadable_ledger_document() {
        let (server, ledger, _directory) = new_test_server();
        ledger
            .lock()
            .expect("could not lock ledger")
            .add_income(
                "Salário".to_owned(),
                3_000.0,
                date!(2024 - 05 - 05),
                String::new(),
            )
            .expect("could not seed income");

        let response = server.get(endpoints::BACKUP).await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "application/json");
        let disposition = response.header("content-disposition");
        let disposition = disposition.to_str().expect("header is not valid text");
        assert!(disposition.contains("backup_financas_"));
        assert!(disposition.ends_with(".json\""));

        let document: LedgerDocument =
            serde_json::from_str(&response.text()).expect("backup does not decode");
        assert_eq!(document.incomes.len(), 1);
    }

    #[tokio::test]
    async fn restore_replaces_the_ledger_and_reports_counts() {
        let (server, ledger, _directory) = new_test_server();
        ledger
            .lock()
            .expect("could not lock ledger")
            .add_income(
                "Antigo".to_owned(),
                1.0,
                date!(2023 - 01 - 01),
                String::new(),
            )
            .expect("could not seed income");

        let response = server
            .post(endpoints::RESTORE)
            .json(&json!({
                "rendimentos": [{
                    "id": 7,
                    "fonte": "Salário",
                    "valor": 3000.0,
                    "data": "2024-05-05",
                    "descricao": "",
                    "timestamp": "2024-05-05T12:00:00Z"
                }],
                "gastos": [],
                "poupanca": { "saldo_atual": 250.0, "historico": [], "taxa_cdi": 13.75 },
                "objetivos": []
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<RestoreReport>(),
            RestoreReport {
                income_count: 1,
                expense_count: 0,
                movement_count: 0,
                goal_count: 0,
            }
        );

        let ledger = ledger.lock().expect("could not lock ledger");
        assert_eq!(ledger.incomes().len(), 1);
        assert_eq!(ledger.incomes()[0].source, "Salário");
        assert_eq!(ledger.savings().balance, 250.0);
    }

    #[tokio::test]
    async fn restore_rejects_bodies_that_are_not_a_document() {
        let (server, ledger, _directory) = new_test_server();
        ledger
            .lock()
            .expect("could not lock ledger")
            .add_income(
                "Salário".to_owned(),
                3_000.0,
                date!(2024 - 05 - 05),
                String::new(),
            )
            .expect("could not seed income");

        let response = server.post(endpoints::RESTORE).text("not a backup").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let ledger = ledger.lock().expect("could not lock ledger");
        assert_eq!(ledger.incomes().len(), 1);
        assert_eq!(ledger.incomes()[0].source, "Salário");
    }
}
