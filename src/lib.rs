//! Cofrinho is a web app for tracking personal finances: income,
//! expenses, a savings account and savings goals.
//!
//! This library provides a JSON REST API over a single-file ledger.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod app_state;
pub mod calculator;
mod endpoints;
mod expense;
mod export;
mod goal;
mod income;
pub mod ledger;
mod month;
mod projection;
mod report;
mod routing;
mod savings;

pub use app_state::AppState;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The ledger document could not be written to disk.
    ///
    /// The in-memory ledger may be ahead of the file when this happens,
    /// so the error string should be logged and the disk checked.
    #[error("could not save the ledger: {0}")]
    Save(String),

    /// The uploaded backup could not be decoded as a ledger document.
    #[error("could not decode the backup: {0}")]
    InvalidBackup(String),

    /// A month parameter was not a `YYYY-MM` key.
    #[error("\"{0}\" is not a valid YYYY-MM month")]
    InvalidMonthKey(String),

    /// The request carried a value the endpoint does not accept, such
    /// as a blank label or a negative amount.
    #[error("{0}")]
    InvalidInput(String),

    /// The configured timezone is not a canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// A CSV or backup download could not be rendered.
    #[error("could not render the export: {0}")]
    Export(String),

    /// Could not acquire the ledger lock.
    #[error("could not acquire the ledger lock")]
    LedgerLock,
}

/// The JSON body sent with error responses.
#[derive(Serialize)]
struct ErrorBody {
    erro: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidBackup(_) | Error::InvalidMonthKey(_) | Error::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (
            status,
            Json(ErrorBody {
                erro: self.to_string(),
            }),
        )
            .into_response()
    }
}
