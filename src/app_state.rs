//! Defines the top-level state shared between all routes.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone, timezones};

use crate::{Error, ledger::LedgerStore};

/// The state shared between all routes.
///
/// Cloning is cheap: the ledger store sits behind an [Arc].
#[derive(Debug, Clone)]
pub struct AppState {
    /// The ledger store, guarded for concurrent handlers.
    pub ledger: Arc<Mutex<LedgerStore>>,

    /// The UTC offset used to resolve the local "today".
    pub local_offset: UtcOffset,
}

impl AppState {
    /// Open the ledger file at `data_path`, using `timezone` (an IANA
    /// name such as "America/Sao_Paulo") to resolve local dates.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezone] if `timezone` is not a known
    /// IANA timezone name.
    pub fn new(data_path: impl Into<PathBuf>, timezone: &str) -> Result<Self, Error> {
        let local_offset = local_offset(timezone)?;
        let ledger = LedgerStore::open(data_path, local_offset);

        Ok(Self {
            ledger: Arc::new(Mutex::new(ledger)),
            local_offset,
        })
    }
}

/// The current UTC offset of the IANA timezone named `timezone`.
fn local_offset(timezone: &str) -> Result<UtcOffset, Error> {
    let timezone = timezones::get_by_name(timezone)
        .ok_or_else(|| Error::InvalidTimezone(timezone.to_owned()))?;

    Ok(timezone.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}
