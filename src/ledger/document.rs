//! Defines the persisted ledger document and its record types.
//!
//! The on-disk format is a single JSON object whose keys are the
//! Portuguese names used by the backups this app exchanges
//! (`rendimentos`, `gastos`, `poupanca`, `objetivos`). Rust code uses
//! English names and maps them with serde renames so the wire format
//! stays byte-compatible with existing documents.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// Identifies a record within one of the ledger's collections.
///
/// Ids are only unique within their own collection.
pub type RecordId = i64;

/// The annual savings rate (percent) assumed when a document does not
/// carry one.
pub const DEFAULT_ANNUAL_RATE: f64 = 13.75;

mod timestamp_format {
    //! Specifies how to serialize the `timestamp` field on ledger
    //! records.
    //!
    //! Timestamps are written as RFC 3339 strings in UTC. Older
    //! documents carry offset-less ISO 8601 strings, so the
    //! deserializer falls back to parsing those and assumes UTC.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, PrimitiveDateTime,
        format_description::well_known::{Iso8601, Rfc3339},
    };

    pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = datetime.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;

        if let Ok(datetime) = OffsetDateTime::parse(&text, &Rfc3339) {
            return Ok(datetime);
        }

        PrimitiveDateTime::parse(&text, &Iso8601::DEFAULT)
            .map(PrimitiveDateTime::assume_utc)
            .map_err(serde::de::Error::custom)
    }
}

/// The whole persisted state of the tracker.
///
/// Missing top-level keys fall back to their defaults when decoding, so
/// documents written before a section existed (for example, ones
/// without `objetivos`) load cleanly and gain the missing section on
/// the next save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerDocument {
    /// Income records, in insertion order.
    #[serde(rename = "rendimentos", default)]
    pub incomes: Vec<IncomeEntry>,

    /// Expense records, in insertion order.
    #[serde(rename = "gastos", default)]
    pub expenses: Vec<ExpenseEntry>,

    /// The savings account balance, history and rate.
    #[serde(rename = "poupanca", default)]
    pub savings: Savings,

    /// Savings goals, in insertion order.
    #[serde(rename = "objetivos", default)]
    pub goals: Vec<Goal>,
}

/// Money received from a source on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeEntry {
    /// Identifies this record among the incomes.
    pub id: RecordId,

    /// Where the money came from, e.g. a salary or freelance work.
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

    /// When the record was created.
    #[serde(
        rename = "timestamp",
        serialize_with = "timestamp_format::serialize",
        deserialize_with = "timestamp_format::deserialize"
    )]
    pub created_at: OffsetDateTime,
}

/// Money spent on a category on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    /// Identifies this record among the expenses.
    pub id: RecordId,

    /// The spending category. Stored as free text: the category catalog
    /// is advisory, and restored documents may contain labels outside
    /// it.
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

    /// When the record was created.
    #[serde(
        rename = "timestamp",
        serialize_with = "timestamp_format::serialize",
        deserialize_with = "timestamp_format::deserialize"
    )]
    pub created_at: OffsetDateTime,
}

/// The savings account: its balance, movement history and assumed
/// annual rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Savings {
    /// The current balance.
    #[serde(rename = "saldo_atual", default)]
    pub balance: f64,

    /// Every deposit and withdrawal, in insertion order.
    #[serde(rename = "historico", default)]
    pub movements: Vec<SavingsMovement>,

    /// The annual rate (percent) used for growth projections.
    #[serde(rename = "taxa_cdi", default = "default_annual_rate")]
    pub annual_rate: f64,
}

impl Default for Savings {
    fn default() -> Self {
        Self {
            balance: 0.0,
            movements: Vec::new(),
            annual_rate: DEFAULT_ANNUAL_RATE,
        }
    }
}

fn default_annual_rate() -> f64 {
    DEFAULT_ANNUAL_RATE
}

/// A single deposit into or withdrawal from the savings account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsMovement {
    /// Identifies this record among the movements.
    pub id: RecordId,

    /// Whether the movement added to or took from the balance.
    #[serde(rename = "operacao")]
    pub kind: MovementKind,

    /// The amount moved, always positive.
    #[serde(rename = "valor")]
    pub amount: f64,

    /// The balance before this movement was applied.
    #[serde(rename = "saldo_anterior")]
    pub balance_before: f64,

    /// The balance after this movement was applied.
    ///
    /// The `saldo` alias accepts documents written before the balance
    /// key was renamed.
    #[serde(rename = "saldo_atual", alias = "saldo")]
    pub balance_after: f64,

    /// The local day the movement happened.
    #[serde(rename = "data")]
    pub date: Date,

    /// Free-form note.
    #[serde(rename = "descricao", default)]
    pub description: String,

    /// When the record was created.
    #[serde(
        rename = "timestamp",
        serialize_with = "timestamp_format::serialize",
        deserialize_with = "timestamp_format::deserialize"
    )]
    pub created_at: OffsetDateTime,
}

/// The direction of a savings movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementKind {
    /// Money moved into the savings account.
    #[serde(rename = "deposito")]
    Deposit,

    /// Money taken out of the savings account.
    #[serde(rename = "saque")]
    Withdrawal,
}

/// A savings target to reach within a number of months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Identifies this record among the goals.
    pub id: RecordId,

    /// What the goal is for.
    #[serde(rename = "nome")]
    pub name: String,

    /// The amount to save up.
    #[serde(rename = "valor_meta")]
    pub target_amount: f64,

    /// How many months the goal gives itself.
    #[serde(rename = "prazo_meses")]
    pub term_months: u32,

    /// Free-form note.
    #[serde(rename = "descricao", default)]
    pub description: String,

    /// The local day the goal was created.
    #[serde(rename = "data_criacao")]
    pub created_on: Date,

    /// Whether the goal is still being pursued.
    #[serde(rename = "ativo")]
    pub active: bool,
}
