//! The ledger: the persisted JSON document model and its file backed
//! store.

mod document;
mod store;

pub use document::{
    DEFAULT_ANNUAL_RATE, ExpenseEntry, Goal, IncomeEntry, LedgerDocument, MovementKind, RecordId,
    Savings, SavingsMovement,
};
pub use store::LedgerStore;
