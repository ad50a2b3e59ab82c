//! Implements the JSON file backed ledger store.

use std::{fs, io, path::PathBuf};

use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    ledger::document::{
        ExpenseEntry, Goal, IncomeEntry, LedgerDocument, MovementKind, RecordId, Savings,
        SavingsMovement,
    },
};

/// Persists the ledger document to a JSON file.
///
/// The whole document lives in memory and every mutation rewrites the
/// whole file, so the file on disk always holds a complete document.
/// Records keep their insertion order.
#[derive(Debug)]
pub struct LedgerStore {
    path: PathBuf,
    document: LedgerDocument,
    local_offset: UtcOffset,
}

impl LedgerStore {
    /// Open the ledger file at `path`.
    ///
    /// A missing file starts an empty document. An unreadable or
    /// undecodable file also starts an empty document so the app always
    /// comes up; the broken file is left untouched until a mutation
    /// succeeds. `local_offset` is used to stamp the local date on
    /// movements and goals.
    pub fn open(path: impl Into<PathBuf>, local_offset: UtcOffset) -> Self {
        let path = path.into();

        let document = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(document) => document,
                Err(error) => {
                    tracing::warn!(
                        "could not decode the ledger file {}, starting empty: {error}",
                        path.display()
                    );
                    LedgerDocument::default()
                }
            },
            Err(error) if error.kind() == io::ErrorKind::NotFound => LedgerDocument::default(),
            Err(error) => {
                tracing::warn!(
                    "could not read the ledger file {}, starting empty: {error}",
                    path.display()
                );
                LedgerDocument::default()
            }
        };

        Self {
            path,
            document,
            local_offset,
        }
    }

    /// Rewrite the backing file from the in-memory document.
    ///
    /// # Errors
    /// Returns [Error::Save] if the document could not be encoded or
    /// the file could not be written.
    pub fn save(&self) -> Result<(), Error> {
        let text = serde_json::to_string_pretty(&self.document)
            .map_err(|error| Error::Save(error.to_string()))?;

        fs::write(&self.path, text).map_err(|error| Error::Save(error.to_string()))
    }

    /// The whole in-memory document.
    pub fn document(&self) -> &LedgerDocument {
        &self.document
    }

    /// The income records, in insertion order.
    pub fn incomes(&self) -> &[IncomeEntry] {
        &self.document.incomes
    }

    /// The expense records, in insertion order.
    pub fn expenses(&self) -> &[ExpenseEntry] {
        &self.document.expenses
    }

    /// The savings account state.
    pub fn savings(&self) -> &Savings {
        &self.document.savings
    }

    /// The goals, in insertion order.
    pub fn goals(&self) -> &[Goal] {
        &self.document.goals
    }

    /// Append an income record and persist the document.
    ///
    /// # Errors
    /// Returns [Error::Save] if the document could not be written.
    pub fn add_income(
        &mut self,
        source: String,
        amount: f64,
        date: Date,
        description: String,
    ) -> Result<IncomeEntry, Error> {
        let entry = IncomeEntry {
            id: next_id(self.document.incomes.iter().map(|entry| entry.id)),
            source,
            amount,
            date,
            description,
            created_at: OffsetDateTime::now_utc(),
        };

        self.document.incomes.push(entry.clone());
        self.save()?;

        Ok(entry)
    }

    /// Append an expense record and persist the document.
    ///
    /// # Errors
    /// Returns [Error::Save] if the document could not be written.
    pub fn add_expense(
        &mut self,
        category: String,
        amount: f64,
        date: Date,
        description: String,
    ) -> Result<ExpenseEntry, Error> {
        let entry = ExpenseEntry {
            id: next_id(self.document.expenses.iter().map(|entry| entry.id)),
            category,
            amount,
            date,
            description,
            created_at: OffsetDateTime::now_utc(),
        };

        self.document.expenses.push(entry.clone());
        self.save()?;

        Ok(entry)
    }

    /// Remove the income record with `id` and persist the document.
    ///
    /// Removing an id that does not exist is not an error; the document
    /// is simply rewritten unchanged.
    ///
    /// # Errors
    /// Returns [Error::Save] if the document could not be written.
    pub fn delete_income(&mut self, id: RecordId) -> Result<(), Error> {
        self.document.incomes.retain(|entry| entry.id != id);
        self.save()
    }

    /// Remove the expense record with `id` and persist the document.
    ///
    /// Removing an id that does not exist is not an error; the document
    /// is simply rewritten unchanged.
    ///
    /// # Errors
    /// Returns [Error::Save] if the document could not be written.
    pub fn delete_expense(&mut self, id: RecordId) -> Result<(), Error> {
        self.document.expenses.retain(|entry| entry.id != id);
        self.save()
    }

    /// Apply a deposit or withdrawal to the savings balance, record it
    /// in the history and persist the document.
    ///
    /// The store does not check the balance: a withdrawal larger than
    /// the balance leaves it negative. Callers enforce their own rules
    /// before getting here.
    ///
    /// # Errors
    /// Returns [Error::Save] if the document could not be written.
    pub fn record_savings_movement(
        &mut self,
        kind: MovementKind,
        amount: f64,
        description: String,
    ) -> Result<SavingsMovement, Error> {
        let now = OffsetDateTime::now_utc();
        let date = now.to_offset(self.local_offset).date();

        let savings = &mut self.document.savings;
        let balance_before = savings.balance;
        savings.balance = match kind {
            MovementKind::Deposit => balance_before + amount,
            MovementKind::Withdrawal => balance_before - amount,
        };

        let movement = SavingsMovement {
            id: next_id(savings.movements.iter().map(|movement| movement.id)),
            kind,
            amount,
            balance_before,
            balance_after: savings.balance,
            date,
            description,
            created_at: now,
        };

        savings.movements.push(movement.clone());
        self.save()?;

        Ok(movement)
    }

    /// Set the annual savings rate (percent) and persist the document.
    ///
    /// # Errors
    /// Returns [Error::Save] if the document could not be written.
    pub fn set_annual_rate(&mut self, rate: f64) -> Result<(), Error> {
        self.document.savings.annual_rate = rate;
        self.save()
    }

    /// Append a goal and persist the document.
    ///
    /// New goals are created active and stamped with the local date.
    ///
    /// # Errors
    /// Returns [Error::Save] if the document could not be written.
    pub fn add_goal(
        &mut self,
        name: String,
        target_amount: f64,
        term_months: u32,
        description: String,
    ) -> Result<Goal, Error> {
        let goal = Goal {
            id: next_id(self.document.goals.iter().map(|goal| goal.id)),
            name,
            target_amount,
            term_months,
            description,
            created_on: OffsetDateTime::now_utc().to_offset(self.local_offset).date(),
            active: true,
        };

        self.document.goals.push(goal.clone());
        self.save()?;

        Ok(goal)
    }

    /// Replace the whole in-memory document and persist it.
    ///
    /// # Errors
    /// Returns [Error::Save] if the document could not be written.
    pub fn replace_document(&mut self, document: LedgerDocument) -> Result<(), Error> {
        self.document = document;
        self.save()
    }
}

/// The id for a new record: one above the highest id still in the
/// collection.
///
/// Unlike numbering records by their position, this never hands out an
/// id that another surviving record already holds after a deletion.
fn next_id(ids: impl Iterator<Item = RecordId>) -> RecordId {
    ids.max().unwrap_or(0) + 1
}
