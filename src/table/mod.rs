//! Process-wide relation table state and its durable mirror.

pub mod mirror;

pub use mirror::{write_csv_atomic, CsvMirror, TABLE_COLUMNS};

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{RelinkError, Result};
use crate::record::RelationTable;

/// Owner of the current relation table.
///
/// A single lock covers every read, mutation and mirror write, so callers
/// always observe a fully committed table. Mutations are applied to a copy
/// that only replaces the committed table once the mirror write succeeded.
pub struct TableStore {
    mirror: CsvMirror,
    state: Mutex<Option<RelationTable>>,
}

impl TableStore {
    /// Load the mirror if one exists, otherwise start with no table.
    pub fn init(mirror: CsvMirror) -> Result<Self> {
        let table = mirror.load()?;
        match &table {
            Some(table) => log::info!(
                "Restored {} records from {}",
                table.len(),
                mirror.path().display()
            ),
            None => log::info!("No table mirror at {}, starting empty", mirror.path().display()),
        }

        Ok(Self {
            mirror,
            state: Mutex::new(table),
        })
    }

    /// Whether a table has been uploaded or restored
    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    /// Run `f` against the committed table while holding the lock.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&RelationTable) -> Result<T>,
    {
        let guard = self.lock();
        let table = guard.as_ref().ok_or(RelinkError::NoData)?;
        f(table)
    }

    /// Copy of the committed table
    pub fn snapshot(&self) -> Result<RelationTable> {
        self.read(|table| Ok(table.clone()))
    }

    /// Replace the whole table (new upload). The mirror is written first.
    pub fn replace(&self, table: RelationTable) -> Result<()> {
        let mut guard = self.lock();
        self.mirror.save(&table)?;
        log::info!(
            "Persisted {} records to {}",
            table.len(),
            self.mirror.path().display()
        );
        *guard = Some(table);
        Ok(())
    }

    /// Mutate the table in place and persist it.
    ///
    /// If `f` or the mirror write fails, the committed table is unchanged.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut RelationTable) -> Result<T>,
    {
        let mut guard = self.lock();
        let mut working = guard.as_ref().ok_or(RelinkError::NoData)?.clone();
        let out = f(&mut working)?;
        self.mirror.save(&working)?;
        log::debug!("Persisted updated table to {}", self.mirror.path().display());
        *guard = Some(working);
        Ok(out)
    }

    fn lock(&self) -> MutexGuard<'_, Option<RelationTable>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
