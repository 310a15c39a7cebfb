//! Identifier → record resolution with an explicit duplicate-id rule.

use std::collections::HashMap;

use crate::error::{RelinkError, Result};
use crate::record::{Record, RelationTable};

/// Lookup from record id to the record that owns it.
///
/// Ids are not required to be unique. The constructor picks which duplicate
/// answers: [`NameIndex::last_wins`] or [`NameIndex::first_wins`].
#[derive(Debug)]
pub struct NameIndex<'a> {
    entries: HashMap<&'a str, &'a Record>,
}

impl<'a> NameIndex<'a> {
    /// Later records shadow earlier ones with the same id.
    pub fn last_wins(table: &'a RelationTable) -> Self {
        let mut entries = HashMap::with_capacity(table.len());
        for record in table {
            entries.insert(record.id.as_str(), record);
        }
        Self { entries }
    }

    /// The first record with a given id answers; later duplicates are ignored.
    pub fn first_wins(table: &'a RelationTable) -> Self {
        let mut entries = HashMap::with_capacity(table.len());
        for record in table {
            entries.entry(record.id.as_str()).or_insert(record);
        }
        Self { entries }
    }

    pub fn record(&self, id: &str) -> Option<&'a Record> {
        self.entries.get(id).copied()
    }

    /// Name (`value`) recorded for `id`
    pub fn name(&self, id: &str) -> Option<&'a str> {
        self.record(id).map(|record| record.value.as_str())
    }

    /// `(name, description)` for `id`, failing when no record has that id.
    pub fn resolve(&self, id: &str) -> Result<(&'a str, &'a str)> {
        self.record(id)
            .map(|record| (record.value.as_str(), record.description.as_str()))
            .ok_or_else(|| RelinkError::Resolution(id.to_string()))
    }
}
