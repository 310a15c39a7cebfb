//! Flattened records and the ordered relation table that holds them.

use serde::{Deserialize, Serialize};

/// One flattened row extracted from an uploaded document.
///
/// Field order matches the mirror's column order: `id, source, target, value, description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    /// Identifier reference, empty when absent.
    #[serde(default)]
    pub source: String,
    /// Identifier reference, empty when absent.
    #[serde(default)]
    pub target: String,
    /// Entity name for declarations, relation-type token for relations.
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: String,
}

/// Tagged view of a [`Record`], decided by which references are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind<'a> {
    /// Neither `source` nor `target` is set: the record names an entity.
    EntityDeclaration { id: &'a str, name: &'a str },
    /// At least one endpoint reference is set.
    Relation {
        id: &'a str,
        source_id: &'a str,
        target_id: &'a str,
        relation_type: &'a str,
        description: &'a str,
    },
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            value: value.into(),
            description: String::new(),
        }
    }

    /// Entity declaration shorthand: no endpoints, `value` is the display name.
    pub fn entity(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, "", "", name)
    }

    pub fn kind(&self) -> RecordKind<'_> {
        if self.source.is_empty() && self.target.is_empty() {
            RecordKind::EntityDeclaration {
                id: &self.id,
                name: &self.value,
            }
        } else {
            RecordKind::Relation {
                id: &self.id,
                source_id: &self.source,
                target_id: &self.target,
                relation_type: &self.value,
                description: &self.description,
            }
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self.kind(), RecordKind::Relation { .. })
    }
}

/// Ordered sequence of records; row position is document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RelationTable {
    records: Vec<Record>,
}

impl RelationTable {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, row: usize) -> Option<&Record> {
        self.records.get(row)
    }

    pub fn get_mut(&mut self, row: usize) -> Option<&mut Record> {
        self.records.get_mut(row)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Record> {
        self.records.iter_mut()
    }

    /// Relation records paired with their row position.
    pub fn relations(&self) -> impl Iterator<Item = (usize, &Record)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_relation())
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl<'a> IntoIterator for &'a RelationTable {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_entity_declaration() {
        let record = Record::entity("2", "Alice");
        assert_eq!(
            record.kind(),
            RecordKind::EntityDeclaration { id: "2", name: "Alice" }
        );
        assert!(!record.is_relation());
        assert!(record.description.is_empty());
    }

    #[test]
    fn test_kind_relation_with_one_endpoint() {
        let record = Record::new("5", "2", "", "include");
        match record.kind() {
            RecordKind::Relation { source_id, target_id, relation_type, .. } => {
                assert_eq!(source_id, "2");
                assert_eq!(target_id, "");
                assert_eq!(relation_type, "include");
            }
            other => panic!("expected relation, got {:?}", other),
        }
    }

    #[test]
    fn test_relations_keep_row_positions() {
        let table = RelationTable::new(vec![
            Record::entity("2", "Alice"),
            Record::entity("3", "Bob"),
            Record::new("4", "2", "3", "include"),
        ]);
        let rows: Vec<usize> = table.relations().map(|(row, _)| row).collect();
        assert_eq!(rows, vec![2]);
    }
}
