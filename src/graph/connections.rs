//! Connection query: every relation touching one named entity.

use std::path::Path;

use crate::error::{RelinkError, Result};
use crate::record::RelationTable;
use crate::table::write_csv_atomic;

use super::{ConnectionReport, ConnectionRow, NameIndex};

/// Column order of the connection export
pub const CONNECTION_COLUMNS: [&str; 5] = [
    "source",
    "source_description",
    "value",
    "target",
    "target_description",
];

/// Collect the records touching the first record named `element`.
///
/// Endpoints resolve to `(name, description)` with a first-wins lookup. Rows
/// whose resolved target is the queried entity are flipped so the entity is
/// always reported as the source.
pub fn query_connections(table: &RelationTable, element: &str) -> Result<ConnectionReport> {
    let pivot = table
        .iter()
        .find(|record| record.value == element)
        .ok_or_else(|| RelinkError::NotFound(element.to_string()))?;
    let pivot_id = pivot.id.as_str();

    let index = NameIndex::first_wins(table);

    let connections = table
        .iter()
        .filter(|record| record.source == pivot_id || record.target == pivot_id)
        .map(|record| {
            let (source, source_description) = index.resolve(&record.source)?;
            let (target, target_description) = index.resolve(&record.target)?;

            let row = if target == element {
                ConnectionRow {
                    source: target.to_string(),
                    source_description: target_description.to_string(),
                    value: record.value.clone(),
                    target: source.to_string(),
                    target_description: source_description.to_string(),
                }
            } else {
                ConnectionRow {
                    source: source.to_string(),
                    source_description: source_description.to_string(),
                    value: record.value.clone(),
                    target: target.to_string(),
                    target_description: target_description.to_string(),
                }
            };
            Ok::<_, RelinkError>(row)
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "Entity '{}' (id {}) has {} connections",
        element,
        pivot_id,
        connections.len()
    );

    Ok(ConnectionReport {
        pivot_id: pivot_id.to_string(),
        connections,
    })
}

/// Rewrite the connection export with `rows`
pub fn write_connections(path: &Path, rows: &[ConnectionRow]) -> Result<()> {
    write_csv_atomic(path, &CONNECTION_COLUMNS, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use tempfile::TempDir;

    fn described(id: &str, name: &str, description: &str) -> Record {
        let mut record = Record::entity(id, name);
        record.description = description.to_string();
        record
    }

    fn sample_table() -> RelationTable {
        RelationTable::new(vec![
            described("2", "Alice", "engineer"),
            described("3", "Bob", "manager"),
            Record::new("4", "2", "3", "Включает"),
            described("5", "Carol", ""),
            Record::new("6", "5", "2", "knows"),
        ])
    }

    #[test]
    fn test_query_keeps_direction_from_source() {
        let report = query_connections(&sample_table(), "Alice").unwrap();
        assert_eq!(report.pivot_id, "2");
        assert_eq!(report.connections.len(), 2);
        assert_eq!(
            report.connections[0],
            ConnectionRow {
                source: "Alice".to_string(),
                source_description: "engineer".to_string(),
                value: "Включает".to_string(),
                target: "Bob".to_string(),
                target_description: "manager".to_string(),
            }
        );
    }

    #[test]
    fn test_query_flips_incoming_relations() {
        let report = query_connections(&sample_table(), "Alice").unwrap();
        let incoming = &report.connections[1];
        assert_eq!(incoming.source, "Alice");
        assert_eq!(incoming.source_description, "engineer");
        assert_eq!(incoming.value, "knows");
        assert_eq!(incoming.target, "Carol");
    }

    #[test]
    fn test_queried_entity_is_always_source() {
        for name in ["Alice", "Bob", "Carol"] {
            let report = query_connections(&sample_table(), name).unwrap();
            assert!(!report.connections.is_empty());
            assert!(report.connections.iter().all(|row| row.source == name));
        }
    }

    #[test]
    fn test_query_unknown_entity() {
        let result = query_connections(&sample_table(), "Mallory");
        assert!(matches!(result, Err(RelinkError::NotFound(name)) if name == "Mallory"));
    }

    #[test]
    fn test_query_unresolvable_endpoint() {
        let mut table = sample_table().into_records();
        table.push(Record::new("7", "2", "42", "uses"));
        let result = query_connections(&RelationTable::new(table), "Alice");
        assert!(matches!(result, Err(RelinkError::Resolution(id)) if id == "42"));
    }

    #[test]
    fn test_query_uses_first_record_for_duplicate_ids() {
        let mut table = sample_table().into_records();
        table.push(described("3", "Robert", "shadow"));
        let report = query_connections(&RelationTable::new(table), "Alice").unwrap();
        assert_eq!(report.connections[0].target, "Bob");
    }

    #[test]
    fn test_write_connections_header_and_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("connections.csv");
        let report = query_connections(&sample_table(), "Bob").unwrap();
        write_connections(&path, &report.connections).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("source,source_description,value,target,target_description")
        );
        assert_eq!(lines.next(), Some("Bob,manager,Включает,Alice,engineer"));
        assert_eq!(lines.next(), None);
    }
}
