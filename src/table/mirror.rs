//! CSV files on disk: the relation table mirror and tabular exports.
//!
//! Every write goes to a temporary file next to the target and is renamed
//! into place, so readers never observe a half-written file.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::record::{Record, RelationTable};

/// Column order of the relation table mirror
pub const TABLE_COLUMNS: [&str; 5] = ["id", "source", "target", "value", "description"];

/// Durable copy of the relation table
#[derive(Debug, Clone)]
pub struct CsvMirror {
    path: PathBuf,
}

impl CsvMirror {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the mirror, or `None` when no mirror has been written yet.
    ///
    /// A mirror without a `description` column loads with empty descriptions.
    pub fn load(&self) -> Result<Option<RelationTable>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize::<Record>()
            .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

        Ok(Some(RelationTable::new(records)))
    }

    /// Rewrite the whole mirror
    pub fn save(&self, table: &RelationTable) -> Result<()> {
        write_csv_atomic(&self.path, &TABLE_COLUMNS, table.records())
    }
}

/// Write `header` followed by `rows` to `path`, replacing any previous file.
pub fn write_csv_atomic<T, I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        writer.write_record(header)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_table() -> RelationTable {
        let mut described = Record::entity("3", "Bob, Jr.");
        described.description = "line one\nline \"two\"".to_string();
        RelationTable::new(vec![
            Record::entity("2", "Alice"),
            described,
            Record::new("4", "2", "3", "Включает"),
        ])
    }

    #[test]
    fn test_load_missing_mirror() {
        let temp_dir = TempDir::new().unwrap();
        let mirror = CsvMirror::new(temp_dir.path().join("processed_data.csv"));
        assert!(mirror.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_preserves_quoting() {
        let temp_dir = TempDir::new().unwrap();
        let mirror = CsvMirror::new(temp_dir.path().join("nested").join("processed_data.csv"));
        let table = sample_table();

        mirror.save(&table).unwrap();
        let loaded = mirror.load().unwrap().unwrap();
        assert_eq!(loaded, table);

        let text = fs::read_to_string(mirror.path()).unwrap();
        assert!(text.starts_with("id,source,target,value,description\n"));
    }

    #[test]
    fn test_save_empty_table_writes_header() {
        let temp_dir = TempDir::new().unwrap();
        let mirror = CsvMirror::new(temp_dir.path().join("processed_data.csv"));
        mirror.save(&RelationTable::default()).unwrap();

        let text = fs::read_to_string(mirror.path()).unwrap();
        assert_eq!(text, "id,source,target,value,description\n");
        assert!(mirror.load().unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_load_without_description_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("processed_data.csv");
        fs::write(&path, "id,source,target,value\n2,,,Alice\n4,2,3,include\n").unwrap();

        let table = CsvMirror::new(&path).load().unwrap().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].target, "3");
        assert!(table.iter().all(|r| r.description.is_empty()));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let mirror = CsvMirror::new(temp_dir.path().join("processed_data.csv"));
        mirror.save(&sample_table()).unwrap();
        mirror.save(&sample_table()).unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
