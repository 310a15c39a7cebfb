//! The operations offered to the UI layer, over one process-wide table.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::annotate::{apply_edits, parse_form, FieldKind};
use crate::config::Config;
use crate::error::{RelinkError, Result};
use crate::extract::{check_upload_name, extract_document, Vocabulary};
use crate::graph::{derive_links, query_connections, write_connections, ConnectionReport, RowLink};
use crate::record::RelationTable;
use crate::table::{CsvMirror, TableStore};

/// Summary returned after a successful upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub filename: String,
    pub records: usize,
    pub message: String,
}

/// Relation table plus everything needed to run its operations
pub struct Workspace {
    config: Config,
    vocabulary: Vocabulary,
    store: TableStore,
}

impl Workspace {
    /// Restore the table mirror from the configured data directory, if any.
    pub fn open(config: Config) -> Result<Self> {
        std::fs::create_dir_all(config.data_dir())?;
        let store = TableStore::init(CsvMirror::new(config.table_path()))?;
        let vocabulary = Vocabulary::new(&config.vocabulary);

        Ok(Self {
            config,
            vocabulary,
            store,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_table(&self) -> bool {
        self.store.is_loaded()
    }

    /// Extract `content` and replace the current table with it.
    ///
    /// Nothing is committed when the name is rejected or the document does not parse.
    pub fn upload(&self, filename: &str, content: &[u8]) -> Result<UploadSummary> {
        check_upload_name(filename, &self.config.extract)?;
        let table = extract_document(content, &self.config.extract, &self.vocabulary)?;
        let records = table.len();
        self.store.replace(table)?;
        log::info!("Uploaded {} ({} records)", filename, records);

        Ok(UploadSummary {
            filename: filename.to_string(),
            records,
            message: "File uploaded successfully".to_string(),
        })
    }

    /// Extract a document from disk (CLI ingestion)
    pub fn upload_path(&self, path: &Path) -> Result<UploadSummary> {
        let content = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        self.upload(filename, &content)
    }

    /// Copy of the current table
    pub fn table(&self) -> Result<RelationTable> {
        self.store.snapshot()
    }

    /// Apply `description_<row>` fields and return the refreshed table.
    pub fn update_annotations<I, K, V>(&self, form: I) -> Result<RelationTable>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.apply_form(form, &[FieldKind::Description])
    }

    /// Apply `description_<row>` and `value_<row>` fields and return the refreshed table.
    pub fn apply_annotations<I, K, V>(&self, form: I) -> Result<RelationTable>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.apply_form(form, &[FieldKind::Description, FieldKind::Value])
    }

    /// Derive links from the current table. An empty table counts as no data.
    pub fn links(&self) -> Result<Vec<RowLink>> {
        self.store.read(|table| {
            if table.is_empty() {
                return Err(RelinkError::NoData);
            }
            Ok(derive_links(table))
        })
    }

    /// Apply `value_<row>` fields, then return the re-derived links.
    pub fn update_link_values<I, K, V>(&self, form: I) -> Result<Vec<RowLink>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let edits = parse_form(form);
        self.store.update(|table| {
            let applied = apply_edits(table, &edits, &[FieldKind::Value])?;
            log::info!("Updated {} relation types", applied);
            Ok(derive_links(table))
        })
    }

    /// Connections of the entity named `element`; rewrites the connection export.
    ///
    /// The export is untouched when the entity is unknown or an endpoint does not resolve.
    pub fn connections(&self, element: &str) -> Result<ConnectionReport> {
        self.store.read(|table| {
            let report = query_connections(table, element)?;
            write_connections(&self.config.connections_path(), &report.connections)?;
            log::info!(
                "Connections for '{}': {} rows exported to {}",
                element,
                report.connections.len(),
                self.config.connections_path().display()
            );
            Ok(report)
        })
    }

    /// Files currently stored in the data directory, sorted by name
    pub fn files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.config.data_dir())? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn table_path(&self) -> PathBuf {
        self.config.table_path()
    }

    pub fn connections_path(&self) -> PathBuf {
        self.config.connections_path()
    }

    fn apply_form<I, K, V>(&self, form: I, kinds: &[FieldKind]) -> Result<RelationTable>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let edits = parse_form(form);
        self.store.update(|table| {
            let applied = apply_edits(table, &edits, kinds)?;
            log::info!("Applied {} annotation edits", applied);
            Ok(table.clone())
        })
    }
}
