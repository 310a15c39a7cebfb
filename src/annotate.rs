//! Form-driven edits to the relation table.
//!
//! Form fields are named `description_<row>` or `value_<row>`; anything else
//! is ignored.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{RelinkError, Result};
use crate::record::RelationTable;

/// Which column a form field edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Description,
    Value,
}

/// A single parsed form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    pub row: usize,
    pub kind: FieldKind,
    pub text: String,
}

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(description|value)_(0|[1-9]\d*)$").expect("Invalid regex pattern")
    })
}

/// Parse form fields into edits, ordered by row then column.
pub fn parse_form<I, K, V>(form: I) -> Vec<FieldEdit>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut edits = Vec::new();

    for (key, text) in form {
        let key = key.as_ref();
        let Some(cap) = field_pattern().captures(key) else {
            log::debug!("Ignoring form field '{}'", key);
            continue;
        };

        let kind = match &cap[1] {
            "description" => FieldKind::Description,
            _ => FieldKind::Value,
        };
        let Ok(row) = cap[2].parse::<usize>() else {
            log::warn!("Ignoring form field '{}': row index does not fit", key);
            continue;
        };

        edits.push(FieldEdit {
            row,
            kind,
            text: text.as_ref().to_string(),
        });
    }

    edits.sort_by_key(|edit| (edit.row, edit.kind == FieldKind::Value));
    edits
}

/// Apply the edits of the given kinds. Returns the number of edits applied.
///
/// Every row index is checked before anything is written, so a stale index
/// leaves the table untouched.
pub fn apply_edits(
    table: &mut RelationTable,
    edits: &[FieldEdit],
    kinds: &[FieldKind],
) -> Result<usize> {
    let selected: Vec<&FieldEdit> = edits
        .iter()
        .filter(|edit| kinds.contains(&edit.kind))
        .collect();

    let len = table.len();
    if let Some(stale) = selected.iter().find(|edit| edit.row >= len) {
        return Err(RelinkError::Index {
            index: stale.row,
            len,
        });
    }

    for edit in &selected {
        let record = table
            .get_mut(edit.row)
            .ok_or(RelinkError::Index { index: edit.row, len })?;
        match edit.kind {
            FieldKind::Description => record.description = edit.text.clone(),
            FieldKind::Value => record.value = edit.text.clone(),
        }
    }

    Ok(selected.len())
}
