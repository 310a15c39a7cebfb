//! Link derivation from the relation table.

use crate::record::{RecordKind, RelationTable};

use super::{Link, NameIndex, RowLink};

/// Derive named links from every relation record, in row order.
///
/// Endpoint ids are resolved through a last-wins [`NameIndex`]. Records whose
/// endpoints do not both resolve to a non-empty name produce no link. When the
/// resolved target name equals the name registered for the record's own id,
/// the relation was recorded from the receiving side and the endpoints are
/// swapped.
pub fn derive_links(table: &RelationTable) -> Vec<RowLink> {
    let names = NameIndex::last_wins(table);

    let links: Vec<RowLink> = table
        .relations()
        .filter_map(|(row, record)| {
            let RecordKind::Relation {
                id,
                source_id,
                target_id,
                relation_type,
                ..
            } = record.kind()
            else {
                return None;
            };

            let source = names.name(source_id).filter(|name| !name.is_empty())?;
            let target = names.name(target_id).filter(|name| !name.is_empty())?;

            let (source, target) = if names.name(id) == Some(target) {
                (target, source)
            } else {
                (source, target)
            };

            Some(RowLink {
                row,
                link: Link {
                    source: source.to_string(),
                    value: relation_type.to_string(),
                    target: target.to_string(),
                },
            })
        })
        .collect();

    log::debug!("Derived {} links from {} records", links.len(), table.len());
    links
}
