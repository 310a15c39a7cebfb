//! Relationship derivation: named links and per-entity connection reports.
//!
//! Both views resolve identifier references back to entity names through
//! [`NameIndex`]; they differ in how duplicate ids are tie-broken.

mod connections;
mod links;
mod lookup;

pub use connections::{query_connections, write_connections, CONNECTION_COLUMNS};
pub use links::derive_links;
pub use lookup::NameIndex;

use serde::{Deserialize, Serialize};

/// A directional relationship between two named entities (source --value--> target).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub value: String,
    pub target: String,
}

/// A derived link together with the table row it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLink {
    pub row: usize,
    #[serde(flatten)]
    pub link: Link,
}

/// One neighbor of a queried entity, endpoints resolved to names.
///
/// Field order is the export's column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRow {
    pub source: String,
    pub source_description: String,
    pub value: String,
    pub target: String,
    pub target_description: String,
}

/// Result of a connection query around one pivot identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub pivot_id: String,
    pub connections: Vec<ConnectionRow>,
}
