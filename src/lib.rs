pub mod config;
pub mod error;
pub mod record;
pub mod extract;
pub mod table;
pub mod graph;
pub mod annotate;
pub mod workspace;
pub mod web;

pub use config::Config;
pub use error::{RelinkError, Result};
pub use graph::{ConnectionReport, ConnectionRow, Link, RowLink, derive_links, query_connections};
pub use record::{Record, RecordKind, RelationTable};
pub use workspace::Workspace;
