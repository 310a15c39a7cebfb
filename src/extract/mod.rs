//! Document extraction: XML walk, then vocabulary normalization.

pub mod vocabulary;
pub mod xml;

pub use vocabulary::Vocabulary;
pub use xml::XmlExtractor;

use std::path::Path;

use crate::config::ExtractConfig;
use crate::error::{RelinkError, Result};
use crate::record::RelationTable;

/// Check an upload's file name against the accepted extensions.
///
/// An empty name means no file was selected.
pub fn check_upload_name(filename: &str, config: &ExtractConfig) -> Result<()> {
    if filename.trim().is_empty() {
        return Err(RelinkError::EmptyUpload);
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    if config
        .allowed_extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
    {
        Ok(())
    } else {
        Err(RelinkError::UnsupportedFile(filename.to_string()))
    }
}

/// Full extraction pipeline: parse → flatten → normalize vocabulary
pub fn extract_document(
    content: &[u8],
    config: &ExtractConfig,
    vocabulary: &Vocabulary,
) -> Result<RelationTable> {
    let records = XmlExtractor::new(config).extract(content)?;
    let mut table = RelationTable::new(records);
    let rewritten = vocabulary.normalize(&mut table);
    log::info!(
        "Extracted {} records ({} relation types normalized)",
        table.len(),
        rewritten
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_upload_name() {
        let config = ExtractConfig::default();
        assert!(check_upload_name("graph.xml", &config).is_ok());
        assert!(check_upload_name("export.TXT", &config).is_ok());
        assert!(matches!(check_upload_name("", &config), Err(RelinkError::EmptyUpload)));
        assert!(matches!(
            check_upload_name("graph.json", &config),
            Err(RelinkError::UnsupportedFile(_))
        ));
        assert!(matches!(
            check_upload_name("noextension", &config),
            Err(RelinkError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn test_extract_document_normalizes_vocabulary() {
        let xml = r#"<g>
            <c id="1"/>
            <c id="2" value="Alice"/>
            <c id="3" value="Bob"/>
            <c id="4" source="2" target="3" value="include"/>
        </g>"#;
        let table = extract_document(
            xml.as_bytes(),
            &ExtractConfig::default(),
            &Vocabulary::default(),
        )
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[2].value, "Включает");
        assert!(table.iter().all(|r| r.description.is_empty()));
    }

    #[test]
    fn test_extract_document_parse_error() {
        let result = extract_document(b"<g>", &ExtractConfig::default(), &Vocabulary::default());
        assert!(matches!(result, Err(RelinkError::Parse(_))));
    }
}
