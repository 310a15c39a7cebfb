use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::config::ExtractConfig;
use crate::error::{RelinkError, Result};
use crate::record::Record;

/// Attributes the extractor cares about on a single element
#[derive(Debug, Default)]
struct ElementAttrs {
    id: Option<String>,
    source: Option<String>,
    target: Option<String>,
    value: Option<String>,
}

/// Walks every element of an XML document in document order and flattens
/// the ones carrying an `id` into records.
///
/// Nothing is emitted until the sentinel element (`id="1"` by default) has
/// been seen; the sentinel itself is skipped.
pub struct XmlExtractor {
    sentinel_id: String,
    default_value: String,
}

impl XmlExtractor {
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            sentinel_id: config.sentinel_id.clone(),
            default_value: config.default_value.clone(),
        }
    }

    pub fn extract(&self, content: &[u8]) -> Result<Vec<Record>> {
        let mut reader = Reader::from_reader(content);
        let mut buf = Vec::new();
        let mut records = Vec::new();
        let mut armed = false;
        let mut depth = 0usize;
        let mut root_seen = false;
        let mut entities = HashMap::new();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| parse_error(&reader, e))?;

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    if depth == 0 {
                        if root_seen {
                            return Err(RelinkError::Parse(format!(
                                "junk after document element at position {}",
                                reader.buffer_position()
                            )));
                        }
                        root_seen = true;
                    }

                    let attrs = read_attrs(e, &entities)?;
                    if armed {
                        if let Some(record) = self.to_record(attrs) {
                            log::debug!("Extracted record id={}", record.id);
                            records.push(record);
                        }
                    } else if attrs.id.as_deref() == Some(self.sentinel_id.as_str()) {
                        log::debug!("Sentinel element id={} reached", self.sentinel_id);
                        armed = true;
                    }

                    if matches!(event, Event::Start(_)) {
                        depth += 1;
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                }
                Event::Text(ref e) if depth == 0 => {
                    if !e.iter().all(u8::is_ascii_whitespace) {
                        return Err(RelinkError::Parse(format!(
                            "text outside the document element at position {}",
                            reader.buffer_position()
                        )));
                    }
                }
                Event::GeneralRef(_) | Event::CData(_) if depth == 0 => {
                    return Err(RelinkError::Parse(format!(
                        "junk after document element at position {}",
                        reader.buffer_position()
                    )));
                }
                Event::DocType(ref e) if !root_seen => {
                    entities = internal_entities(&String::from_utf8_lossy(e));
                    log::debug!("Document declares {} internal entities", entities.len());
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !root_seen {
            return Err(RelinkError::Parse("no element found".to_string()));
        }
        if depth != 0 {
            return Err(RelinkError::Parse(format!(
                "{} unclosed element(s) at end of document",
                depth
            )));
        }
        if !armed {
            log::warn!(
                "Sentinel element id={} not found; document produced no records",
                self.sentinel_id
            );
        }

        Ok(records)
    }

    fn to_record(&self, attrs: ElementAttrs) -> Option<Record> {
        let id = attrs.id?;
        Some(Record::new(
            id,
            attrs.source.unwrap_or_default(),
            attrs.target.unwrap_or_default(),
            attrs.value.unwrap_or_else(|| self.default_value.clone()),
        ))
    }
}

fn entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<!ENTITY\s+([^\s%]+)\s+(?:"([^"]*)"|'([^']*)')\s*>"#)
            .expect("Invalid regex pattern")
    })
}

/// General entities declared in the internal DTD subset. Values are taken
/// literally; parameter and external entities are ignored.
fn internal_entities(doctype: &str) -> HashMap<String, String> {
    entity_pattern()
        .captures_iter(doctype)
        .filter_map(|cap| {
            let value = cap.get(2).or_else(|| cap.get(3))?;
            Some((cap[1].to_string(), normalize_whitespace(value.as_str())))
        })
        .collect()
}

/// Attribute-value normalization: line breaks and tabs become single spaces.
/// Character references such as `&#10;` are resolved later and survive.
fn normalize_whitespace(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace(['\t', '\n', '\r'], " ")
}

fn read_attrs(
    element: &BytesStart<'_>,
    entities: &HashMap<String, String>,
) -> Result<ElementAttrs> {
    let mut attrs = ElementAttrs::default();

    for attr in element.attributes() {
        let attr = attr.map_err(|e| RelinkError::Parse(format!("invalid attribute: {}", e)))?;
        if attr.value.contains(&b'<') {
            return Err(RelinkError::Parse(format!(
                "'<' in value of attribute '{}'",
                String::from_utf8_lossy(attr.key.as_ref())
            )));
        }
        let slot = match attr.key.as_ref() {
            b"id" => &mut attrs.id,
            b"source" => &mut attrs.source,
            b"target" => &mut attrs.target,
            b"value" => &mut attrs.value,
            _ => continue,
        };

        let raw = std::str::from_utf8(&attr.value)
            .map_err(|e| RelinkError::Parse(format!("attribute is not valid UTF-8: {}", e)))?;
        let raw = normalize_whitespace(raw);
        let value = unescape_with(&raw, |entity| {
            entities
                .get(entity)
                .map(String::as_str)
                .or_else(|| resolve_predefined_entity(entity))
        })
        .map_err(|e| RelinkError::Parse(format!("invalid escape in attribute: {}", e)))?;
        *slot = Some(value.into_owned());
    }

    Ok(attrs)
}

fn parse_error(reader: &Reader<&[u8]>, err: quick_xml::Error) -> RelinkError {
    RelinkError::Parse(format!(
        "XML parse error at position {}: {}",
        reader.error_position(),
        err
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> XmlExtractor {
        XmlExtractor::new(&ExtractConfig::default())
    }

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <mxGraphModel>
            <root>
                <mxCell id="0"/>
                <mxCell id="1" parent="0"/>
                <mxCell id="2" value="Alice" parent="1"/>
                <mxCell id="3" value="Bob" parent="1"/>
                <mxCell id="4" source="2" target="3" value="include" parent="1">
                    <mxGeometry relative="1" as="geometry"/>
                </mxCell>
            </root>
        </mxGraphModel>
    "#;

    #[test]
    fn test_extract_skips_preamble_and_sentinel() {
        let records = extractor().extract(SAMPLE.as_bytes()).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "4"]);
        assert_eq!(records[0].value, "Alice");
        assert_eq!(records[2].source, "2");
        assert_eq!(records[2].target, "3");
        assert_eq!(records[2].value, "include");
        assert!(records.iter().all(|r| r.description.is_empty()));
    }

    #[test]
    fn test_extract_defaults_missing_attributes() {
        let xml = r#"<g><c id="1"/><c id="7" source="2"/></g>"#;
        let records = extractor().extract(xml.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "2");
        assert_eq!(records[0].target, "");
        assert_eq!(records[0].value, "Выполняет");
    }

    #[test]
    fn test_extract_sentinel_repeated_after_arming_is_emitted() {
        let xml = r#"<g><c id="1"/><c id="1" value="again"/></g>"#;
        let records = extractor().extract(xml.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "again");
    }

    #[test]
    fn test_extract_root_can_be_sentinel() {
        let xml = r#"<g id="1"><c id="2" value="A"/><c value="no id"/></g>"#;
        let records = extractor().extract(xml.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "2");
    }

    #[test]
    fn test_extract_without_sentinel_emits_nothing() {
        let xml = r#"<g><c id="2" value="A"/></g>"#;
        let records = extractor().extract(xml.as_bytes()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_extract_unescapes_attribute_values() {
        let xml = r#"<g><c id="1"/><c id="2" value="R&amp;D &lt;team&gt;"/></g>"#;
        let records = extractor().extract(xml.as_bytes()).unwrap();
        assert_eq!(records[0].value, "R&D <team>");
    }

    #[test]
    fn test_extract_resolves_internal_entities() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE g [
  <!ENTITY who "Alice">
  <!ENTITY team 'QA'>
]>
<g><c id="1"/><c id="2" value="&who;"/><c id="3" value="&team; of &who;"/></g>"#;
        let records = extractor().extract(xml.as_bytes()).unwrap();
        assert_eq!(records[0].value, "Alice");
        assert_eq!(records[1].value, "QA of Alice");
    }

    #[test]
    fn test_extract_normalizes_attribute_whitespace() {
        let xml = "<g><c id=\"1\"/>\
                   <c id=\"2\" value=\"A\nB\r\nC\tD\"/>\
                   <c id=\"3\" value=\"E&#10;F\"/></g>";
        let records = extractor().extract(xml.as_bytes()).unwrap();
        assert_eq!(records[0].value, "A B C D");
        assert_eq!(records[1].value, "E\nF");
    }

    #[test]
    fn test_extract_is_deterministic() {
        let first = extractor().extract(SAMPLE.as_bytes()).unwrap();
        let second = extractor().extract(SAMPLE.as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extract_rejects_malformed_documents() {
        let cases = [
            "",
            "not xml at all",
            "<g><c id=\"1\"></g>",
            "<g><c id=\"1\"/>",
            "<g/><h/>",
            "<g><c id=\"1\" id=\"2\"/></g>",
            "<g><c id=\"1\"/></g>&amp;",
            "<g><c id=\"1\"/></g><![CDATA[x]]>",
            "<g><c id=\"1\"/><c id=\"2\" value=\"a<b\"/></g>",
            "<g><c id=\"1\"/><c id=\"2\" value=\"&undeclared;\"/></g>",
        ];
        for case in cases {
            let result = extractor().extract(case.as_bytes());
            assert!(
                matches!(result, Err(RelinkError::Parse(_))),
                "expected parse error for {:?}, got {:?}",
                case,
                result
            );
        }
    }
}
