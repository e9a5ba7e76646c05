//! XML serialization of the membership table.
//!
//! One element per bucket under a root named after the area id. Bucket text
//! is a comma-separated list of source ids; tile buckets carry their pixel
//! offset in an `upper_left_yx="row,col"` attribute.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::LutError;
use crate::domain::{PixelOffset, SourceId, SOURCE_ID_DELIMITER};

const OFFSET_ATTRIBUTE: &str = "upper_left_yx";

/// One bucket element as stored on disk.
#[derive(Debug, Clone, PartialEq, Default)]
pub(super) struct Bucket {
    pub name: String,
    pub upper_left: Option<PixelOffset>,
    pub members: Vec<SourceId>,
}

/// Parsed document: root element name plus its buckets in document order.
#[derive(Debug, Default)]
pub(super) struct Document {
    pub root: String,
    pub buckets: Vec<Bucket>,
}

/// Render a document as indented XML.
pub(super) fn write_document(root: &str, buckets: &[Bucket]) -> Result<String, LutError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(LutError::xml)?;
    writer
        .write_event(Event::Start(BytesStart::new(root)))
        .map_err(LutError::xml)?;

    let delimiter = SOURCE_ID_DELIMITER.to_string();
    for bucket in buckets {
        let mut start = BytesStart::new(bucket.name.as_str());
        if let Some(offset) = bucket.upper_left {
            let value = offset.to_string();
            start.push_attribute((OFFSET_ATTRIBUTE, value.as_str()));
        }

        if bucket.members.is_empty() {
            writer
                .write_event(Event::Empty(start))
                .map_err(LutError::xml)?;
            continue;
        }

        let text = bucket
            .members
            .iter()
            .map(SourceId::as_str)
            .collect::<Vec<_>>()
            .join(delimiter.as_str());
        writer
            .write_event(Event::Start(start))
            .map_err(LutError::xml)?;
        writer
            .write_event(Event::Text(BytesText::new(&text)))
            .map_err(LutError::xml)?;
        writer
            .write_event(Event::End(BytesEnd::new(bucket.name.as_str())))
            .map_err(LutError::xml)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(root)))
        .map_err(LutError::xml)?;

    let mut xml = String::from_utf8(writer.into_inner()).map_err(LutError::xml)?;
    xml.push('\n');
    Ok(xml)
}

/// Parse a membership document.
pub(super) fn parse_document(xml: &str) -> Result<Document, LutError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut document = Document::default();
    let mut current: Option<Bucket> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                match depth {
                    1 => document.root = element_name(&e),
                    2 => current = Some(bucket_from(&e)?),
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => match depth {
                0 => document.root = element_name(&e),
                1 => document.buckets.push(bucket_from(&e)?),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let (2, Some(bucket)) = (depth, current.as_mut()) {
                    let text = t.unescape().map_err(LutError::xml)?;
                    bucket.members.extend(parse_members(&text));
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2 {
                    if let Some(bucket) = current.take() {
                        document.buckets.push(bucket);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(LutError::Xml(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if document.root.is_empty() {
        return Err(LutError::Xml("missing root element".to_string()));
    }
    Ok(document)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn bucket_from(e: &BytesStart<'_>) -> Result<Bucket, LutError> {
    let name = element_name(e);
    let mut upper_left = None;

    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == OFFSET_ATTRIBUTE.as_bytes() {
            let value = attr.unescape_value().map_err(LutError::xml)?;
            upper_left = Some(parse_offset(&value).ok_or_else(|| LutError::InvalidOffset {
                bucket: name.clone(),
                value: value.to_string(),
            })?);
        }
    }

    Ok(Bucket {
        name,
        upper_left,
        members: Vec::new(),
    })
}

fn parse_members(text: &str) -> impl Iterator<Item = SourceId> + '_ {
    text.split(SOURCE_ID_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(SourceId::new)
}

/// Accepts `row,col` as well as the parenthesised `(row, col)` form.
fn parse_offset(value: &str) -> Option<PixelOffset> {
    let inner = value.trim().trim_start_matches('(').trim_end_matches(')');
    let mut parts = inner.split(',').map(str::trim);
    let row = parts.next()?.parse().ok()?;
    let col = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(PixelOffset::new(row, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<SourceId> {
        list.iter().map(|s| SourceId::new(s)).collect()
    }

    #[test]
    fn test_written_layout() {
        let buckets = vec![
            Bucket {
                name: "all".to_string(),
                upper_left: None,
                members: ids(&["casbv", "usktlx"]),
            },
            Bucket {
                name: "outside".to_string(),
                upper_left: None,
                members: vec![],
            },
            Bucket {
                name: "gemNA_t1".to_string(),
                upper_left: Some(PixelOffset::new(0, 50)),
                members: ids(&["casbv"]),
            },
        ];
        let xml = write_document("gemNA", &buckets).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<all>casbv,usktlx</all>"));
        assert!(xml.contains("<outside/>"));
        assert!(xml.contains("<gemNA_t1 upper_left_yx=\"0,50\">casbv</gemNA_t1>"));

        let parsed = parse_document(&xml).unwrap();
        assert_eq!(parsed.root, "gemNA");
        assert_eq!(parsed.buckets, buckets);
    }

    #[test]
    fn test_parse_legacy_formatting() {
        let xml = r#"<?xml version="1.0" ?>
<gemNA>
  <all>casbv, caswl,
    usktlx</all>
  <outside>usktlx</outside>
  <undetermined/>
  <gemNA_t1 upper_left_yx="(0, 1200)">casbv,caswl</gemNA_t1>
</gemNA>
"#;
        let parsed = parse_document(xml).unwrap();
        assert_eq!(parsed.buckets.len(), 4);
        assert_eq!(parsed.buckets[0].members, ids(&["casbv", "caswl", "usktlx"]));
        assert!(parsed.buckets[2].members.is_empty());
        assert_eq!(parsed.buckets[3].upper_left, Some(PixelOffset::new(0, 1200)));
    }

    #[test]
    fn test_bad_offset_is_reported() {
        let xml = r#"<gemNA><gemNA_t1 upper_left_yx="north">a</gemNA_t1></gemNA>"#;
        let err = parse_document(xml).unwrap_err();
        assert!(matches!(err, LutError::InvalidOffset { .. }));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            parse_document("<gemNA><all>a</outside></gemNA>"),
            Err(LutError::Xml(_))
        ));
        assert!(matches!(parse_document(""), Err(LutError::Xml(_))));
    }

    #[test]
    fn test_offset_forms() {
        assert_eq!(parse_offset("3,4"), Some(PixelOffset::new(3, 4)));
        assert_eq!(parse_offset(" (3, 4) "), Some(PixelOffset::new(3, 4)));
        assert_eq!(parse_offset("3"), None);
        assert_eq!(parse_offset("3,4,5"), None);
        assert_eq!(parse_offset("-1,4"), None);
    }
}
