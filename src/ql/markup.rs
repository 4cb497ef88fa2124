//! Markup to document conversion
//!
//! The root element of a fragment becomes a document: attributes are keyed
//! `@name`, child elements are keyed by tag (a repeated tag turns into an
//! array), and direct text is either the whole value or a `#text` entry.

use pest::iterators::Pair;
use serde_json::Map;

use crate::core::errors::{Result, TranslateError};
use crate::core::operation::Document;
use crate::ql::parser::{parse_rule, syntax_message, Rule};

/// Key prefix for attributes
pub const ATTRIBUTE_MARKER: &str = "@";
/// Key of the direct text next to attributes or children
pub const TEXT_MARKER: &str = "#text";

/// Convert a markup fragment with a single root element
pub fn markup_to_document(text: &str) -> Result<Document> {
    let document = parse_rule(Rule::markup_document, text.trim())
        .map_err(|e| TranslateError::MalformedMarkup(syntax_message(&e)))?;

    let root = document
        .into_inner()
        .find(|p| p.as_rule() == Rule::element)
        .ok_or_else(|| TranslateError::MalformedMarkup("no root element".to_string()))?;

    let (_, value) = convert_element(root)?;
    Ok(value)
}

fn malformed(message: String) -> TranslateError {
    TranslateError::MalformedMarkup(message)
}

/// Convert one `element` pair into its tag and value
fn convert_element(element: Pair<Rule>) -> Result<(String, Document)> {
    let inner = element
        .into_inner()
        .next()
        .ok_or_else(|| malformed("empty element".to_string()))?;

    let mut map = Map::new();
    let mut text = String::new();
    let tag;

    match inner.as_rule() {
        Rule::empty_element => {
            let mut parts = inner.into_inner();
            tag = next_tag(&mut parts)?;
            for attribute in parts {
                add_attribute(&mut map, &tag, attribute)?;
            }
        }
        Rule::full_element => {
            let mut parts = inner.into_inner();
            let start = parts
                .next()
                .ok_or_else(|| malformed("missing start tag".to_string()))?;
            let mut start_parts = start.into_inner();
            tag = next_tag(&mut start_parts)?;
            for attribute in start_parts {
                add_attribute(&mut map, &tag, attribute)?;
            }

            for part in parts {
                match part.as_rule() {
                    Rule::element => {
                        let (child_tag, child) = convert_element(part)?;
                        add_child(&mut map, child_tag, child);
                    }
                    Rule::text => text.push_str(&decode_entities(part.as_str())?),
                    Rule::cdata => {
                        if let Some(body) = part.into_inner().next() {
                            text.push_str(body.as_str());
                        }
                    }
                    Rule::end_tag => {
                        let closing = next_tag(&mut part.into_inner())?;
                        if closing != tag {
                            return Err(malformed(format!(
                                "<{}> closed by </{}>",
                                tag, closing
                            )));
                        }
                    }
                    _ => {}
                }
            }
        }
        other => return Err(malformed(format!("unexpected {:?}", other))),
    }

    let text = text.trim();
    if !text.is_empty() {
        if map.is_empty() {
            return Ok((tag, Document::String(text.to_string())));
        }
        map.insert(TEXT_MARKER.to_string(), Document::String(text.to_string()));
    }

    Ok((tag, Document::Object(map)))
}

fn next_tag(parts: &mut pest::iterators::Pairs<Rule>) -> Result<String> {
    parts
        .next()
        .filter(|p| p.as_rule() == Rule::tag_name)
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| malformed("missing tag name".to_string()))
}

fn add_attribute(map: &mut Map<String, Document>, tag: &str, attribute: Pair<Rule>) -> Result<()> {
    let mut name = String::new();
    let mut value = String::new();

    for part in attribute.into_inner() {
        match part.as_rule() {
            Rule::attr_name => name = part.as_str().to_string(),
            Rule::attr_value => {
                let raw = part.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                value = decode_entities(raw)?;
            }
            _ => {}
        }
    }

    let key = format!("{}{}", ATTRIBUTE_MARKER, name);
    if map.contains_key(&key) {
        return Err(malformed(format!("duplicate attribute {} on <{}>", name, tag)));
    }
    map.insert(key, Document::String(value));
    Ok(())
}

/// A second child with the same tag turns the entry into an array
fn add_child(map: &mut Map<String, Document>, tag: String, child: Document) {
    match map.get_mut(&tag) {
        Some(Document::Array(items)) => items.push(child),
        Some(existing) => {
            let first = existing.take();
            *existing = Document::Array(vec![first, child]);
        }
        None => {
            map.insert(tag, child);
        }
    }
}

/// Decode predefined entities and numeric character references
fn decode_entities(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find(';')
            .ok_or_else(|| malformed(format!("unterminated entity in {}", text)))?;
        let entity = &after[..end];

        let decoded = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| malformed(format!("unknown entity &{};", entity)))?
            }
        };

        out.push(decoded);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attributes_children_and_text() {
        let doc = markup_to_document(
            r#"<user id="7" role='admin'><name>John</name><age>30</age></user>"#,
        )
        .unwrap();
        assert_eq!(
            doc,
            json!({"@id": "7", "@role": "admin", "name": "John", "age": "30"})
        );
    }

    #[test]
    fn test_repeated_children_become_arrays() {
        let doc = markup_to_document(
            "<book><author>A</author><author>B</author><author>C</author><title>T</title></book>",
        )
        .unwrap();
        assert_eq!(doc, json!({"author": ["A", "B", "C"], "title": "T"}));
    }

    #[test]
    fn test_text_next_to_attributes() {
        let doc = markup_to_document(r#"<price currency="EUR"> 12.50 </price>"#).unwrap();
        assert_eq!(doc, json!({"@currency": "EUR", "#text": "12.50"}));
    }

    #[test]
    fn test_scalar_and_empty_elements() {
        assert_eq!(markup_to_document("<name>John</name>").unwrap(), json!("John"));
        assert_eq!(markup_to_document("<flag/>").unwrap(), json!({}));
        assert_eq!(markup_to_document("<flag>  </flag>").unwrap(), json!({}));
    }

    #[test]
    fn test_prolog_comments_cdata_and_entities() {
        let doc = markup_to_document(
            "<?xml version=\"1.0\"?>\n<!-- note -->\n<note><body>Tom &amp; Jerry <![CDATA[<3>]]> &#65;</body></note>",
        )
        .unwrap();
        assert_eq!(doc, json!({"body": "Tom & Jerry <3> A"}));
    }

    #[test]
    fn test_malformed_markup() {
        for text in [
            "<a><b></a></b>",
            "<a></b>",
            r#"<a x="1" x="2"/>"#,
            "<a>&nbsp;</a>",
            "<a/><b/>",
            "<a>",
            "not markup",
        ] {
            assert!(
                matches!(markup_to_document(text), Err(TranslateError::MalformedMarkup(_))),
                "{} should be rejected",
                text
            );
        }
    }
}
