//! Structured document literals
//!
//! Literals are parsed as JSON and nothing else. Text that is not a valid
//! literal is a `MalformedLiteral` error; it is never evaluated.

use log::trace;

use crate::core::errors::{Result, TranslateError};
use crate::core::operation::Document;

/// Parse a document, array or scalar literal
pub fn parse_document(text: &str, lenient_commas: bool) -> Result<Document> {
    let text = text.trim();
    let source = if lenient_commas {
        strip_trailing_commas(text)
    } else {
        text.to_string()
    };

    serde_json::from_str(&source).map_err(|e| {
        trace!("literal rejected: {}", text);
        TranslateError::MalformedLiteral(format!("{} in {}", e, text))
    })
}

/// Parse a literal that must be a document (`{...}`)
pub fn parse_object(text: &str, lenient_commas: bool) -> Result<Document> {
    let document = parse_document(text, lenient_commas)?;
    if document.is_object() {
        Ok(document)
    } else {
        Err(TranslateError::MalformedLiteral(format!(
            "expected a document, found {}",
            text.trim()
        )))
    }
}

/// True when the text is wrapped in a `{}` or `[]` pair
pub fn is_delimited(text: &str) -> bool {
    let text = text.trim();
    (text.starts_with('{') && text.ends_with('}')) || (text.starts_with('[') && text.ends_with(']'))
}

/// Remove a comma that directly precedes `}` or `]`, ignoring string contents
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}
