//! Value module for docbridge
//!
//! This module defines the LiteralValue enum, the typed form of a literal
//! token found in a predicate or an assignment, and the resolver that
//! classifies raw tokens into it.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Number;

use crate::core::operation::Document;

/// The different types of literal values a statement can carry
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Null value (`null` / `none`)
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value (quotes already stripped)
    String(String),
    /// Unevaluated expression, e.g. a nested function call
    Raw(String),
}

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?[0-9]+$").expect("valid integer pattern"))
}

fn float_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?[0-9]+\.[0-9]+$").expect("valid float pattern"))
}

fn call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_:.\-]*\(").expect("valid call pattern"))
}

impl LiteralValue {
    /// Classify a literal token.
    ///
    /// Order: quoted string, integer, float, boolean, null, function-call
    /// shaped text (kept raw), anything else as trimmed text.
    pub fn resolve(token: &str) -> Self {
        let token = token.trim();

        if let Some(inner) = strip_quotes(token) {
            return LiteralValue::String(inner.to_string());
        }

        if integer_pattern().is_match(token) {
            // Too wide for i64: keep the magnitude rather than the type,
            // and the digits themselves once even f64 overflows
            return match token.parse::<i64>() {
                Ok(i) => LiteralValue::Integer(i),
                Err(_) => finite_float(token)
                    .map(LiteralValue::Float)
                    .unwrap_or_else(|| LiteralValue::String(token.to_string())),
            };
        }

        if float_pattern().is_match(token) {
            return finite_float(token)
                .map(LiteralValue::Float)
                .unwrap_or_else(|| LiteralValue::String(token.to_string()));
        }

        match token.to_ascii_lowercase().as_str() {
            "true" => return LiteralValue::Boolean(true),
            "false" => return LiteralValue::Boolean(false),
            "null" | "none" => return LiteralValue::Null,
            _ => {}
        }

        if call_pattern().is_match(token) {
            return LiteralValue::Raw(token.to_string());
        }

        LiteralValue::String(token.to_string())
    }

    /// Get the string payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into the document model.
    ///
    /// Raw expressions become plain strings; non-finite floats become null.
    pub fn to_document(&self) -> Document {
        match self {
            LiteralValue::Null => Document::Null,
            LiteralValue::Boolean(b) => Document::Bool(*b),
            LiteralValue::Integer(i) => Document::Number(Number::from(*i)),
            LiteralValue::Float(f) => Number::from_f64(*f)
                .map(Document::Number)
                .unwrap_or(Document::Null),
            LiteralValue::String(s) | LiteralValue::Raw(s) => Document::String(s.clone()),
        }
    }
}

/// `f64` parse that rejects overflow to infinity
fn finite_float(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Return the text between a matching pair of single or double quotes
pub(crate) fn strip_quotes(token: &str) -> Option<&str> {
    if token.len() < 2 {
        return None;
    }
    let first = token.chars().next()?;
    if (first == '"' || first == '\'') && token.ends_with(first) {
        Some(&token[1..token.len() - 1])
    } else {
        None
    }
}

/// Canonical string form; resolving it again yields the same value
impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Null => write!(f, "null"),
            LiteralValue::Boolean(b) => write!(f, "{}", b),
            LiteralValue::Integer(i) => write!(f, "{}", i),
            LiteralValue::Float(fl) => {
                let text = fl.to_string();
                if text.contains('.') || !fl.is_finite() {
                    write!(f, "{}", text)
                } else {
                    write!(f, "{}.0", text)
                }
            }
            LiteralValue::String(s) => {
                if s.contains('"') {
                    write!(f, "'{}'", s)
                } else {
                    write!(f, "\"{}\"", s)
                }
            }
            LiteralValue::Raw(s) => write!(f, "{}", s),
        }
    }
}

impl From<LiteralValue> for Document {
    fn from(value: LiteralValue) -> Self {
        value.to_document()
    }
}

impl From<i64> for LiteralValue {
    fn from(i: i64) -> Self {
        LiteralValue::Integer(i)
    }
}

impl From<f64> for LiteralValue {
    fn from(f: f64) -> Self {
        LiteralValue::Float(f)
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Boolean(b)
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_classification_order() {
        assert_eq!(LiteralValue::resolve("\"John\""), LiteralValue::String("John".to_string()));
        assert_eq!(LiteralValue::resolve("'John'"), LiteralValue::String("John".to_string()));
        assert_eq!(LiteralValue::resolve("18"), LiteralValue::Integer(18));
        assert_eq!(LiteralValue::resolve("-7"), LiteralValue::Integer(-7));
        assert_eq!(LiteralValue::resolve("2.5"), LiteralValue::Float(2.5));
        assert_eq!(LiteralValue::resolve("TRUE"), LiteralValue::Boolean(true));
        assert_eq!(LiteralValue::resolve("False"), LiteralValue::Boolean(false));
        assert_eq!(LiteralValue::resolve("None"), LiteralValue::Null);
        assert_eq!(LiteralValue::resolve("null"), LiteralValue::Null);
    }

    #[test]
    fn test_quoted_numbers_stay_strings() {
        assert_eq!(LiteralValue::resolve("\"18\""), LiteralValue::String("18".to_string()));
    }

    #[test]
    fn test_function_calls_are_kept_raw() {
        assert_eq!(
            LiteralValue::resolve("current-date()"),
            LiteralValue::Raw("current-date()".to_string())
        );
        assert_eq!(
            LiteralValue::resolve("xs:date(\"2024-01-01\")"),
            LiteralValue::Raw("xs:date(\"2024-01-01\")".to_string())
        );
    }

    #[test]
    fn test_unclassified_text_is_trimmed() {
        assert_eq!(LiteralValue::resolve("  Paris  "), LiteralValue::String("Paris".to_string()));
        assert_eq!(LiteralValue::resolve("1.2.3"), LiteralValue::String("1.2.3".to_string()));
    }

    #[test]
    fn test_oversized_integer_becomes_float() {
        assert_eq!(
            LiteralValue::resolve("100000000000000000000"),
            LiteralValue::Float(1e20)
        );
    }

    #[test]
    fn test_overflowing_numbers_keep_their_digits() {
        let digits = "9".repeat(400);
        assert_eq!(LiteralValue::resolve(&digits), LiteralValue::String(digits.clone()));
        assert_eq!(LiteralValue::resolve(&digits).to_document(), json!(digits));

        let fraction = format!("{}.5", digits);
        assert_eq!(LiteralValue::resolve(&fraction), LiteralValue::String(fraction.clone()));

        let negative = format!("-{}", digits);
        let first = LiteralValue::resolve(&negative);
        assert_eq!(LiteralValue::resolve(&first.to_string()), first);
    }

    #[test]
    fn test_canonical_form_round_trips() {
        let values = vec![
            LiteralValue::Null,
            LiteralValue::Boolean(false),
            LiteralValue::Integer(-42),
            LiteralValue::Float(3.0),
            LiteralValue::Float(0.25),
            LiteralValue::Float(1e20),
            LiteralValue::String("hello world".to_string()),
            LiteralValue::String("say \"hi\"".to_string()),
            LiteralValue::Raw("now()".to_string()),
        ];

        for value in values {
            assert_eq!(LiteralValue::resolve(&value.to_string()), value);
        }
    }

    #[test]
    fn test_to_document() {
        assert_eq!(LiteralValue::Integer(30).to_document(), json!(30));
        assert_eq!(LiteralValue::Float(1.5).to_document(), json!(1.5));
        assert_eq!(LiteralValue::Raw("now()".to_string()).to_document(), json!("now()"));
        assert_eq!(LiteralValue::Float(f64::NAN).to_document(), json!(null));
    }

    #[test]
    fn test_value_conversion() {
        let int_value: LiteralValue = 42i64.into();
        let bool_value: LiteralValue = true.into();
        let string_value: LiteralValue = "Hello".into();

        assert_eq!(int_value, LiteralValue::Integer(42));
        assert_eq!(bool_value, LiteralValue::Boolean(true));
        assert_eq!(string_value, LiteralValue::String("Hello".to_string()));
    }
}
