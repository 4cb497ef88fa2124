//! Path module for docbridge
//!
//! This module defines the PathExpression structure, a field reference
//! relative to an iteration variable (`$u/address/city`) or to a table
//! (`users.address`), and its resolution into a flat, dot-separated
//! document field path.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reserved identifier field of every stored document
pub const ID_FIELD: &str = "_id";

/// Errors that can occur when resolving paths
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Empty path")]
    EmptyPath,
    #[error("Path must start with a context variable: {0}")]
    MissingVariable(String),
    #[error("Path {path} is not relative to ${expected}")]
    UnboundVariable { path: String, expected: String },
    #[error("Invalid path segment '{segment}' in {path}")]
    InvalidSegment { path: String, segment: String },
}

/// Where a path is anchored
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Anchor {
    /// `$name/...`
    Variable(String),
    /// bare relational column reference, possibly table-qualified
    Column,
}

/// A hierarchical field reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpression {
    anchor: Anchor,
    segments: Vec<String>,
}

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '@' | '*')
}

fn validate_segment(path: &str, segment: &str) -> Result<(), PathError> {
    let valid = !segment.is_empty()
        && segment.chars().all(is_segment_char)
        && !segment[1..].contains('@');
    if valid {
        Ok(())
    } else {
        Err(PathError::InvalidSegment {
            path: path.to_string(),
            segment: segment.to_string(),
        })
    }
}

impl PathExpression {
    /// Parse a relational column reference (`col`, `table.col`, `a.b.c`)
    pub fn column(text: &str) -> Result<Self, PathError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PathError::EmptyPath);
        }

        let segments: Vec<String> = text.split('.').map(str::to_string).collect();
        for segment in &segments {
            validate_segment(text, segment)?;
        }

        Ok(PathExpression {
            anchor: Anchor::Column,
            segments,
        })
    }

    /// Name of the anchoring variable, without the `$`
    pub fn variable(&self) -> Option<&str> {
        match &self.anchor {
            Anchor::Variable(name) => Some(name),
            Anchor::Column => None,
        }
    }

    /// True when the path is the bare context variable itself
    pub fn is_bare(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resolve into a flat field path.
    ///
    /// For variable paths `context` is the variable name the path must be
    /// anchored on; the bare variable resolves to the identifier field.
    /// For column paths `context` is the table name, stripped when it
    /// qualifies the column.
    pub fn resolve(&self, context: &str) -> Result<String, PathError> {
        match &self.anchor {
            Anchor::Variable(name) => {
                if name != context {
                    return Err(PathError::UnboundVariable {
                        path: self.to_string(),
                        expected: context.to_string(),
                    });
                }
                if self.segments.is_empty() {
                    return Ok(ID_FIELD.to_string());
                }
                Ok(self.segments.join("."))
            }
            Anchor::Column => {
                let segments = if self.segments.len() > 1 && self.segments[0] == context {
                    &self.segments[1..]
                } else {
                    &self.segments[..]
                };
                Ok(segments.join("."))
            }
        }
    }
}

/// Parse a `$var[/segment]*` path
impl FromStr for PathExpression {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PathError::EmptyPath);
        }

        let rest = s
            .strip_prefix('$')
            .ok_or_else(|| PathError::MissingVariable(s.to_string()))?;

        let mut parts = rest.split('/');
        let name = parts.next().unwrap_or_default();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(PathError::MissingVariable(s.to_string()));
        }

        let mut segments = Vec::new();
        for segment in parts {
            validate_segment(s, segment)?;
            segments.push(segment.to_string());
        }

        Ok(PathExpression {
            anchor: Anchor::Variable(name.to_string()),
            segments,
        })
    }
}

/// Format a PathExpression the way it was written
impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.anchor {
            Anchor::Variable(name) => {
                write!(f, "${}", name)?;
                for segment in &self.segments {
                    write!(f, "/{}", segment)?;
                }
                Ok(())
            }
            Anchor::Column => write!(f, "{}", self.segments.join(".")),
        }
    }
}

/// Collect every `$variable/...` reference to `variable` in free text,
/// in order of appearance. The bare variable is not a field reference.
pub fn references(text: &str, variable: &str) -> Vec<PathExpression> {
    let mut found = Vec::new();
    let bytes = text.as_bytes();
    let mut index = 0;

    while let Some(offset) = text[index..].find('$') {
        let start = index + offset + 1;
        let name_end = text[start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .map(|n| start + n)
            .unwrap_or(text.len());
        index = name_end;

        if &text[start..name_end] != variable || bytes.get(name_end) != Some(&b'/') {
            continue;
        }

        let path_end = text[name_end..]
            .find(|c: char| !(is_segment_char(c) || c == '/'))
            .map(|n| name_end + n)
            .unwrap_or(text.len());
        index = path_end;

        let segments: Vec<String> = text[name_end..path_end]
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if !segments.is_empty() {
            found.push(PathExpression {
                anchor: Anchor::Variable(variable.to_string()),
                segments,
            });
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_parsing() {
        let path = "$u/address/city".parse::<PathExpression>().unwrap();
        assert_eq!(path.variable(), Some("u"));
        assert!(!path.is_bare());
        assert_eq!(path.to_string(), "$u/address/city");
    }

    #[test]
    fn test_resolve_joins_segments_with_dots() {
        let path: PathExpression = "$u/address/city".parse().unwrap();
        assert_eq!(path.resolve("u").unwrap(), "address.city");
    }

    #[test]
    fn test_bare_variable_resolves_to_id() {
        let path: PathExpression = "$u".parse().unwrap();
        assert!(path.is_bare());
        assert_eq!(path.resolve("u").unwrap(), ID_FIELD);
    }

    #[test]
    fn test_attribute_segments_keep_marker() {
        let path: PathExpression = "$b/@isbn".parse().unwrap();
        assert_eq!(path.resolve("b").unwrap(), "@isbn");
    }

    #[test]
    fn test_foreign_variable_is_rejected() {
        let path: PathExpression = "$x/age".parse().unwrap();
        assert!(matches!(
            path.resolve("u"),
            Err(PathError::UnboundVariable { .. })
        ));
    }

    #[test]
    fn test_malformed_paths() {
        assert_eq!("".parse::<PathExpression>(), Err(PathError::EmptyPath));
        assert!(matches!("age".parse::<PathExpression>(), Err(PathError::MissingVariable(_))));
        assert!(matches!("$/age".parse::<PathExpression>(), Err(PathError::MissingVariable(_))));
        assert!(matches!(
            "$u//age".parse::<PathExpression>(),
            Err(PathError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn test_column_paths() {
        let qualified = PathExpression::column("users.name").unwrap();
        assert_eq!(qualified.resolve("users").unwrap(), "name");

        let nested = PathExpression::column("address.city").unwrap();
        assert_eq!(nested.resolve("users").unwrap(), "address.city");

        let plain = PathExpression::column("users").unwrap();
        assert_eq!(plain.resolve("users").unwrap(), "users");
    }

    #[test]
    fn test_references_in_return_expression() {
        let refs = references("<r>{$u/name}{$u/address/city}{$user/age}{$u}</r>", "u");
        let fields: Vec<String> = refs.iter().map(|p| p.resolve("u").unwrap()).collect();
        assert_eq!(fields, vec!["name", "address.city"]);
    }
}
