//! Predicate engine
//!
//! A condition clause is split on top-level `and` into fragments. Each
//! fragment is matched against a fixed catalogue of condition shapes, the
//! first matching shape wins, and every fragment contributes one entry to
//! the filter. A later fragment on the same field replaces an earlier one.

use log::trace;
use pest::iterators::Pair;
use serde_json::json;

use crate::core::errors::{Result, TranslateError};
use crate::core::operation::{Document, Filter};
use crate::core::path::PathExpression;
use crate::core::value::LiteralValue;
use crate::ql::context::Bindings;
use crate::ql::parser::{parse_rule, syntax_message, Rule};

/// What the field references of a clause are relative to
#[derive(Debug, Clone, Copy)]
pub enum FieldContext<'a> {
    /// `$v/...` paths on one context variable
    Variable(&'a str),
    /// `$v/...` paths on any variable bound by the statement
    Bound(&'a Bindings),
    /// Column references of one table
    Table(&'a str),
}

impl FieldContext<'_> {
    /// Resolve a field reference into a flat field path
    pub fn resolve(&self, text: &str) -> Result<String> {
        let field = match self {
            FieldContext::Variable(variable) => text.parse::<PathExpression>()?.resolve(variable)?,
            FieldContext::Bound(bindings) => bindings.resolve(&text.parse::<PathExpression>()?)?,
            FieldContext::Table(table) => PathExpression::column(text)?.resolve(table)?,
        };
        Ok(field)
    }

    fn is_relational(&self) -> bool {
        matches!(self, FieldContext::Table(_))
    }
}

/// The condition catalogue, in matching order.
///
/// The relational shapes are only tried for column references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionShape {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    Exists,
    NotExists,
    Like,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl ConditionShape {
    fn from_operator(op: &str) -> Option<Self> {
        let shape = match op.to_ascii_lowercase().as_str() {
            "=" | "eq" => ConditionShape::Equal,
            "!=" | "<>" | "ne" => ConditionShape::NotEqual,
            ">" | "gt" => ConditionShape::Greater,
            ">=" | "ge" => ConditionShape::GreaterOrEqual,
            "<" | "lt" => ConditionShape::Less,
            "<=" | "le" => ConditionShape::LessOrEqual,
            _ => return None,
        };
        Some(shape)
    }

    fn from_function(name: &str) -> Option<Self> {
        let shape = match name.to_ascii_lowercase().as_str() {
            "contains" => ConditionShape::Contains,
            "starts-with" => ConditionShape::StartsWith,
            "ends-with" => ConditionShape::EndsWith,
            _ => return None,
        };
        Some(shape)
    }
}

/// One parsed condition fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Resolved field path
    pub field: String,
    pub shape: ConditionShape,
    /// Compared value; the pattern for regex shapes, the list for `IN`
    pub value: Document,
}

impl Condition {
    /// The filter entry value for this condition
    pub fn to_entry(&self) -> Document {
        let value = self.value.clone();
        match self.shape {
            ConditionShape::Equal => value,
            ConditionShape::NotEqual => json!({ "$ne": value }),
            ConditionShape::Greater => json!({ "$gt": value }),
            ConditionShape::GreaterOrEqual => json!({ "$gte": value }),
            ConditionShape::Less => json!({ "$lt": value }),
            ConditionShape::LessOrEqual => json!({ "$lte": value }),
            ConditionShape::Contains | ConditionShape::StartsWith | ConditionShape::EndsWith => {
                json!({ "$regex": value, "$options": "i" })
            }
            ConditionShape::Like => json!({ "$regex": value }),
            ConditionShape::Exists => json!({ "$exists": true }),
            ConditionShape::NotExists => json!({ "$exists": false }),
            ConditionShape::In => json!({ "$in": value }),
            ConditionShape::NotIn => json!({ "$nin": value }),
            ConditionShape::IsNull => Document::Null,
            ConditionShape::IsNotNull => json!({ "$ne": null }),
        }
    }
}

/// Build the filter for a condition clause
pub fn parse_conditions(clause: &str, context: FieldContext) -> Result<Filter> {
    let mut filter = Filter::new();

    for fragment in split_conjunction(clause)? {
        let condition = parse_condition(&fragment, context)?;
        trace!("condition {:?} on {} from: {}", condition.shape, condition.field, fragment);
        if filter.insert(condition.field.clone(), condition.to_entry()).is_some() {
            trace!("condition on {} replaced by a later fragment", condition.field);
        }
    }

    Ok(filter)
}

/// Split a clause on top-level `and`, flattening parenthesised conjunctions
pub fn split_conjunction(clause: &str) -> Result<Vec<String>> {
    let clause = clause.trim();
    if clause.is_empty() {
        return Err(TranslateError::UnsupportedCondition("empty condition".to_string()));
    }

    let parsed = parse_rule(Rule::condition_clause, clause)
        .map_err(|e| TranslateError::UnsupportedCondition(syntax_message(&e)))?;

    let mut fragments = Vec::new();
    for pair in parsed.into_inner() {
        if pair.as_rule() != Rule::condition_fragment {
            continue;
        }
        let text = pair.as_str().trim();
        match strip_wrapping_parens(text) {
            Some(inner) => fragments.extend(split_conjunction(inner)?),
            None => fragments.push(text.to_string()),
        }
    }

    Ok(fragments)
}

/// Match one fragment against the condition catalogue
pub fn parse_condition(fragment: &str, context: FieldContext) -> Result<Condition> {
    let fragment = fragment.trim();

    if parse_rule(Rule::disjunction, fragment).is_ok() {
        return Err(TranslateError::UnsupportedCondition(format!(
            "'or' is not supported: {}",
            fragment
        )));
    }

    if let Ok(pair) = parse_rule(Rule::comparison, fragment) {
        return comparison(pair, context);
    }
    if let Ok(pair) = parse_rule(Rule::string_fn, fragment) {
        return string_function(pair, context);
    }
    if let Ok(pair) = parse_rule(Rule::exists_fn, fragment) {
        return existence(pair, ConditionShape::Exists, context);
    }
    if let Ok(pair) = parse_rule(Rule::not_exists_fn, fragment) {
        return existence(pair, ConditionShape::NotExists, context);
    }

    if context.is_relational() {
        if let Ok(pair) = parse_rule(Rule::like_shape, fragment) {
            return like(pair, context);
        }
        if let Ok(pair) = parse_rule(Rule::in_shape, fragment) {
            return membership(pair, context);
        }
        if let Ok(pair) = parse_rule(Rule::null_shape, fragment) {
            return nullity(pair, context);
        }
    }

    Err(TranslateError::UnsupportedCondition(fragment.to_string()))
}

fn comparison(pair: Pair<Rule>, context: FieldContext) -> Result<Condition> {
    let mut field = None;
    let mut shape = None;
    let mut value = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::operand => field = Some(context.resolve(part.as_str())?),
            Rule::comparison_op => shape = ConditionShape::from_operator(part.as_str()),
            Rule::operand_value => value = Some(LiteralValue::resolve(part.as_str())),
            _ => {}
        }
    }

    match (field, shape, value) {
        (Some(field), Some(shape), Some(value)) => Ok(Condition {
            field,
            shape,
            value: value.to_document(),
        }),
        _ => Err(TranslateError::UnsupportedCondition("incomplete comparison".to_string())),
    }
}

fn string_function(pair: Pair<Rule>, context: FieldContext) -> Result<Condition> {
    let fragment = pair.as_str().to_string();
    let mut field = None;
    let mut shape = None;
    let mut value = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::string_fn_name => shape = ConditionShape::from_function(part.as_str()),
            Rule::fn_operand => field = Some(context.resolve(part.as_str())?),
            Rule::fn_value => value = Some(LiteralValue::resolve(part.as_str())),
            _ => {}
        }
    }

    let (field, shape) = match (field, shape) {
        (Some(field), Some(shape)) => (field, shape),
        _ => return Err(TranslateError::UnsupportedCondition(fragment)),
    };
    let needle = match value {
        Some(LiteralValue::String(s)) => regex::escape(&s),
        _ => {
            return Err(TranslateError::UnsupportedCondition(format!(
                "string function needs a string argument: {}",
                fragment
            )))
        }
    };

    let pattern = match shape {
        ConditionShape::StartsWith => format!("^{}", needle),
        ConditionShape::EndsWith => format!("{}$", needle),
        _ => needle,
    };

    Ok(Condition {
        field,
        shape,
        value: Document::String(pattern),
    })
}

fn existence(pair: Pair<Rule>, shape: ConditionShape, context: FieldContext) -> Result<Condition> {
    let operand = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::fn_operand)
        .ok_or_else(|| TranslateError::UnsupportedCondition("exists() without a path".to_string()))?;

    Ok(Condition {
        field: context.resolve(operand.as_str())?,
        shape,
        value: Document::Null,
    })
}

fn like(pair: Pair<Rule>, context: FieldContext) -> Result<Condition> {
    let fragment = pair.as_str().to_string();
    let mut field = None;
    let mut pattern = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::operand => field = Some(context.resolve(part.as_str())?),
            Rule::operand_value => pattern = LiteralValue::resolve(part.as_str()).as_str().map(like_to_regex),
            _ => {}
        }
    }

    match (field, pattern) {
        (Some(field), Some(pattern)) => Ok(Condition {
            field,
            shape: ConditionShape::Like,
            value: Document::String(pattern),
        }),
        _ => Err(TranslateError::UnsupportedCondition(format!(
            "LIKE needs a string pattern: {}",
            fragment
        ))),
    }
}

/// `%` matches any run, `_` any character; the pattern is anchored on the
/// sides that do not start or end with `%`
fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::new();
    if !pattern.starts_with('%') {
        regex.push('^');
    }

    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '%' | '_' => {
                regex.push_str(&regex::escape(&literal));
                literal.clear();
                regex.push_str(if c == '%' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    regex.push_str(&regex::escape(&literal));

    if !pattern.ends_with('%') {
        regex.push('$');
    }
    regex
}

fn membership(pair: Pair<Rule>, context: FieldContext) -> Result<Condition> {
    let mut field = None;
    let mut shape = ConditionShape::In;
    let mut values = Vec::new();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::operand => field = Some(context.resolve(part.as_str())?),
            Rule::negation => shape = ConditionShape::NotIn,
            Rule::call_arguments => {
                values = part
                    .into_inner()
                    .map(|p| LiteralValue::resolve(p.as_str()).to_document())
                    .collect();
            }
            _ => {}
        }
    }

    let field = field.ok_or_else(|| TranslateError::UnsupportedCondition("IN without a column".to_string()))?;
    Ok(Condition {
        field,
        shape,
        value: Document::Array(values),
    })
}

fn nullity(pair: Pair<Rule>, context: FieldContext) -> Result<Condition> {
    let mut field = None;
    let mut shape = ConditionShape::IsNull;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::operand => field = Some(context.resolve(part.as_str())?),
            Rule::negation => shape = ConditionShape::IsNotNull,
            _ => {}
        }
    }

    let field = field.ok_or_else(|| TranslateError::UnsupportedCondition("IS NULL without a column".to_string()))?;
    Ok(Condition {
        field,
        shape,
        value: Document::Null,
    })
}

/// Inner text when the whole fragment is one parenthesised group
fn strip_wrapping_parens(text: &str) -> Option<&str> {
    if !text.starts_with('(') || !text.ends_with(')') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return if i == text.len() - 1 {
                            Some(&text[1..i])
                        } else {
                            None
                        };
                    }
                }
                _ => {}
            },
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path::PathError;

    fn filter(clause: &str) -> Document {
        parse_conditions(clause, FieldContext::Variable("u")).unwrap().into_document()
    }

    #[test]
    fn test_comparison_shapes() {
        assert_eq!(filter("$u/age = 18"), json!({"age": 18}));
        assert_eq!(filter("$u/age eq 18"), json!({"age": 18}));
        assert_eq!(filter("$u/name != \"Bob\""), json!({"name": {"$ne": "Bob"}}));
        assert_eq!(filter("$u/age > 18"), json!({"age": {"$gt": 18}}));
        assert_eq!(filter("$u/age >= 18"), json!({"age": {"$gte": 18}}));
        assert_eq!(filter("$u/age lt 65"), json!({"age": {"$lt": 65}}));
        assert_eq!(filter("$u/age <= 2.5"), json!({"age": {"$lte": 2.5}}));
        assert_eq!(filter("$u/active = true"), json!({"active": true}));
    }

    #[test]
    fn test_conjunction_keeps_one_key_per_field() {
        let doc = filter("$u/age > 18 and $u/city = \"Paris\" AND $u/address/zip ne '75001'");
        assert_eq!(
            doc,
            json!({"age": {"$gt": 18}, "city": "Paris", "address.zip": {"$ne": "75001"}})
        );
    }

    #[test]
    fn test_later_fragment_overwrites() {
        assert_eq!(filter("$u/age > 18 and $u/age < 65"), json!({"age": {"$lt": 65}}));
    }

    #[test]
    fn test_quoted_and_is_not_a_separator() {
        assert_eq!(
            filter("$u/band = \"Simon and Garfunkel\""),
            json!({"band": "Simon and Garfunkel"})
        );
    }

    #[test]
    fn test_parenthesised_conjunction_is_flattened() {
        assert_eq!(
            filter("($u/age > 18 and $u/age2 < 3) and $u/x = 1"),
            json!({"age": {"$gt": 18}, "age2": {"$lt": 3}, "x": 1})
        );
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(
            filter("contains($u/name, \"a.b\")"),
            json!({"name": {"$regex": "a\\.b", "$options": "i"}})
        );
        assert_eq!(
            filter("fn:starts-with($u/name, 'Jo')"),
            json!({"name": {"$regex": "^Jo", "$options": "i"}})
        );
        assert_eq!(
            filter("ends-with($u/email, \".com\")"),
            json!({"email": {"$regex": "\\.com$", "$options": "i"}})
        );
    }

    #[test]
    fn test_string_function_needs_string() {
        assert!(matches!(
            parse_conditions("contains($u/age, 18)", FieldContext::Variable("u")),
            Err(TranslateError::UnsupportedCondition(_))
        ));
    }

    #[test]
    fn test_existence() {
        assert_eq!(filter("exists($u/email)"), json!({"email": {"$exists": true}}));
        assert_eq!(filter("not(exists($u/email))"), json!({"email": {"$exists": false}}));
        assert_eq!(filter("fn:empty($u/phone)"), json!({"phone": {"$exists": false}}));
    }

    #[test]
    fn test_unknown_shapes_and_disjunction() {
        assert!(matches!(
            parse_conditions("$u/age between 1", FieldContext::Variable("u")),
            Err(TranslateError::UnsupportedCondition(_))
        ));
        assert!(matches!(
            parse_conditions("$u/age > 1 or $u/age < 0", FieldContext::Variable("u")),
            Err(TranslateError::UnsupportedCondition(_))
        ));
    }

    #[test]
    fn test_bad_paths_are_malformed() {
        assert!(matches!(
            parse_conditions("age > 1", FieldContext::Variable("u")),
            Err(TranslateError::MalformedPath(PathError::MissingVariable(_)))
        ));
        assert!(matches!(
            parse_conditions("$x/age > 1", FieldContext::Variable("u")),
            Err(TranslateError::MalformedPath(PathError::UnboundVariable { .. }))
        ));
    }

    #[test]
    fn test_relational_shapes() {
        let doc = parse_conditions(
            "users.age >= 21 AND name LIKE 'Jo%' AND city IN ('Paris', 'Lyon') AND role NOT IN (1, 2) AND email IS NOT NULL AND phone IS NULL",
            FieldContext::Table("users"),
        )
        .unwrap()
        .into_document();

        assert_eq!(
            doc,
            json!({
                "age": {"$gte": 21},
                "name": {"$regex": "^Jo.*"},
                "city": {"$in": ["Paris", "Lyon"]},
                "role": {"$nin": [1, 2]},
                "email": {"$ne": null},
                "phone": null
            })
        );
    }

    #[test]
    fn test_like_patterns() {
        assert_eq!(like_to_regex("%son"), ".*son$");
        assert_eq!(like_to_regex("J_n%"), "^J.n.*");
        assert_eq!(like_to_regex("%a.b%"), ".*a\\.b.*");
    }

    #[test]
    fn test_relational_shapes_need_table_context() {
        assert!(matches!(
            parse_conditions("$u/name like 'a%'", FieldContext::Variable("u")),
            Err(TranslateError::UnsupportedCondition(_))
        ));
    }

    #[test]
    fn test_bound_context() {
        let bindings = Bindings::new().bind("u", "users");
        let doc = parse_conditions("$u/age > 1", FieldContext::Bound(&bindings))
            .unwrap()
            .into_document();
        assert_eq!(doc, json!({"age": {"$gt": 1}}));
    }
}
