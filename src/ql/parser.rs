//! Parser for docbridge statements
//!
//! This module runs the pest grammar over a statement and turns the
//! resulting pairs into the parse-tree nodes of `ql::ast`.

use pest::error::{Error as PestError, ErrorVariant, LineColLocation};
use pest::iterators::Pair;
use pest::{Parser, Position};
use pest_derive::Parser;

use crate::core::errors::{Result, TranslateError};
use crate::core::value::strip_quotes;
use crate::ql::ast::*;

#[derive(Parser)]
#[grammar = "ql/grammar.pest"]
pub struct StatementParser;

/// Parse `input` with an entry rule and return the rule's own pair
pub(crate) fn parse_rule(rule: Rule, input: &str) -> std::result::Result<Pair<'_, Rule>, PestError<Rule>> {
    let mut pairs = StatementParser::parse(rule, input)?;
    pairs.next().ok_or_else(|| {
        PestError::new_from_pos(
            ErrorVariant::CustomError {
                message: "empty parse".to_string(),
            },
            Position::from_start(input),
        )
    })
}

/// One-line description of a pest failure
pub(crate) fn syntax_message(error: &PestError<Rule>) -> String {
    let (line, column) = match error.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    format!("line {}, column {}: {}", line, column, error.variant.message())
}

fn structure_error(form: &str, error: PestError<Rule>) -> TranslateError {
    TranslateError::UnsupportedStatement(format!(
        "statement does not match the {} form ({})",
        form,
        syntax_message(&error)
    ))
}

fn unexpected(pair: &Pair<Rule>) -> TranslateError {
    TranslateError::UnsupportedStatement(format!(
        "unexpected {:?} in statement: {}",
        pair.as_rule(),
        pair.as_str()
    ))
}

/// Text of a quoted token without its quotes
fn unquote(pair: &Pair<Rule>) -> String {
    let text = pair.as_str();
    strip_quotes(text).unwrap_or(text).to_string()
}

/// First quoted token anywhere below `pair`
fn first_quoted(pair: Pair<Rule>) -> Result<String> {
    let rule = pair.as_rule();
    pair.into_inner()
        .flatten()
        .find(|p| p.as_rule() == Rule::quoted)
        .map(|p| unquote(&p))
        .ok_or_else(|| TranslateError::UnsupportedStatement(format!("{:?} names no string", rule)))
}

fn arguments(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::call_argument)
        .map(|p| p.as_str().trim().to_string())
        .collect()
}

fn condition(pair: Pair<Rule>) -> Option<String> {
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::condition_text)
        .map(|p| p.as_str().trim().to_string())
}

/// Collection and method of a shorthand call, when `input` starts with one
pub fn shorthand_head(input: &str) -> Option<(String, String)> {
    let head = parse_rule(Rule::shorthand_head, input.trim_start()).ok()?;
    let mut collection = None;
    let mut method = None;

    for pair in head.into_inner() {
        match pair.as_rule() {
            Rule::quoted => collection = Some(unquote(&pair)),
            Rule::method_name => method = Some(pair.as_str().to_string()),
            _ => {}
        }
    }

    Some((collection?, method?))
}

pub fn parse_shorthand(input: &str) -> Result<ShorthandCall> {
    let call = parse_rule(Rule::shorthand_call, input)
        .map_err(|e| structure_error("db.collection(...).method(...)", e))?;

    let mut collection = String::new();
    let mut method = String::new();
    let mut args = Vec::new();
    let mut cursor = Vec::new();

    for pair in call.into_inner() {
        match pair.as_rule() {
            Rule::shorthand_head => {
                for part in pair.into_inner() {
                    match part.as_rule() {
                        Rule::quoted => collection = unquote(&part),
                        Rule::method_name => method = part.as_str().to_string(),
                        _ => return Err(unexpected(&part)),
                    }
                }
            }
            Rule::call_arguments => args = arguments(pair),
            Rule::cursor_step => {
                let mut step = CursorStep {
                    method: String::new(),
                    arguments: Vec::new(),
                };
                for part in pair.into_inner() {
                    match part.as_rule() {
                        Rule::method_name => step.method = part.as_str().to_string(),
                        Rule::call_arguments => step.arguments = arguments(part),
                        _ => return Err(unexpected(&part)),
                    }
                }
                cursor.push(step);
            }
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(ShorthandCall {
        collection,
        method,
        arguments: args,
        cursor,
    })
}

pub fn parse_insert_node(input: &str) -> Result<InsertNode> {
    let stmt = parse_rule(Rule::insert_node, input)
        .map_err(|e| structure_error("insert node ... into collection(...)", e))?;

    let mut payload = String::new();
    let mut collection = String::new();

    for pair in stmt.into_inner() {
        match pair.as_rule() {
            Rule::node_payload => payload = pair.as_str().trim().to_string(),
            Rule::collection_ref => collection = first_quoted(pair)?,
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(InsertNode { payload, collection })
}

/// Parse `replace node` (`value_form == false`) or
/// `replace value of node` / `update value` (`value_form == true`)
pub fn parse_node_update(input: &str, value_form: bool) -> Result<NodeUpdate> {
    let (rule, form) = if value_form {
        (Rule::replace_value, "update value ... with ...")
    } else {
        (Rule::replace_node, "replace node ... with ...")
    };
    let stmt = parse_rule(rule, input).map_err(|e| structure_error(form, e))?;

    let mut update = NodeUpdate {
        target: String::new(),
        replacement: String::new(),
        condition: None,
        collection: None,
    };

    for pair in stmt.into_inner() {
        match pair.as_rule() {
            Rule::target_path => update.target = pair.as_str().to_string(),
            Rule::replacement => update.replacement = pair.as_str().trim().to_string(),
            Rule::where_clause => update.condition = condition(pair),
            Rule::collection_clause => update.collection = Some(first_quoted(pair)?),
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(update)
}

pub fn parse_node_delete(input: &str) -> Result<NodeDelete> {
    let stmt = parse_rule(Rule::delete_node, input)
        .map_err(|e| structure_error("delete node ...", e))?;

    let mut delete = NodeDelete {
        target: String::new(),
        condition: None,
        collection: None,
    };

    for pair in stmt.into_inner() {
        match pair.as_rule() {
            Rule::target_path => delete.target = pair.as_str().to_string(),
            Rule::where_clause => delete.condition = condition(pair),
            Rule::collection_clause => delete.collection = Some(first_quoted(pair)?),
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(delete)
}

pub fn parse_for_return(input: &str) -> Result<ForReturn> {
    let stmt = parse_rule(Rule::for_return, input)
        .map_err(|e| structure_error("for ... in collection(...)", e))?;

    let mut flwor = ForReturn {
        variable: String::new(),
        collection: String::new(),
        condition: None,
        order: None,
        returns: None,
    };

    for pair in stmt.into_inner() {
        match pair.as_rule() {
            Rule::variable => flwor.variable = pair.as_str().trim_start_matches('$').to_string(),
            Rule::collection_ref => flwor.collection = first_quoted(pair)?,
            Rule::where_clause => flwor.condition = condition(pair),
            Rule::order_clause => {
                flwor.order = pair
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::order_text)
                    .map(|p| p.as_str().trim().to_string());
            }
            Rule::return_clause => {
                flwor.returns = pair
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::return_text)
                    .map(|p| p.as_str().trim().to_string());
            }
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(flwor)
}

pub fn parse_document_insert(input: &str) -> Result<DocumentInsert> {
    let stmt = parse_rule(Rule::document_insert, input)
        .map_err(|e| structure_error("xdmp:document-insert(uri, node)", e))?;

    let mut uri = String::new();
    let mut payload = String::new();

    for pair in stmt.into_inner() {
        match pair.as_rule() {
            Rule::quoted => uri = unquote(&pair),
            Rule::call_payload => payload = pair.as_str().trim().to_string(),
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(DocumentInsert { uri, payload })
}

pub fn parse_document_get(input: &str) -> Result<DocumentRef> {
    let stmt = parse_rule(Rule::document_get, input)
        .map_err(|e| structure_error("fn:doc(uri)", e))?;
    Ok(DocumentRef {
        uri: first_quoted(stmt)?,
    })
}

pub fn parse_document_delete(input: &str) -> Result<DocumentRef> {
    let stmt = parse_rule(Rule::document_delete, input)
        .map_err(|e| structure_error("xdmp:document-delete(uri)", e))?;
    Ok(DocumentRef {
        uri: first_quoted(stmt)?,
    })
}

pub fn parse_node_replace(input: &str) -> Result<NodeReplace> {
    let stmt = parse_rule(Rule::node_replace, input)
        .map_err(|e| structure_error("xdmp:node-replace(node, value)", e))?;

    let mut replace = NodeReplace {
        uri: String::new(),
        field: None,
        replacement: String::new(),
    };

    for pair in stmt.into_inner() {
        match pair.as_rule() {
            Rule::node_ref => {
                for part in pair.into_inner() {
                    match part.as_rule() {
                        Rule::doc_call => replace.uri = first_quoted(part)?,
                        Rule::quoted => replace.uri = unquote(&part),
                        Rule::node_steps => {
                            let field = part
                                .as_str()
                                .split('/')
                                .filter(|s| !s.is_empty())
                                .collect::<Vec<_>>()
                                .join(".");
                            replace.field = Some(field);
                        }
                        _ => return Err(unexpected(&part)),
                    }
                }
            }
            Rule::call_payload => replace.replacement = pair.as_str().trim().to_string(),
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(replace)
}

pub fn parse_sql_insert(input: &str) -> Result<SqlInsert> {
    let stmt = parse_rule(Rule::sql_insert, input)
        .map_err(|e| structure_error("INSERT INTO t (...) VALUES (...)", e))?;

    let mut insert = SqlInsert {
        table: String::new(),
        columns: Vec::new(),
        values: Vec::new(),
    };

    for pair in stmt.into_inner() {
        match pair.as_rule() {
            Rule::sql_name => insert.table = pair.as_str().to_string(),
            Rule::sql_columns => {
                insert.columns = pair.into_inner().map(|p| p.as_str().to_string()).collect();
            }
            Rule::call_arguments => insert.values = arguments(pair),
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(insert)
}

pub fn parse_sql_update(input: &str) -> Result<SqlUpdate> {
    let stmt = parse_rule(Rule::sql_update, input)
        .map_err(|e| structure_error("UPDATE t SET ...", e))?;

    let mut update = SqlUpdate {
        table: String::new(),
        assignments: Vec::new(),
        condition: None,
    };

    for pair in stmt.into_inner() {
        match pair.as_rule() {
            Rule::sql_name => update.table = pair.as_str().to_string(),
            Rule::assignment => {
                let mut column = String::new();
                let mut value = String::new();
                for part in pair.into_inner() {
                    match part.as_rule() {
                        Rule::sql_path => column = part.as_str().to_string(),
                        Rule::sql_scalar => value = part.as_str().trim().to_string(),
                        _ => return Err(unexpected(&part)),
                    }
                }
                update.assignments.push((column, value));
            }
            Rule::where_clause => update.condition = condition(pair),
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(update)
}

pub fn parse_sql_delete(input: &str) -> Result<SqlDelete> {
    let stmt = parse_rule(Rule::sql_delete, input)
        .map_err(|e| structure_error("DELETE FROM t ...", e))?;

    let mut delete = SqlDelete {
        table: String::new(),
        condition: None,
    };

    for pair in stmt.into_inner() {
        match pair.as_rule() {
            Rule::sql_name => delete.table = pair.as_str().to_string(),
            Rule::where_clause => delete.condition = condition(pair),
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(delete)
}

pub fn parse_sql_select(input: &str) -> Result<SqlSelect> {
    let stmt = parse_rule(Rule::sql_select, input)
        .map_err(|e| structure_error("SELECT ... FROM t ...", e))?;

    let mut select = SqlSelect {
        table: String::new(),
        columns: None,
        condition: None,
        order: Vec::new(),
        limit: None,
    };

    for pair in stmt.into_inner() {
        match pair.as_rule() {
            Rule::select_list => {
                let columns: Vec<String> = pair
                    .into_inner()
                    .filter(|p| p.as_rule() == Rule::sql_path)
                    .map(|p| p.as_str().to_string())
                    .collect();
                select.columns = if columns.is_empty() { None } else { Some(columns) };
            }
            Rule::sql_name => select.table = pair.as_str().to_string(),
            Rule::where_clause => select.condition = condition(pair),
            Rule::sql_order => {
                for key in pair.into_inner() {
                    let mut column = String::new();
                    let mut direction = None;
                    for part in key.into_inner() {
                        match part.as_rule() {
                            Rule::sql_path => column = part.as_str().to_string(),
                            Rule::sort_direction => direction = Some(part.as_str().to_string()),
                            _ => return Err(unexpected(&part)),
                        }
                    }
                    select.order.push((column, direction));
                }
            }
            Rule::sql_limit => {
                let text = pair.as_str();
                let limit = pair
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::number)
                    .and_then(|p| p.as_str().parse::<u64>().ok())
                    .ok_or_else(|| TranslateError::MalformedLiteral(format!("invalid limit: {}", text)))?;
                select.limit = Some(limit);
            }
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(select)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_head() {
        let head = shorthand_head(r#"  db.collection("users").find({"age": 18})"#);
        assert_eq!(head, Some(("users".to_string(), "find".to_string())));
        assert_eq!(shorthand_head("for $u in collection(\"users\")"), None);
    }

    #[test]
    fn test_shorthand_arguments_split_at_top_level() {
        let call = parse_shorthand(
            r#"db.collection('users').update({"tags": ["a", "b"]}, {"$set": {"note": "x, y"}})"#,
        )
        .unwrap();

        assert_eq!(call.collection, "users");
        assert_eq!(call.method, "update");
        assert_eq!(call.arguments.len(), 2);
        assert_eq!(call.arguments[0], r#"{"tags": ["a", "b"]}"#);
        assert_eq!(call.arguments[1], r#"{"$set": {"note": "x, y"}}"#);
    }

    #[test]
    fn test_shorthand_cursor_steps() {
        let call = parse_shorthand(r#"db.collection("users").find({}).sort({"age": -1}).limit(5);"#).unwrap();
        assert_eq!(call.arguments, vec!["{}".to_string()]);
        assert_eq!(call.cursor.len(), 2);
        assert_eq!(call.cursor[0].method, "sort");
        assert_eq!(call.cursor[1].arguments, vec!["5".to_string()]);
    }

    #[test]
    fn test_insert_node_payload() {
        let stmt = parse_insert_node(
            r#"insert node <user id="7"><name>John</name></user> into collection("users")"#,
        )
        .unwrap();
        assert_eq!(stmt.payload, r#"<user id="7"><name>John</name></user>"#);
        assert_eq!(stmt.collection, "users");
    }

    #[test]
    fn test_node_update_clauses_in_either_order() {
        let a = parse_node_update(
            r#"replace node $u/name with "Bob" where $u/age > 3 in collection("users")"#,
            false,
        )
        .unwrap();
        let b = parse_node_update(
            r#"replace node $u/name with "Bob" in collection("users") where $u/age > 3"#,
            false,
        )
        .unwrap();

        for update in [a, b] {
            assert_eq!(update.target, "$u/name");
            assert_eq!(update.replacement, "\"Bob\"");
            assert_eq!(update.condition.as_deref(), Some("$u/age > 3"));
            assert_eq!(update.collection.as_deref(), Some("users"));
        }
    }

    #[test]
    fn test_update_value_without_collection() {
        let update = parse_node_update("update value $u/age with 31", true).unwrap();
        assert_eq!(update.replacement, "31");
        assert_eq!(update.collection, None);
        assert_eq!(update.condition, None);
    }

    #[test]
    fn test_for_return_clauses() {
        let flwor = parse_for_return(
            r#"for $u in collection("users") where $u/age > 18 order by $u/name descending return $u/name"#,
        )
        .unwrap();

        assert_eq!(flwor.variable, "u");
        assert_eq!(flwor.collection, "users");
        assert_eq!(flwor.condition.as_deref(), Some("$u/age > 18"));
        assert_eq!(flwor.order.as_deref(), Some("$u/name descending"));
        assert_eq!(flwor.returns.as_deref(), Some("$u/name"));
    }

    #[test]
    fn test_node_replace_steps() {
        let replace = parse_node_replace(r#"xdmp:node-replace(doc("/books/1.xml")//price, 12.5)"#).unwrap();
        assert_eq!(replace.uri, "/books/1.xml");
        assert_eq!(replace.field.as_deref(), Some("price"));
        assert_eq!(replace.replacement, "12.5");
    }

    #[test]
    fn test_sql_select() {
        let select = parse_sql_select(
            "SELECT name, age FROM users WHERE age > 25 ORDER BY name ASC, age DESC LIMIT 10;",
        )
        .unwrap();

        assert_eq!(select.table, "users");
        assert_eq!(select.columns, Some(vec!["name".to_string(), "age".to_string()]));
        assert_eq!(select.condition.as_deref(), Some("age > 25"));
        assert_eq!(select.order.len(), 2);
        assert_eq!(select.order[1], ("age".to_string(), Some("DESC".to_string())));
        assert_eq!(select.limit, Some(10));
    }

    #[test]
    fn test_structure_errors_are_unsupported_statements() {
        let err = parse_insert_node("insert node <a/>").unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedStatement(_)));
    }
}
