//! Read statements
//!
//! The document dialect's `for ... return` form binds its variable in a
//! `Bindings` table that is threaded through the where, order by and
//! return clauses of the same statement.

use log::{debug, trace};

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslateError};
use crate::core::operation::{Document, Filter, Operation, OperationKind, OrderSpec, ProjectionSpec, SortDirection};
use crate::core::path::{references, PathExpression, ID_FIELD};
use crate::ql::ast::CursorStep;
use crate::ql::builder::OperationBuilder;
use crate::ql::context::Bindings;
use crate::ql::literal::{parse_document, parse_object};
use crate::ql::parser;
use crate::ql::predicate::{parse_conditions, FieldContext};
use crate::ql::router::StatementForm;

pub fn parse_read(statement: &str, form: StatementForm, config: &TranslatorConfig) -> Result<Operation> {
    match form {
        StatementForm::ShorthandFind => shorthand(statement, config),
        StatementForm::ForReturn => for_return(statement, Bindings::new()),
        StatementForm::DocumentGet => document_get(statement, config),
        StatementForm::SqlSelect => sql_select(statement),
        other => Err(TranslateError::UnsupportedStatement(format!(
            "{} is not a read form",
            other
        ))),
    }
}

/// `db.collection("c").find([filter[, projection]])[.sort({...})][.limit(n)]`
fn shorthand(statement: &str, config: &TranslatorConfig) -> Result<Operation> {
    let call = parser::parse_shorthand(statement)?;
    if call.arguments.len() > 2 {
        return Err(TranslateError::UnsupportedStatement(format!(
            "{}() takes at most a filter and a projection",
            call.method
        )));
    }

    let mut builder = OperationBuilder::new(OperationKind::Read).collection(call.collection.clone());

    if let Some(literal) = call.arguments.first() {
        if let Document::Object(map) = parse_object(literal, config.lenient_commas)? {
            builder = builder.filter(Filter::from_map(map));
        }
    }
    if let Some(literal) = call.arguments.get(1) {
        builder = builder.projection(projection_literal(literal, config)?);
    }

    for step in &call.cursor {
        builder = cursor_step(builder, step, config)?;
    }

    debug!("shorthand find on {}", call.collection);
    builder.build()
}

fn cursor_step(builder: OperationBuilder, step: &CursorStep, config: &TranslatorConfig) -> Result<OperationBuilder> {
    let argument = match step.arguments.as_slice() {
        [argument] => argument,
        _ => {
            return Err(TranslateError::UnsupportedStatement(format!(
                ".{}() takes one argument",
                step.method
            )))
        }
    };

    match step.method.as_str() {
        "sort" => Ok(builder.sort(sort_literal(argument, config)?)),
        "limit" => {
            let limit = argument
                .trim()
                .parse::<u64>()
                .map_err(|_| TranslateError::MalformedLiteral(format!("invalid limit: {}", argument)))?;
            Ok(builder.limit(limit))
        }
        other => Err(TranslateError::UnsupportedStatement(format!(
            "unsupported cursor method .{}()",
            other
        ))),
    }
}

/// `{"field": 1, "other": -1}`
fn sort_literal(literal: &str, config: &TranslatorConfig) -> Result<OrderSpec> {
    let mut order = OrderSpec::new();
    if let Document::Object(map) = parse_object(literal, config.lenient_commas)? {
        for (field, direction) in map {
            let direction = match direction.as_i64() {
                Some(1) => SortDirection::Ascending,
                Some(-1) => SortDirection::Descending,
                _ => {
                    return Err(TranslateError::MalformedLiteral(format!(
                        "sort direction of {} must be 1 or -1",
                        field
                    )))
                }
            };
            order.push(field, direction);
        }
    }
    Ok(order)
}

/// `{"field": 1, "_id": 0}`; booleans are accepted too
fn projection_literal(literal: &str, config: &TranslatorConfig) -> Result<ProjectionSpec> {
    let mut projection = ProjectionSpec::new();
    if let Document::Object(map) = parse_document(literal, config.lenient_commas)? {
        for (field, flag) in map {
            let included = match &flag {
                Document::Bool(b) => *b,
                Document::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
                _ => {
                    return Err(TranslateError::MalformedLiteral(format!(
                        "projection of {} must be 0/1 or a boolean",
                        field
                    )))
                }
            };
            projection.set(field, included);
        }
        Ok(projection)
    } else {
        Err(TranslateError::MalformedLiteral(format!(
            "expected a projection document, found {}",
            literal
        )))
    }
}

fn for_return(statement: &str, bindings: Bindings) -> Result<Operation> {
    let stmt = parser::parse_for_return(statement)?;
    let bindings = bindings.bind(stmt.variable.as_str(), stmt.collection.as_str());

    let filter = match &stmt.condition {
        Some(clause) => parse_conditions(clause, FieldContext::Bound(&bindings))?,
        None => Filter::new(),
    };

    let mut builder = OperationBuilder::new(OperationKind::Read)
        .collection_or(bindings.collection_of(&stmt.variable).map(str::to_string))
        .filter(filter);

    if let Some(order) = &stmt.order {
        builder = builder.sort(order_by(order, &bindings)?);
    }
    if let Some(returns) = &stmt.returns {
        builder = builder.projection(return_projection(returns, &stmt.variable, &bindings)?);
    }

    debug!("for ${} in {}", stmt.variable, stmt.collection);
    builder.build()
}

/// `$v/a descending, $v/b` into an ordered sort spec
fn order_by(clause: &str, bindings: &Bindings) -> Result<OrderSpec> {
    let mut order = OrderSpec::new();

    for key in split_top_level(clause) {
        let mut words: Vec<&str> = key.split_whitespace().collect();
        let direction = match words.last().map(|w| w.to_ascii_lowercase()) {
            Some(w) if w == "descending" => {
                words.pop();
                SortDirection::Descending
            }
            Some(w) if w == "ascending" => {
                words.pop();
                SortDirection::Ascending
            }
            _ => SortDirection::Ascending,
        };

        let path: PathExpression = words.join(" ").parse()?;
        let field = bindings.resolve(&path)?;
        trace!("order key {} {:?}", field, direction);
        order.push(field, direction);
    }

    Ok(order)
}

fn return_projection(expression: &str, variable: &str, bindings: &Bindings) -> Result<ProjectionSpec> {
    let mut fields = Vec::new();
    for path in references(expression, variable) {
        fields.push(bindings.resolve(&path)?);
    }
    Ok(ProjectionSpec::including(fields, ID_FIELD))
}

/// Split on commas outside quotes and parentheses
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    parts.push(text[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(text[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

fn document_get(statement: &str, config: &TranslatorConfig) -> Result<Operation> {
    let stmt = parser::parse_document_get(statement)?;

    let mut filter = Filter::new();
    filter.insert(ID_FIELD, Document::String(stmt.uri));

    OperationBuilder::new(OperationKind::Read)
        .collection_or(config.default_collection.clone())
        .filter(filter)
        .build()
}

fn sql_select(statement: &str) -> Result<Operation> {
    let stmt = parser::parse_sql_select(statement)?;
    let table = stmt.table.as_str();

    let filter = match &stmt.condition {
        Some(clause) => parse_conditions(clause, FieldContext::Table(table))?,
        None => Filter::new(),
    };

    let mut builder = OperationBuilder::new(OperationKind::Read)
        .collection(table)
        .filter(filter);

    if let Some(columns) = &stmt.columns {
        let mut fields = Vec::new();
        for column in columns {
            fields.push(PathExpression::column(column)?.resolve(table)?);
        }
        builder = builder.projection(ProjectionSpec::including(fields, ID_FIELD));
    }

    if !stmt.order.is_empty() {
        let mut order = OrderSpec::new();
        for (column, direction) in &stmt.order {
            let direction = match direction.as_deref().map(str::to_ascii_lowercase).as_deref() {
                Some("desc") | Some("descending") => SortDirection::Descending,
                _ => SortDirection::Ascending,
            };
            order.push(PathExpression::column(column)?.resolve(table)?, direction);
        }
        builder = builder.sort(order);
    }

    if let Some(limit) = stmt.limit {
        builder = builder.limit(limit);
    }

    debug!("sql select from {}", table);
    builder.build()
}
