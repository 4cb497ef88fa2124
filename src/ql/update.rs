//! Update statements

use log::debug;
use serde_json::Map;

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslateError};
use crate::core::operation::{Document, Filter, Operation, OperationKind, UpdateSpec};
use crate::core::path::{PathError, PathExpression, ID_FIELD};
use crate::core::value::LiteralValue;
use crate::ql::ast::NodeUpdate;
use crate::ql::builder::OperationBuilder;
use crate::ql::literal::{parse_document, parse_object};
use crate::ql::markup::markup_to_document;
use crate::ql::parser;
use crate::ql::predicate::{parse_conditions, FieldContext};
use crate::ql::router::StatementForm;

pub fn parse_update(statement: &str, form: StatementForm, config: &TranslatorConfig) -> Result<Operation> {
    match form {
        StatementForm::ShorthandUpdate => shorthand(statement, config),
        StatementForm::ReplaceNode => {
            let stmt = parser::parse_node_update(statement, false)?;
            let value = structured_replacement(&stmt.replacement, config)?;
            node_update(stmt, value)
        }
        StatementForm::ReplaceValue => {
            let stmt = parser::parse_node_update(statement, true)?;
            let value = LiteralValue::resolve(&stmt.replacement).to_document();
            node_update(stmt, value)
        }
        StatementForm::NodeReplace => node_replace(statement, config),
        StatementForm::SqlUpdate => sql_update(statement),
        other => Err(TranslateError::UnsupportedStatement(format!(
            "{} is not an update form",
            other
        ))),
    }
}

/// `db.collection("c").update(filter, update)`
fn shorthand(statement: &str, config: &TranslatorConfig) -> Result<Operation> {
    let call = parser::parse_shorthand(statement)?;
    if !call.cursor.is_empty() {
        return Err(TranslateError::UnsupportedStatement(format!(
            "{}() cannot be chained",
            call.method
        )));
    }

    let (filter, update) = match call.arguments.as_slice() {
        [filter, update] => (filter, update),
        _ => {
            return Err(TranslateError::UnsupportedStatement(format!(
                "{}() takes a filter and an update document",
                call.method
            )))
        }
    };

    let filter = match parse_object(filter, config.lenient_commas)? {
        Document::Object(map) => Filter::from_map(map),
        _ => Filter::new(),
    };
    let update = UpdateSpec::from_literal(parse_object(update, config.lenient_commas)?);

    debug!("shorthand {} on {}", call.method, call.collection);
    OperationBuilder::new(OperationKind::Update)
        .collection(call.collection)
        .filter(filter)
        .update(update)
        .build()
}

/// Replacement of `replace node`: markup or a strict literal
fn structured_replacement(text: &str, config: &TranslatorConfig) -> Result<Document> {
    if text.trim_start().starts_with('<') {
        markup_to_document(text)
    } else {
        parse_document(text, config.lenient_commas)
    }
}

/// Set the resolved field, or the whole replacement for the bare variable
fn set_value(path: &PathExpression, field: String, value: Document) -> UpdateSpec {
    if path.is_bare() {
        UpdateSpec::set_document(value)
    } else {
        UpdateSpec::set_field(field, value)
    }
}

fn node_update(stmt: NodeUpdate, value: Document) -> Result<Operation> {
    let path: PathExpression = stmt.target.parse()?;
    let variable = path
        .variable()
        .ok_or_else(|| PathError::MissingVariable(stmt.target.clone()))?
        .to_string();
    let field = path.resolve(&variable)?;

    let filter = match &stmt.condition {
        Some(clause) => parse_conditions(clause, FieldContext::Variable(&variable))?,
        None => Filter::new(),
    };

    debug!("node update of {} on {:?}", path, stmt.collection);
    OperationBuilder::new(OperationKind::Update)
        .collection_or(stmt.collection)
        .filter(filter)
        .update(set_value(&path, field, value))
        .build()
}

/// `xdmp:node-replace(doc("uri")//field, value)`
fn node_replace(statement: &str, config: &TranslatorConfig) -> Result<Operation> {
    let stmt = parser::parse_node_replace(statement)?;

    let value = if stmt.replacement.trim_start().starts_with('<') {
        markup_to_document(&stmt.replacement)?
    } else {
        match parse_document(&stmt.replacement, config.lenient_commas) {
            Ok(document) => document,
            Err(_) => LiteralValue::resolve(&stmt.replacement).to_document(),
        }
    };

    let update = match &stmt.field {
        Some(field) => UpdateSpec::set_field(field.clone(), value),
        None => UpdateSpec::set_document(value),
    };

    let mut filter = Filter::new();
    filter.insert(ID_FIELD, Document::String(stmt.uri.clone()));

    debug!("node replace in {}", stmt.uri);
    OperationBuilder::new(OperationKind::Update)
        .collection_or(config.default_collection.clone())
        .filter(filter)
        .update(update)
        .build()
}

fn sql_update(statement: &str) -> Result<Operation> {
    let stmt = parser::parse_sql_update(statement)?;

    let mut fields = Map::new();
    for (column, value) in &stmt.assignments {
        let field = PathExpression::column(column)?.resolve(&stmt.table)?;
        fields.insert(field, LiteralValue::resolve(value).to_document());
    }

    let filter = match &stmt.condition {
        Some(clause) => parse_conditions(clause, FieldContext::Table(&stmt.table))?,
        None => Filter::new(),
    };

    debug!("sql update of {}", stmt.table);
    OperationBuilder::new(OperationKind::Update)
        .collection(stmt.table)
        .filter(filter)
        .update(UpdateSpec::set_document(Document::Object(fields)))
        .build()
}
