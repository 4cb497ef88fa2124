//! Insert statements

use log::debug;
use serde_json::Map;

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslateError};
use crate::core::operation::{Document, Operation, OperationKind};
use crate::core::path::{PathExpression, ID_FIELD};
use crate::core::value::LiteralValue;
use crate::ql::builder::OperationBuilder;
use crate::ql::literal::{is_delimited, parse_document, parse_object};
use crate::ql::markup::markup_to_document;
use crate::ql::parser;
use crate::ql::router::StatementForm;

/// Key holding a non-document payload stored under a URI
pub const DATA_FIELD: &str = "data";

pub fn parse_insert(statement: &str, form: StatementForm, config: &TranslatorConfig) -> Result<Operation> {
    match form {
        StatementForm::ShorthandInsert => shorthand(statement, config),
        StatementForm::InsertNode => insert_node(statement, config),
        StatementForm::DocumentInsert => document_insert(statement, config),
        StatementForm::SqlInsert => sql_insert(statement),
        other => Err(TranslateError::UnsupportedStatement(format!(
            "{} is not an insert form",
            other
        ))),
    }
}

/// `db.collection("c").insert({...})`: the literal is the document
fn shorthand(statement: &str, config: &TranslatorConfig) -> Result<Operation> {
    let call = parser::parse_shorthand(statement)?;
    if !call.cursor.is_empty() {
        return Err(TranslateError::UnsupportedStatement(format!(
            "{}() cannot be chained",
            call.method
        )));
    }

    let literal = match call.arguments.as_slice() {
        [literal] => literal,
        _ => {
            return Err(TranslateError::UnsupportedStatement(format!(
                "{}() takes exactly one document",
                call.method
            )))
        }
    };

    let document = parse_document(literal, config.lenient_commas)?;
    if !(document.is_object() || document.is_array()) {
        return Err(TranslateError::MalformedLiteral(format!(
            "expected a document or an array of documents, found {}",
            literal
        )));
    }

    debug!("shorthand {} into {}", call.method, call.collection);
    OperationBuilder::new(OperationKind::Insert)
        .collection(call.collection)
        .document(document)
        .build()
}

/// A `{...}` payload is a literal, anything else is markup
fn payload_document(payload: &str, config: &TranslatorConfig) -> Result<Document> {
    if is_delimited(payload) {
        parse_document(payload, config.lenient_commas)
    } else {
        markup_to_document(payload)
    }
}

fn insert_node(statement: &str, config: &TranslatorConfig) -> Result<Operation> {
    let stmt = parser::parse_insert_node(statement)?;

    let document = if is_delimited(&stmt.payload) {
        parse_object(&stmt.payload, config.lenient_commas)?
    } else {
        match markup_to_document(&stmt.payload)? {
            Document::Object(map) => Document::Object(map),
            scalar => wrap_scalar(None, scalar),
        }
    };

    debug!("insert node into {}", stmt.collection);
    OperationBuilder::new(OperationKind::Insert)
        .collection(stmt.collection)
        .document(document)
        .build()
}

/// `xdmp:document-insert("uri", node)`: the URI becomes the identifier
fn document_insert(statement: &str, config: &TranslatorConfig) -> Result<Operation> {
    let stmt = parser::parse_document_insert(statement)?;
    let id = Document::String(stmt.uri.clone());

    let document = match payload_document(&stmt.payload, config)? {
        Document::Object(mut map) => {
            map.insert(ID_FIELD.to_string(), id);
            Document::Object(map)
        }
        other => wrap_scalar(Some(id), other),
    };

    debug!("document insert of {}", stmt.uri);
    OperationBuilder::new(OperationKind::Insert)
        .collection_or(config.default_collection.clone())
        .document(document)
        .build()
}

fn wrap_scalar(id: Option<Document>, value: Document) -> Document {
    let mut map = Map::new();
    if let Some(id) = id {
        map.insert(ID_FIELD.to_string(), id);
    }
    map.insert(DATA_FIELD.to_string(), value);
    Document::Object(map)
}

fn sql_insert(statement: &str) -> Result<Operation> {
    let stmt = parser::parse_sql_insert(statement)?;
    if stmt.columns.len() != stmt.values.len() {
        return Err(TranslateError::MalformedLiteral(format!(
            "{} columns but {} values",
            stmt.columns.len(),
            stmt.values.len()
        )));
    }

    let mut document = Map::new();
    for (column, value) in stmt.columns.iter().zip(&stmt.values) {
        let field = PathExpression::column(column)?.resolve(&stmt.table)?;
        document.insert(field, LiteralValue::resolve(value).to_document());
    }

    debug!("sql insert into {}", stmt.table);
    OperationBuilder::new(OperationKind::Insert)
        .collection(stmt.table)
        .document(Document::Object(document))
        .build()
}
