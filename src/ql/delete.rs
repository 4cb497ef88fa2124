//! Delete statements

use log::debug;

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslateError};
use crate::core::operation::{Document, Filter, Operation, OperationKind};
use crate::core::path::{PathError, PathExpression, ID_FIELD};
use crate::ql::builder::OperationBuilder;
use crate::ql::literal::parse_object;
use crate::ql::parser;
use crate::ql::predicate::{parse_conditions, FieldContext};
use crate::ql::router::StatementForm;

pub fn parse_delete(statement: &str, form: StatementForm, config: &TranslatorConfig) -> Result<Operation> {
    match form {
        StatementForm::ShorthandDelete => shorthand(statement, config),
        StatementForm::DeleteNode => delete_node(statement),
        StatementForm::DocumentDelete => document_delete(statement, config),
        StatementForm::SqlDelete => sql_delete(statement),
        other => Err(TranslateError::UnsupportedStatement(format!(
            "{} is not a delete form",
            other
        ))),
    }
}

/// `db.collection("c").remove({...})`; the filter literal is required
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
                "{}() takes exactly one filter document",
                call.method
            )))
        }
    };

    let filter = match parse_object(literal, config.lenient_commas)? {
        Document::Object(map) => Filter::from_map(map),
        _ => Filter::new(),
    };

    debug!("shorthand {} on {}", call.method, call.collection);
    OperationBuilder::new(OperationKind::Delete)
        .collection(call.collection)
        .filter(filter)
        .build()
}

fn delete_node(statement: &str) -> Result<Operation> {
    let stmt = parser::parse_node_delete(statement)?;
    let path: PathExpression = stmt.target.parse()?;
    let variable = path
        .variable()
        .ok_or_else(|| PathError::MissingVariable(stmt.target.clone()))?;

    let filter = match &stmt.condition {
        Some(clause) => parse_conditions(clause, FieldContext::Variable(variable))?,
        None => Filter::new(),
    };

    debug!("delete node {} from {:?}", path, stmt.collection);
    OperationBuilder::new(OperationKind::Delete)
        .collection_or(stmt.collection)
        .filter(filter)
        .build()
}

fn document_delete(statement: &str, config: &TranslatorConfig) -> Result<Operation> {
    let stmt = parser::parse_document_delete(statement)?;

    let mut filter = Filter::new();
    filter.insert(ID_FIELD, Document::String(stmt.uri));

    OperationBuilder::new(OperationKind::Delete)
        .collection_or(config.default_collection.clone())
        .filter(filter)
        .build()
}

fn sql_delete(statement: &str) -> Result<Operation> {
    let stmt = parser::parse_sql_delete(statement)?;

    let filter = match &stmt.condition {
        Some(clause) => parse_conditions(clause, FieldContext::Table(&stmt.table))?,
        None => Filter::new(),
    };

    debug!("sql delete from {}", stmt.table);
    OperationBuilder::new(OperationKind::Delete)
        .collection(stmt.table)
        .filter(filter)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn delete(statement: &str, form: StatementForm) -> Result<Operation> {
        parse_delete(statement, form, &TranslatorConfig::default())
    }

    #[test]
    fn test_shorthand_remove() {
        let op = delete(r#"db.collection("users").remove({"age": {"$lt": 18}})"#, StatementForm::ShorthandDelete).unwrap();
        assert_eq!(
            op.to_document(),
            json!({"collection": "users", "operation": "deleteMany", "filter": {"age": {"$lt": 18}}})
        );
    }

    #[test]
    fn test_shorthand_remove_needs_filter() {
        assert!(matches!(
            delete(r#"db.collection("users").remove()"#, StatementForm::ShorthandDelete),
            Err(TranslateError::UnsupportedStatement(_))
        ));
        assert!(matches!(
            delete(r#"db.collection("users").deleteOne("x")"#, StatementForm::ShorthandDelete),
            Err(TranslateError::MalformedLiteral(_))
        ));
    }

    #[test]
    fn test_delete_node() {
        let op = delete(
            r#"delete node $u where $u/age eq 18 in collection("users")"#,
            StatementForm::DeleteNode,
        )
        .unwrap();
        assert_eq!(op.collection(), "users");
        assert_eq!(op.filter().unwrap().clone().into_document(), json!({"age": 18}));
    }

    #[test]
    fn test_delete_node_without_condition() {
        let op = delete(r#"delete node $u in collection("users")"#, StatementForm::DeleteNode).unwrap();
        assert!(op.filter().unwrap().is_empty());
    }

    #[test]
    fn test_delete_node_failures() {
        assert!(matches!(
            delete(r#"delete node $u where $u/age eq 18"#, StatementForm::DeleteNode),
            Err(TranslateError::MissingCollection(_))
        ));
        assert!(matches!(
            delete(r#"delete node users in collection("users")"#, StatementForm::DeleteNode),
            Err(TranslateError::MalformedPath(_))
        ));
    }

    #[test]
    fn test_document_delete() {
        let config = TranslatorConfig::default().with_default_collection("docs");
        let op = parse_delete(r#"xdmp:document-delete("/a.xml")"#, StatementForm::DocumentDelete, &config).unwrap();
        assert_eq!(op.collection(), "docs");
        assert_eq!(op.filter().unwrap().get("_id"), Some(&json!("/a.xml")));
    }

    #[test]
    fn test_sql_delete() {
        let op = delete("DELETE FROM users WHERE age < 18 AND name IS NULL", StatementForm::SqlDelete).unwrap();
        assert_eq!(
            op.filter().unwrap().clone().into_document(),
            json!({"age": {"$lt": 18}, "name": null})
        );
    }
}
