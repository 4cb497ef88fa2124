//! Dialect router
//!
//! Looks for structural cues in a raw statement and picks the statement
//! form to parse it with. Kinds are tried in the order Insert, Update,
//! Delete, Read and the first cue found wins; within a kind the shorthand
//! cue is tested first, then the document dialect, the MarkLogic built-ins
//! and finally the relational dialect (when enabled).

use std::fmt;

use log::debug;

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslateError};
use crate::core::operation::OperationKind;
use crate::ql::parser::shorthand_head;

/// Surface grammar of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// XQuery-like document dialect, MarkLogic built-ins included
    XQuery,
    /// SQL-like relational dialect
    Sql,
    /// `db.collection(...).method(...)` calls
    Shorthand,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::XQuery => "xquery",
            Dialect::Sql => "sql",
            Dialect::Shorthand => "shorthand",
        };
        write!(f, "{}", name)
    }
}

/// Concrete statement form picked by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementForm {
    ShorthandInsert,
    ShorthandUpdate,
    ShorthandDelete,
    ShorthandFind,
    InsertNode,
    ReplaceNode,
    ReplaceValue,
    DeleteNode,
    ForReturn,
    DocumentInsert,
    NodeReplace,
    DocumentDelete,
    DocumentGet,
    SqlInsert,
    SqlUpdate,
    SqlDelete,
    SqlSelect,
}

impl StatementForm {
    pub fn kind(&self) -> OperationKind {
        use StatementForm::*;
        match self {
            ShorthandInsert | InsertNode | DocumentInsert | SqlInsert => OperationKind::Insert,
            ShorthandUpdate | ReplaceNode | ReplaceValue | NodeReplace | SqlUpdate => OperationKind::Update,
            ShorthandDelete | DeleteNode | DocumentDelete | SqlDelete => OperationKind::Delete,
            ShorthandFind | ForReturn | DocumentGet | SqlSelect => OperationKind::Read,
        }
    }

    pub fn dialect(&self) -> Dialect {
        use StatementForm::*;
        match self {
            ShorthandInsert | ShorthandUpdate | ShorthandDelete | ShorthandFind => Dialect::Shorthand,
            SqlInsert | SqlUpdate | SqlDelete | SqlSelect => Dialect::Sql,
            _ => Dialect::XQuery,
        }
    }
}

impl fmt::Display for StatementForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use StatementForm::*;
        let name = match self {
            ShorthandInsert => "db.collection().insert()",
            ShorthandUpdate => "db.collection().update()",
            ShorthandDelete => "db.collection().remove()",
            ShorthandFind => "db.collection().find()",
            InsertNode => "insert node",
            ReplaceNode => "replace node",
            ReplaceValue => "replace value",
            DeleteNode => "delete node",
            ForReturn => "for/return",
            DocumentInsert => "xdmp:document-insert",
            NodeReplace => "xdmp:node-replace",
            DocumentDelete => "xdmp:document-delete",
            DocumentGet => "fn:doc",
            SqlInsert => "INSERT INTO",
            SqlUpdate => "UPDATE",
            SqlDelete => "DELETE FROM",
            SqlSelect => "SELECT",
        };
        write!(f, "{}", name)
    }
}

/// The router's decision for one statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub kind: OperationKind,
    pub dialect: Dialect,
    pub form: StatementForm,
}

impl From<StatementForm> for Route {
    fn from(form: StatementForm) -> Self {
        Route {
            kind: form.kind(),
            dialect: form.dialect(),
            form,
        }
    }
}

/// Lowercased view of a statement used for cue matching
struct Cues {
    lower: String,
    method: Option<String>,
}

impl Cues {
    fn new(statement: &str) -> Self {
        Cues {
            lower: statement.trim().to_ascii_lowercase(),
            method: shorthand_head(statement).map(|(_, method)| method),
        }
    }

    fn words(&self) -> Vec<&str> {
        self.lower.split_whitespace().collect()
    }

    /// `first` directly followed by a word starting with `second`
    fn has_pair(&self, first: &str, second: &str) -> bool {
        self.words()
            .windows(2)
            .any(|w| w[0] == first && w[1].starts_with(second))
    }

    fn starts_with_words(&self, expected: &[&str]) -> bool {
        let words = self.words();
        words.len() >= expected.len() && words.iter().zip(expected).all(|(w, e)| w == e)
    }

    fn method_is(&self, names: &[&str]) -> bool {
        self.method.as_deref().map_or(false, |m| names.contains(&m))
    }
}

fn insert_cue(cues: &Cues, relational: bool) -> Option<StatementForm> {
    if cues.method_is(&["insert", "insertOne", "insertMany"]) {
        return Some(StatementForm::ShorthandInsert);
    }
    if cues.has_pair("insert", "node") {
        return Some(StatementForm::InsertNode);
    }
    if cues.lower.contains("xdmp:document-insert") {
        return Some(StatementForm::DocumentInsert);
    }
    if relational && cues.starts_with_words(&["insert", "into"]) {
        return Some(StatementForm::SqlInsert);
    }
    None
}

fn update_cue(cues: &Cues, relational: bool) -> Option<StatementForm> {
    if cues.method_is(&["update", "updateOne", "updateMany"]) {
        return Some(StatementForm::ShorthandUpdate);
    }
    if cues.has_pair("replace", "value") || cues.has_pair("update", "value") {
        return Some(StatementForm::ReplaceValue);
    }
    if cues.has_pair("replace", "node") {
        return Some(StatementForm::ReplaceNode);
    }
    if cues.lower.contains("xdmp:node-replace") {
        return Some(StatementForm::NodeReplace);
    }
    if relational && cues.starts_with_words(&["update"]) && cues.words().contains(&"set") {
        return Some(StatementForm::SqlUpdate);
    }
    None
}

fn delete_cue(cues: &Cues, relational: bool) -> Option<StatementForm> {
    if cues.method_is(&["remove", "deleteOne", "deleteMany"]) {
        return Some(StatementForm::ShorthandDelete);
    }
    if cues.has_pair("delete", "node") {
        return Some(StatementForm::DeleteNode);
    }
    if cues.lower.contains("xdmp:document-delete") {
        return Some(StatementForm::DocumentDelete);
    }
    if relational && cues.starts_with_words(&["delete", "from"]) {
        return Some(StatementForm::SqlDelete);
    }
    None
}

fn read_cue(cues: &Cues, relational: bool) -> Option<StatementForm> {
    if cues.method_is(&["find"]) {
        return Some(StatementForm::ShorthandFind);
    }
    let iteration = cues
        .words()
        .windows(3)
        .any(|w| w[0] == "for" && w[1].starts_with('$') && w[2] == "in");
    if iteration {
        return Some(StatementForm::ForReturn);
    }
    if ["fn:doc(", "doc(", "xdmp:document-get("]
        .iter()
        .any(|prefix| cues.lower.starts_with(prefix))
    {
        return Some(StatementForm::DocumentGet);
    }
    if relational && cues.starts_with_words(&["select"]) {
        return Some(StatementForm::SqlSelect);
    }
    None
}

/// Pick the statement form for `statement`
pub fn route(statement: &str, config: &TranslatorConfig) -> Result<Route> {
    let cues = Cues::new(statement);
    let relational = config.relational;

    let form = insert_cue(&cues, relational)
        .or_else(|| update_cue(&cues, relational))
        .or_else(|| delete_cue(&cues, relational))
        .or_else(|| read_cue(&cues, relational));

    match form {
        Some(form) => {
            let route = Route::from(form);
            debug!("routed as {} ({} dialect, {})", route.kind, route.dialect, route.form);
            Ok(route)
        }
        None => {
            debug!("no dialect cue in statement: {}", statement);
            let detail = match cues.method {
                Some(method) => format!("unsupported collection method {}()", method),
                None => format!("no dialect cue matched: {}", statement.trim()),
            };
            Err(TranslateError::UnsupportedStatement(detail))
        }
    }
}
