//! Parse trees for docbridge statements
//!
//! One node per accepted statement form. Clause bodies are kept as text:
//! the statement parsers hand them to the predicate, literal and markup
//! converters.

/// `db.collection("c").method(args)[.cursor(args)]*`
#[derive(Debug, Clone, PartialEq)]
pub struct ShorthandCall {
    /// Target collection
    pub collection: String,
    /// Method called on the collection
    pub method: String,
    /// Raw argument texts, trimmed
    pub arguments: Vec<String>,
    /// Chained cursor calls (`sort`, `limit`)
    pub cursor: Vec<CursorStep>,
}

/// A chained cursor call
#[derive(Debug, Clone, PartialEq)]
pub struct CursorStep {
    pub method: String,
    pub arguments: Vec<String>,
}

/// `insert node <payload> into collection("c")`
#[derive(Debug, Clone, PartialEq)]
pub struct InsertNode {
    pub payload: String,
    pub collection: String,
}

/// `replace node ...` / `replace value of node ...` / `update value ...`
#[derive(Debug, Clone, PartialEq)]
pub struct NodeUpdate {
    /// Path of the node being replaced
    pub target: String,
    /// Replacement expression text
    pub replacement: String,
    pub condition: Option<String>,
    pub collection: Option<String>,
}

/// `delete node $v [where ...] [in collection("c")]`
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDelete {
    pub target: String,
    pub condition: Option<String>,
    pub collection: Option<String>,
}

/// `for $v in collection("c") [where ...] [order by ...] [return ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct ForReturn {
    /// Iteration variable, without the `$`
    pub variable: String,
    pub collection: String,
    pub condition: Option<String>,
    pub order: Option<String>,
    pub returns: Option<String>,
}

/// `xdmp:document-insert("uri", <payload>)`
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInsert {
    pub uri: String,
    pub payload: String,
}

/// `xdmp:node-replace(doc("uri")//field, <value>)`
#[derive(Debug, Clone, PartialEq)]
pub struct NodeReplace {
    pub uri: String,
    /// Dotted field path addressed below the document, if any
    pub field: Option<String>,
    pub replacement: String,
}

/// A built-in that only names a document URI (`fn:doc`, `xdmp:document-delete`)
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRef {
    pub uri: String,
}

/// `INSERT INTO t (cols) VALUES (vals)`
#[derive(Debug, Clone, PartialEq)]
pub struct SqlInsert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

/// `UPDATE t SET col = v, ... [WHERE ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct SqlUpdate {
    pub table: String,
    pub assignments: Vec<(String, String)>,
    pub condition: Option<String>,
}

/// `DELETE FROM t [WHERE ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct SqlDelete {
    pub table: String,
    pub condition: Option<String>,
}

/// `SELECT cols FROM t [WHERE ...] [ORDER BY ...] [LIMIT n]`
#[derive(Debug, Clone, PartialEq)]
pub struct SqlSelect {
    pub table: String,
    /// `None` for `*`
    pub columns: Option<Vec<String>>,
    pub condition: Option<String>,
    /// Column and optional direction keyword
    pub order: Vec<(String, Option<String>)>,
    pub limit: Option<u64>,
}
