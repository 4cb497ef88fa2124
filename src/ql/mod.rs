//! Statement translation for docbridge
//!
//! This module turns one raw statement into a canonical operation:
//! the router picks a statement form, the pest grammar parses it, and the
//! statement parser for its kind converts the pieces.

pub mod ast;
pub mod parser;
pub mod router;
pub mod literal;
pub mod markup;
pub mod context;
pub mod predicate;
pub mod builder;
pub mod insert;
pub mod update;
pub mod delete;
pub mod read;

use log::debug;

use crate::core::config::TranslatorConfig;
use crate::core::errors::Result;
use crate::core::operation::{Operation, OperationKind};

pub use context::Bindings;
pub use router::{route, Dialect, Route, StatementForm};

/// Translate a statement with the given configuration
pub fn translate(statement: &str, config: &TranslatorConfig) -> Result<Operation> {
    let route = router::route(statement, config)?;
    let statement = statement.trim();

    let operation = match route.kind {
        OperationKind::Insert => insert::parse_insert(statement, route.form, config),
        OperationKind::Update => update::parse_update(statement, route.form, config),
        OperationKind::Delete => delete::parse_delete(statement, route.form, config),
        OperationKind::Read => read::parse_read(statement, route.form, config),
    }?;

    debug!("translated into {} on {}", operation.kind().operation_name(), operation.collection());
    Ok(operation)
}
