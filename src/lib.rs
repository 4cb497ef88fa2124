//! docbridge: CRUD statement translation for document stores
//!
//! This crate reads statements written in an XQuery-like document dialect,
//! a SQL-like relational dialect or the `db.collection(...)` shorthand, and
//! translates each one into a single canonical operation for a
//! document-oriented data store.

pub mod core;
pub mod ql;
pub mod batch;

pub use crate::core::config::TranslatorConfig;

/// Main API for docbridge
#[derive(Debug, Clone, Default)]
pub struct Translator {
    config: TranslatorConfig,
}

impl Translator {
    /// Create a translator with the default configuration
    pub fn new() -> Self {
        Translator {
            config: TranslatorConfig::default(),
        }
    }

    /// Create a translator with the given configuration
    pub fn with_config(config: TranslatorConfig) -> Self {
        Translator { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Detect the dialect and statement form without translating
    pub fn route(&self, statement: &str) -> Result<Route> {
        ql::route(statement, &self.config)
    }

    /// Translate one statement into a canonical operation
    pub fn translate(&self, statement: &str) -> Result<Operation> {
        ql::translate(statement, &self.config)
    }
}

// Ré-exporter les types principaux pour faciliter l'utilisation
pub use crate::core::path::{PathExpression, PathError, ID_FIELD};
pub use crate::core::value::LiteralValue;
pub use crate::core::operation::{Document, Filter, Operation, OperationKind, OrderSpec, ProjectionSpec, SortDirection, UpdateSpec};
pub use crate::core::errors::{Result, TranslateError};
pub use ql::{Bindings, Dialect, Route, StatementForm};
pub use ql::builder::OperationBuilder;
pub use batch::{BatchDriver, BatchSummary, StatementOutcome};
