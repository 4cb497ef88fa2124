//! Translator configuration

use serde::{Deserialize, Serialize};

/// Settings that change how statements are translated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Collection for statement forms that never name one
    /// (`xdmp:document-insert`, `fn:doc`, ...)
    pub default_collection: Option<String>,
    /// Route SQL-like statements (off by default)
    pub relational: bool,
    /// Tolerate a trailing comma before `}` or `]` in document literals
    pub lenient_commas: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        TranslatorConfig {
            default_collection: None,
            relational: false,
            lenient_commas: true,
        }
    }
}

impl TranslatorConfig {
    /// Set the fallback collection
    pub fn with_default_collection<S: Into<String>>(mut self, collection: S) -> Self {
        self.default_collection = Some(collection.into());
        self
    }

    /// Enable or disable the relational dialect
    pub fn with_relational(mut self, enabled: bool) -> Self {
        self.relational = enabled;
        self
    }
}
