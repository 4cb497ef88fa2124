use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use docbridge::{Operation, Route};
use crate::formatters::Formatter;

/// Formateur au format JSON
pub struct JsonFormatter {
    /// Indique si l'indentation est activée
    pretty: bool,
}

impl JsonFormatter {
    /// Crée un nouveau formateur JSON
    pub fn new() -> Self {
        JsonFormatter {
            pretty: true,
        }
    }

    /// Désactive l'indentation
    pub fn without_pretty() -> Self {
        JsonFormatter {
            pretty: false,
        }
    }

    fn render<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }

    fn message(&self, key: &str, text: &str) -> String {
        self.render(&json!({ key: text }))
            .unwrap_or_else(|_| format!("{{\"{}\":\"{}\"}}", key, text))
    }
}

impl Formatter for JsonFormatter {
    fn format_operation(&self, operation: &Operation) -> Result<String> {
        Ok(self.render(operation)?)
    }

    fn format_route(&self, route: &Route) -> Result<String> {
        let json_value = json!({
            "kind": route.kind.to_string(),
            "dialect": route.dialect.to_string(),
            "form": route.form.to_string(),
            "operation": route.kind.operation_name(),
        });
        Ok(self.render(&json_value)?)
    }

    fn format_error(&self, error: &str) -> String {
        self.message("error", error)
    }

    fn format_info(&self, info: &str) -> String {
        self.message("info", info)
    }

    fn format_success(&self, success: &str) -> String {
        self.message("success", success)
    }
}
