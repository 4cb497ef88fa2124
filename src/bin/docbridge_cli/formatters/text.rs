use anyhow::Result;
use colored::*;
use docbridge::{Document, Operation, Route};
use crate::formatters::Formatter;

/// Formateur au format texte
pub struct TextFormatter {
    /// Indique si les couleurs sont activées
    colored: bool,
}

impl TextFormatter {
    /// Crée un nouveau formateur texte (couleurs selon le terminal et NO_COLOR)
    pub fn new() -> Self {
        TextFormatter {
            colored: colored::control::SHOULD_COLORIZE.should_colorize(),
        }
    }

    fn header(&self, operation: &str, collection: &str) -> String {
        if self.colored {
            format!("{} {}", operation.green().bold(), collection.blue())
        } else {
            format!("{} {}", operation, collection)
        }
    }

    fn label(&self, key: &str) -> String {
        if self.colored {
            format!("{}", key.yellow())
        } else {
            key.to_string()
        }
    }
}

impl Formatter for TextFormatter {
    fn format_operation(&self, operation: &Operation) -> Result<String> {
        let mut lines = vec![self.header(operation.kind().operation_name(), operation.collection())];

        if let Document::Object(parts) = operation.to_document() {
            for (key, value) in parts {
                if key == "collection" || key == "operation" {
                    continue;
                }
                lines.push(format!("  {}: {}", self.label(&key), serde_json::to_string(&value)?));
            }
        }

        Ok(lines.join("\n"))
    }

    fn format_route(&self, route: &Route) -> Result<String> {
        Ok(format!(
            "{} {}: {}  {}: {}",
            self.header(&route.kind.to_string(), route.kind.operation_name()),
            self.label("dialect"),
            route.dialect,
            self.label("form"),
            route.form
        ))
    }

    fn format_error(&self, error: &str) -> String {
        if self.colored {
            format!("{}", error.red().bold())
        } else {
            format!("Erreur: {}", error)
        }
    }

    fn format_info(&self, info: &str) -> String {
        if self.colored {
            format!("{}", info.blue())
        } else {
            format!("Info: {}", info)
        }
    }

    fn format_success(&self, success: &str) -> String {
        if self.colored {
            format!("{}", success.green().bold())
        } else {
            format!("Succès: {}", success)
        }
    }
}
