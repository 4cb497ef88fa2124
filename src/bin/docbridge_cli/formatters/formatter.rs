use anyhow::Result;
use docbridge::{Operation, Route};

/// Trait définissant un formateur de sortie
pub trait Formatter {
    /// Formate une opération traduite
    fn format_operation(&self, operation: &Operation) -> Result<String>;

    /// Formate le résultat de la détection du dialecte
    fn format_route(&self, route: &Route) -> Result<String>;

    /// Formate un message d'erreur
    fn format_error(&self, error: &str) -> String;

    /// Formate un message d'information
    fn format_info(&self, info: &str) -> String;

    /// Formate un message de succès
    fn format_success(&self, success: &str) -> String;
}
