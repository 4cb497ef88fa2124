pub mod formatter;
pub mod text;
pub mod json;

pub use formatter::Formatter;
use clap::ValueEnum;

/// Formats de sortie disponibles
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Format JSON
    Json,

    /// Format texte
    Text,
}
