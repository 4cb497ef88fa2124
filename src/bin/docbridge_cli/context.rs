use docbridge::{Translator, TranslatorConfig};

use crate::formatters::json::JsonFormatter;
use crate::formatters::text::TextFormatter;
use crate::formatters::{Formatter, OutputFormat};

/// Contexte d'exécution du CLI
pub struct Context {
    /// Traducteur configuré
    translator: Translator,

    /// Formateur actuel
    formatter: Box<dyn Formatter>,

    /// Niveau de verbosité
    verbosity: u8,
}

impl Context {
    /// Crée un nouveau contexte
    pub fn new(verbosity: u8, format: OutputFormat, compact: bool, config: TranslatorConfig) -> Self {
        let formatter: Box<dyn Formatter> = match format {
            OutputFormat::Text => Box::new(TextFormatter::new()),
            OutputFormat::Json if compact => Box::new(JsonFormatter::without_pretty()),
            OutputFormat::Json => Box::new(JsonFormatter::new()),
        };

        Context {
            translator: Translator::with_config(config),
            formatter,
            verbosity,
        }
    }

    /// Obtient le traducteur
    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Obtient le formateur actuel
    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    /// Obtient le niveau de verbosité
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }
}
