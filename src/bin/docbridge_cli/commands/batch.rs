use anyhow::{Context as _, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use docbridge::BatchDriver;
use crate::context::Context;

/// Exécute la traduction d'un fichier, une requête par ligne
pub fn execute(context: &Context, input: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Ouverture impossible de {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Création impossible de {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    };

    let formatter = context.formatter();
    let driver = BatchDriver::new(context.translator().clone());

    let summary = driver.run(reader, |outcome| {
        match &outcome.result {
            Ok(operation) => {
                let formatted = formatter
                    .format_operation(operation)
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
                writeln!(writer, "{}", formatted)?;
            }
            // Les erreurs vont sur stderr, le lot continue
            Err(e) => {
                let message = format!("ligne {}: {}: {}", outcome.line, e.kind(), e);
                eprintln!("{}", formatter.format_error(&message));
            }
        }
        Ok(())
    })?;

    writer.flush()?;

    let message = format!(
        "{} traduites, {} en échec, {} ignorées",
        summary.translated, summary.failed, summary.skipped
    );
    if summary.failed == 0 {
        eprintln!("{}", formatter.format_success(&message));
    } else if context.verbosity() > 0 || summary.translated == 0 {
        eprintln!("{}", formatter.format_info(&message));
    }

    Ok(())
}
