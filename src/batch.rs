//! Line-oriented batch translation
//!
//! One statement per line. Blank lines and comment lines (`#` or `--`) are
//! skipped; a statement that fails to translate is logged and the batch
//! goes on with the next line.

use std::io::{self, BufRead};

use log::{info, warn};

use crate::core::errors::Result;
use crate::core::operation::Operation;
use crate::Translator;

/// Comment prefixes of a batch file
pub const COMMENT_PREFIXES: &[&str] = &["#", "--"];

/// Translation result of one batch line
#[derive(Debug, Clone, PartialEq)]
pub struct StatementOutcome {
    /// 1-based line number in the input
    pub line: usize,
    pub statement: String,
    pub result: Result<Operation>,
}

/// Counters of a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub translated: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.translated + self.failed + self.skipped
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchDriver {
    translator: Translator,
}

impl BatchDriver {
    pub fn new(translator: Translator) -> Self {
        BatchDriver { translator }
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Check whether a line carries no statement
    pub fn is_skipped(line: &str) -> bool {
        let line = line.trim();
        line.is_empty() || COMMENT_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
    }

    /// Translate every statement line of `reader`, handing each outcome to
    /// `sink`. Only I/O errors (from the reader or the sink) stop the batch.
    pub fn run<R, F>(&self, reader: R, mut sink: F) -> io::Result<BatchSummary>
    where
        R: BufRead,
        F: FnMut(StatementOutcome) -> io::Result<()>,
    {
        let mut summary = BatchSummary::default();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if Self::is_skipped(&line) {
                summary.skipped += 1;
                continue;
            }

            let statement = line.trim().to_string();
            let result = self.translator.translate(&statement);
            match &result {
                Ok(_) => summary.translated += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!("line {}: {} ({})", index + 1, e, e.kind());
                }
            }

            sink(StatementOutcome {
                line: index + 1,
                statement,
                result,
            })?;
        }

        info!(
            "batch done: {} translated, {} failed, {} skipped",
            summary.translated, summary.failed, summary.skipped
        );
        Ok(summary)
    }
}
