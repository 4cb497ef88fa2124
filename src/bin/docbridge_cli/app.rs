use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use docbridge::TranslatorConfig;

use crate::commands;
use crate::context::Context;
use crate::formatters::OutputFormat;

#[derive(Parser)]
#[command(name = "docbridge")]
#[command(about = "Traduit des requêtes XQuery, SQL ou db.collection() en opérations document", long_about = None)]
pub struct Cli {
    /// Niveau de verbosité
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Format de sortie (json, text)
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// JSON sur une seule ligne
    #[arg(long)]
    compact: bool,

    /// Fichier de configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Collection utilisée par les formes qui n'en nomment pas (xdmp:*, fn:doc)
    #[arg(long)]
    default_collection: Option<String>,

    /// Accepter le dialecte SQL
    #[arg(long)]
    sql: bool,

    /// Refuser les virgules finales dans les littéraux
    #[arg(long)]
    strict_literals: bool,

    /// Commande à exécuter
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Traduire une requête
    Translate {
        /// Requête à traduire
        statement: String,
    },

    /// Afficher le dialecte et la forme détectés
    Detect {
        /// Requête à analyser
        statement: String,
    },

    /// Traduire un fichier, une requête par ligne
    Batch {
        /// Fichier d'entrée (stdin par défaut)
        file: Option<PathBuf>,

        /// Fichier de sortie (stdout par défaut)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Charge la configuration, les options de la ligne de commande sont prioritaires
fn load_config(cli: &Cli) -> Result<TranslatorConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => TranslatorConfig::default(),
    };

    if let Some(collection) = &cli.default_collection {
        config.default_collection = Some(collection.clone());
    }
    if cli.sql {
        config.relational = true;
    }
    if cli.strict_literals {
        config.lenient_commas = false;
    }

    Ok(config)
}

fn read_config(path: &Path) -> Result<TranslatorConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Lecture impossible de {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
    Ok(config)
}

/// Exécute l'application CLI
pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    // Créer un contexte
    let context = Context::new(cli.verbose, cli.format, cli.compact, config);

    match cli.command {
        Commands::Translate { statement } => commands::translate::execute(&context, &statement),
        Commands::Detect { statement } => commands::detect::execute(&context, &statement),
        Commands::Batch { file, output } => {
            commands::batch::execute(&context, file.as_deref(), output.as_deref())
        }
    }
}
