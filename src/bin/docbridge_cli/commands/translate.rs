use anyhow::Result;
use crate::context::Context;

/// Exécute la commande de traduction
pub fn execute(context: &Context, statement: &str) -> Result<()> {
    // Traduire la requête
    let operation = context.translator().translate(statement)?;

    // Formater et afficher le résultat
    let formatted = context.formatter().format_operation(&operation)?;
    println!("{}", formatted);

    Ok(())
}
