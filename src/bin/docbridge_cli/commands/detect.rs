use anyhow::Result;
use crate::context::Context;

/// Exécute la commande de détection du dialecte
pub fn execute(context: &Context, statement: &str) -> Result<()> {
    let route = context.translator().route(statement)?;

    let formatted = context.formatter().format_route(&route)?;
    println!("{}", formatted);

    Ok(())
}
