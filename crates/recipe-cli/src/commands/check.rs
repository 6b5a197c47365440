//! Validate a request against a recipe

use colored::Colorize;
use recipe_core::Resolver;

use crate::cli::RequestArgs;
use crate::context::Context;
use crate::error::Result;

/// Run the check command
///
/// Prints the merged selection, marking values that differ from the
/// option's default. A constraint violation is returned as an error.
pub fn run_check(context: &Context, args: &RequestArgs) -> Result<()> {
    let recipe = context.recipe(&args.recipe)?;
    let request = context.request(args)?;
    let selection = Resolver::new(&recipe.schema).validate(&request)?;

    println!(
        "{} {} request is valid",
        "OK".green().bold(),
        recipe.name.bold()
    );
    println!();
    for spec in recipe.schema.options() {
        let Some(value) = selection.get(&spec.name) else {
            continue;
        };
        let rendered = value.to_string();
        if *value == spec.default {
            println!("  {:<18} {}", spec.name, rendered.dimmed());
        } else {
            println!("  {:<18} {}", spec.name.green(), rendered.yellow());
        }
    }
    if let Some(compiler) = selection.compiler() {
        println!("  {:<18} {}", "%compiler", compiler.cyan());
    }

    Ok(())
}
