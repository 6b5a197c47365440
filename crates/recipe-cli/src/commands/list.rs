//! List known recipes

use colored::Colorize;

use crate::context::Context;
use crate::error::Result;

/// Run the list command
pub fn run_list(context: &Context, json: bool) -> Result<()> {
    let registry = &context.registry;

    if json {
        let entries: Vec<serde_json::Value> = registry
            .iter()
            .map(|recipe| {
                serde_json::json!({
                    "name": recipe.name,
                    "description": recipe.description,
                    "options": recipe.schema.options().len(),
                    "versions": recipe.versions.len(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", "Available Recipes".bold());
    println!();
    for recipe in registry.iter() {
        println!("  {:<14} {}", recipe.name.green(), summary(&recipe.description).dimmed());
    }
    println!();
    println!(
        "{} {} recipes available. Use {} for details.",
        "Total:".dimmed(),
        registry.len(),
        "recipe info <name>".cyan()
    );

    Ok(())
}

/// First sentence of a description.
fn summary(description: &str) -> &str {
    match description.find(". ") {
        Some(end) => &description[..=end],
        None => description,
    }
}
