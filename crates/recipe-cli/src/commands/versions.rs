//! List a recipe's versions

use colored::Colorize;
use recipe_core::SourceRef;

use crate::context::Context;
use crate::error::Result;

/// Run the versions command
pub fn run_versions(context: &Context, name: &str, json: bool) -> Result<()> {
    let recipe = context.recipe(name)?;
    let preferred = recipe.preferred_version().map(|v| v.name.as_str());

    if json {
        let output = serde_json::json!({
            "recipe": recipe.name,
            "preferred": preferred,
            "versions": recipe.versions,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {}", "Versions of".bold(), recipe.name.bold());
    println!();
    for version in &recipe.versions {
        let (kind, reference) = match &version.source {
            SourceRef::Tag(tag) => ("tag", tag),
            SourceRef::Branch(branch) => ("branch", branch),
        };
        let marker = if preferred == Some(version.name.as_str()) {
            "*".green().bold()
        } else {
            " ".normal()
        };
        println!(
            "  {} {:<10} {:<7} {}",
            marker,
            version.name,
            kind.dimmed(),
            reference
        );
    }
    if let Some(git) = &recipe.git {
        println!();
        println!("  {:<12} {}", "Repository:".dimmed(), git);
    }

    Ok(())
}
