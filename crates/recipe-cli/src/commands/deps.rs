//! Show the dependency set a request resolves to

use colored::Colorize;
use recipe_core::Resolver;

use crate::cli::RequestArgs;
use crate::context::Context;
use crate::error::Result;

/// Run the deps command
pub fn run_deps(context: &Context, args: &RequestArgs, json: bool) -> Result<()> {
    let recipe = context.recipe(&args.recipe)?;
    let request = context.request(args)?;
    let resolver = Resolver::new(&recipe.schema);
    let selection = resolver.validate(&request)?;
    let dependencies = resolver.resolve_dependencies(&selection)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dependencies)?);
        return Ok(());
    }

    println!("{} {}", "Dependencies of".bold(), recipe.name.bold());
    println!();
    if dependencies.is_empty() {
        println!("  {}", "(none)".dimmed());
        return Ok(());
    }
    for dependency in dependencies.iter() {
        let types: Vec<String> = dependency.spec.types.iter().map(ToString::to_string).collect();
        println!(
            "  {} {}",
            dependency.spec.to_string().green(),
            format!("[{}]", types.join(", ")).dimmed()
        );
        for rule in &dependency.rules {
            println!("    {} {}", "from".dimmed(), rule);
        }
    }

    Ok(())
}
