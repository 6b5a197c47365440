//! Resolve a request into build flags

use colored::Colorize;
use recipe_core::{AttributeSource, Placeholders, Resolver, SourceRef, StaticAttributes};

use crate::cli::RequestArgs;
use crate::context::Context;
use crate::error::Result;

/// Options for the resolve command beyond the request itself.
#[derive(Debug, Default)]
pub struct ResolveOptions<'a> {
    pub json: bool,
    pub style: Option<&'a str>,
    pub attrs: &'a [String],
    pub version: Option<&'a str>,
}

/// Run the resolve command
///
/// Without `--attr`, environment values that depend on built dependencies
/// are printed as `${dep.attr}` placeholders.
pub fn run_resolve(
    context: &Context,
    args: &RequestArgs,
    options: ResolveOptions<'_>,
) -> Result<()> {
    let recipe = context.recipe(&args.recipe)?;
    let request = context.request(args)?;
    let style = context.flag_style(recipe, options.style)?;
    let source = recipe.source_for(options.version.or(request.version()))?;

    let attributes: Box<dyn AttributeSource> = if options.attrs.is_empty() {
        Box::new(Placeholders)
    } else {
        let mut attributes = StaticAttributes::new();
        for attr in options.attrs {
            attributes.insert_parsed(attr)?;
        }
        Box::new(attributes)
    };

    let resolution = Resolver::new(&recipe.schema).resolve(&request, &*attributes)?;
    let flags = resolution.directive.args(style);
    tracing::debug!(recipe = %recipe.name, version = %source.name, flags = flags.len(), "resolved");

    if options.json {
        let output = serde_json::json!({
            "recipe": recipe.name,
            "version": source,
            "selection": resolution.selection,
            "dependencies": resolution.dependencies,
            "args": flags,
            "env": resolution.directive.env,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let reference = match &source.source {
        SourceRef::Tag(tag) => format!("tag {tag}"),
        SourceRef::Branch(branch) => format!("branch {branch}"),
    };
    println!(
        "{}@{} {}",
        recipe.name.bold(),
        source.name.bold(),
        format!("({reference})").dimmed()
    );
    println!();
    println!("{}:", "Flags".cyan().bold());
    for arg in &flags {
        println!("  {arg}");
    }
    if !resolution.directive.env.is_empty() {
        println!();
        println!("{}:", "Environment".cyan().bold());
        for (variable, value) in &resolution.directive.env {
            println!("  {variable}={value}");
        }
    }
    if !resolution.dependencies.is_empty() {
        println!();
        println!(
            "{} {}",
            "Dependencies:".dimmed(),
            resolution.dependencies.names().join(", ")
        );
    }

    Ok(())
}
