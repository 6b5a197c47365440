//! Show a recipe's schema

use colored::Colorize;
use recipe_core::{ConstraintKind, OptionKind, OptionSpec, Projection, Recipe};

use crate::context::Context;
use crate::error::Result;

/// Run the info command
pub fn run_info(context: &Context, name: &str, json: bool) -> Result<()> {
    let recipe = context.recipe(name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info_json(recipe))?);
        return Ok(());
    }

    println!("{}", recipe.name.bold());
    if !recipe.description.is_empty() {
        println!("  {}", recipe.description);
    }
    println!();
    if let Some(homepage) = &recipe.homepage {
        println!("  {:<12} {}", "Homepage:".dimmed(), homepage);
    }
    if let Some(git) = &recipe.git {
        println!("  {:<12} {}", "Git:".dimmed(), git);
    }
    if let Some(preferred) = recipe.preferred_version() {
        println!("  {:<12} {}", "Preferred:".dimmed(), preferred.name);
    }
    println!("  {:<12} {}", "Flag style:".dimmed(), recipe.flag_style);
    println!();

    println!("{}:", "Options".cyan().bold());
    for spec in recipe.schema.options() {
        println!(
            "  {:<18} {:<6} default {}{}",
            spec.name.green(),
            spec.kind.label(),
            spec.default.to_string().yellow(),
            legal_values(&spec.kind)
        );
        if !spec.description.is_empty() {
            println!("  {:<18} {}", "", spec.description.dimmed());
        }
        if let Some(gate) = &spec.gate {
            println!("  {:<18} only when {}", "", gate.to_string().cyan());
        }
    }
    println!();

    if !recipe.schema.constraints().is_empty() {
        println!("{}:", "Constraints".cyan().bold());
        for constraint in recipe.schema.constraints() {
            println!("  {} {}", "!".red(), constraint.id);
            if !constraint.message.is_empty() {
                println!("    {}", constraint.message.dimmed());
            }
        }
        println!();
    }

    if !recipe.schema.rules().is_empty() {
        println!("{}:", "Dependency rules".cyan().bold());
        for rule in recipe.schema.rules() {
            println!("  {} {}", "+".green(), rule.id);
            for assignment in &rule.env {
                println!(
                    "    {} {}={}",
                    "env".dimmed(),
                    assignment.variable,
                    assignment.value
                );
            }
        }
    }

    Ok(())
}

fn legal_values(kind: &OptionKind) -> String {
    match kind {
        OptionKind::Choice { values } | OptionKind::Multi { values } => {
            format!(" ({})", values.join(", "))
        }
        OptionKind::Int {
            min: None,
            max: None,
        } => String::new(),
        OptionKind::Int { min, max } => format!(
            " ({}..{})",
            min.map(|v| v.to_string()).unwrap_or_default(),
            max.map(|v| v.to_string()).unwrap_or_default()
        ),
        OptionKind::Bool => String::new(),
    }
}

fn option_json(spec: &OptionSpec) -> serde_json::Value {
    let flag = match &spec.projection {
        Projection::None => serde_json::Value::Null,
        Projection::Derived(_) => serde_json::json!({ "style": "derived" }),
        Projection::Toggle {
            key, explicit_off, ..
        } => serde_json::json!({
            "style": if *explicit_off { "switch" } else { "toggle" },
            "key": key,
        }),
        Projection::Assign { key, .. } => serde_json::json!({ "style": "assign", "key": key }),
        Projection::Map { key, .. } => serde_json::json!({ "style": "map", "key": key }),
    };
    serde_json::json!({
        "name": spec.name,
        "kind": spec.kind.label(),
        "default": spec.default,
        "values": spec.kind.legal_values(),
        "description": spec.description,
        "when": spec.gate.as_ref().map(ToString::to_string),
        "flag": flag,
    })
}

fn info_json(recipe: &Recipe) -> serde_json::Value {
    let constraints: Vec<serde_json::Value> = recipe
        .schema
        .constraints()
        .iter()
        .map(|constraint| {
            let kind = match constraint.kind {
                ConstraintKind::Conflicts { .. } => "conflicts",
                ConstraintKind::Requires { .. } => "requires",
            };
            serde_json::json!({
                "id": constraint.id,
                "kind": kind,
                "message": constraint.message,
            })
        })
        .collect();
    let rules: Vec<serde_json::Value> = recipe
        .schema
        .rules()
        .iter()
        .map(|rule| {
            serde_json::json!({
                "id": rule.id,
                "when": rule.when.to_string(),
                "spec": rule.spec,
                "env": rule.env,
            })
        })
        .collect();

    serde_json::json!({
        "name": recipe.name,
        "description": recipe.description,
        "homepage": recipe.homepage,
        "git": recipe.git,
        "flag_style": recipe.flag_style,
        "preferred_version": recipe.preferred_version().map(|v| v.name.as_str()),
        "options": recipe.schema.options().iter().map(option_json).collect::<Vec<_>>(),
        "constraints": constraints,
        "rules": rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_core::builtin::legion;

    #[test]
    fn json_describes_every_option() {
        let recipe = legion().unwrap();
        let value = info_json(&recipe);

        let options = value["options"].as_array().unwrap();
        assert_eq!(options.len(), recipe.schema.options().len());

        let network = options.iter().find(|o| o["name"] == "network").unwrap();
        assert_eq!(network["flag"]["style"], "map");
        assert_eq!(network["default"], "none");

        let arch = options.iter().find(|o| o["name"] == "cuda_arch").unwrap();
        assert_eq!(arch["when"], "+cuda");
        assert_eq!(arch["default"], serde_json::json!(["70"]));
    }

    #[test]
    fn int_range_rendering() {
        assert_eq!(
            legal_values(&OptionKind::Int {
                min: Some(1),
                max: None
            }),
            " (1..)"
        );
        assert_eq!(legal_values(&OptionKind::Bool), "");
    }
}
