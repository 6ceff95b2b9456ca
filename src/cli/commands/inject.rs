//! `recipe inject` command - Inject key/value pairs into a template

use miette::{IntoDiagnostic, Result};
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::helpers::{parse_key_value, read_document, schema_validator};
use crate::cli::{Context, OutputFormat};
use crate::schema::CommonSchemas;
use crate::templating::{KeyValue, Recipe};

#[derive(clap::Args, Debug)]
pub struct InjectArgs {
    /// Template with `{name}` placeholders
    #[arg(required_unless_present = "recipe")]
    pub template: Option<String>,

    /// Value for a placeholder (repeatable)
    #[arg(long = "keyvalue", short = 'k', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub keyvalues: Vec<KeyValue>,

    /// Recipe file (YAML/JSON) with `template` and `keyvalues`
    #[arg(long, conflicts_with_all = ["template", "keyvalues"])]
    pub recipe: Option<PathBuf>,
}

pub fn run(args: InjectArgs, ctx: &Context) -> Result<()> {
    let recipe = match (args.recipe, args.template) {
        (Some(path), _) => load_recipe(&path, ctx)?,
        (None, Some(template)) => Recipe::new(template, args.keyvalues),
        (None, None) => return Err(miette::miette!("a template or --recipe is required")),
    };

    let injected = recipe.inject()?;

    match ctx.format {
        OutputFormat::Json => {
            let out = json!({
                "template": recipe.template,
                "keyvalues": recipe.keyvalues,
                "result": injected,
            });
            println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
        }
        OutputFormat::Text => println!("{}", injected),
    }
    Ok(())
}

/// Read a recipe file, checking it against the template recipe schema first
fn load_recipe(path: &std::path::Path, ctx: &Context) -> Result<Recipe> {
    let (content, _) = read_document(path)?;
    let validator = schema_validator(CommonSchemas::template_recipe().clone(), &ctx.config)?;
    let document = validator.validate_yaml(&content, &path.display().to_string())?;
    debug!(path = %path.display(), "recipe matches template_recipe");
    serde_json::from_value(document).into_diagnostic()
}
