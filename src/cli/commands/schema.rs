//! `recipe schema` command - Inspect the built-in common schemas

use clap::Subcommand;
use miette::{IntoDiagnostic, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::truncate_str;
use crate::cli::{Context, OutputFormat};
use crate::formatting::data_print;
use crate::schema::{CommonSchemas, BASE_ID};

#[derive(Subcommand, Debug)]
pub enum SchemaCommands {
    /// List every common schema identifier
    List,

    /// Show one common schema
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Short name (`base`, `s3_uri`, ...) or identifier (`/schemas/common/base/s3_uri`)
    pub name: String,

    /// Print the raw JSON schema instead of a summary
    #[arg(long)]
    pub raw: bool,
}

pub fn run(cmd: SchemaCommands, ctx: &Context) -> Result<()> {
    match cmd {
        SchemaCommands::List => list_schemas(ctx),
        SchemaCommands::Show(args) => show_schema(args, ctx),
    }
}

fn list_schemas(ctx: &Context) -> Result<()> {
    let ids = CommonSchemas::ids();

    if ctx.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&ids).into_diagnostic()?);
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["ID", "TYPE", "DESCRIPTION"]);
    for id in &ids {
        let Some(schema) = CommonSchemas::get(id) else {
            continue;
        };
        let kind = if id == BASE_ID {
            "collection".to_string()
        } else {
            type_str(schema)
        };
        let desc = schema["description"].as_str().unwrap_or("");
        builder.push_record([id.clone(), kind, truncate_str(desc, 50)]);
    }
    println!("{}", builder.build().with(Style::sharp()));

    if !ctx.quiet {
        println!("\nUse 'recipe schema show <name>' for details");
    }
    Ok(())
}

fn show_schema(args: ShowArgs, ctx: &Context) -> Result<()> {
    let Some(schema) = CommonSchemas::get(&args.name).or_else(|| CommonSchemas::by_name(&args.name))
    else {
        return Err(miette::miette!(
            help = format!("available: {}", CommonSchemas::names().join(", ")),
            "unknown common schema: {}",
            args.name
        ));
    };

    if args.raw || ctx.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(schema).into_diagnostic()?);
        return Ok(());
    }

    let keywords = ["$id", "type", "pattern", "format", "minLength", "uniqueItems"];
    let mut summary: Vec<(&str, Value)> = keywords
        .iter()
        .filter_map(|k| schema.get(*k).map(|v| (*k, v.clone())))
        .collect();
    if let Some(desc) = schema.get("description") {
        summary.push(("description", desc.clone()));
    }
    for line in data_print(&summary) {
        println!("{}", line);
    }

    if let Some(defs) = schema["$defs"].as_object() {
        println!("\nFragments:");
        print_members(defs, &[], |name| format!("{BASE_ID}/{name}"));
    }

    if let Some(props) = schema["properties"].as_object() {
        let required: Vec<&str> = schema["required"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        println!("\nFields:");
        print_members(props, &required, |_| String::new());
    }

    if let Some(item_props) = schema["items"]["properties"].as_object() {
        let required: Vec<&str> = schema["items"]["required"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        println!("\nItem fields:");
        print_members(item_props, &required, |_| String::new());
    }

    println!("\nUse --raw for the full JSON schema");
    Ok(())
}

fn print_members(
    members: &serde_json::Map<String, Value>,
    required: &[&str],
    note: impl Fn(&str) -> String,
) {
    // Sort for consistent display
    let sorted: BTreeMap<_, _> = members.iter().collect();

    let mut builder = Builder::default();
    builder.push_record(["NAME", "TYPE", "REQ", "NOTE"]);
    for (name, prop) in sorted {
        let req = if required.contains(&name.as_str()) {
            "yes"
        } else {
            ""
        };
        let note = match prop.get("$ref").and_then(Value::as_str) {
            Some(target) => format!("-> {}", target),
            None => note(name),
        };
        builder.push_record([name.clone(), type_str(prop), req.to_string(), note]);
    }
    println!("{}", builder.build().with(Style::sharp()));
}

fn type_str(prop: &Value) -> String {
    match prop["type"].as_str() {
        Some("array") => match prop["items"]["type"].as_str() {
            Some(items_type) => format!("{}[]", items_type),
            None => "array".to_string(),
        },
        Some(t) => t.to_string(),
        None if prop.get("$ref").is_some() => "ref".to_string(),
        None => "any".to_string(),
    }
}
