//! `recipe validate` command - Validate documents against a schema

use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::helpers::{resolve_schema, schema_validator};
use crate::cli::{Context, OutputFormat};
use crate::schema::{SchemaError, SchemaValidator, Violation};

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Schema file (JSON/YAML), common identifier or common schema name
    pub schema: String,

    /// Documents to validate (JSON or YAML)
    #[arg(required = true)]
    pub documents: Vec<PathBuf>,

    /// Show summary only, don't show individual errors
    #[arg(long)]
    pub summary: bool,
}

/// Outcome for one document
struct Outcome {
    path: PathBuf,
    result: std::result::Result<(), String>,
    violations: Vec<Violation>,
}

pub fn run(args: ValidateArgs, ctx: &Context) -> Result<()> {
    let schema = resolve_schema(&args.schema)?;
    let validator = schema_validator(schema, &ctx.config)?;

    let show_progress = ctx.format == OutputFormat::Text && !ctx.quiet;
    if show_progress {
        println!(
            "{} Validating {} file(s) against {}...\n",
            style("→").blue(),
            args.documents.len(),
            style(&args.schema).cyan()
        );
    }

    let mut outcomes = Vec::with_capacity(args.documents.len());
    for path in &args.documents {
        let outcome = check_document(&validator, path);
        if show_progress && !args.summary {
            print_outcome(&outcome);
        }
        outcomes.push(outcome);
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();

    match ctx.format {
        OutputFormat::Json => {
            let files: Vec<_> = outcomes
                .iter()
                .map(|o| {
                    json!({
                        "file": o.path.display().to_string(),
                        "valid": o.result.is_ok(),
                        "error": o.result.as_ref().err(),
                        "violations": o.violations.iter().map(|v| json!({
                            "instance_path": v.instance_path,
                            "schema_path": v.schema_path,
                            "rule": v.rule,
                            "message": v.message,
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect();
            let report = json!({
                "schema": args.schema,
                "checked": outcomes.len(),
                "passed": outcomes.len() - failed,
                "failed": failed,
                "files": files,
            });
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
        OutputFormat::Text if !ctx.quiet => {
            println!();
            println!("{}", style("─".repeat(60)).dim());
            println!(
                "Files checked: {}  passed: {}  failed: {}",
                style(outcomes.len()).cyan(),
                style(outcomes.len() - failed).green(),
                if failed > 0 {
                    style(failed).red()
                } else {
                    style(failed).green()
                }
            );
        }
        OutputFormat::Text => {}
    }

    if failed > 0 {
        return Err(miette::miette!(
            "{} of {} document(s) failed validation",
            failed,
            outcomes.len()
        ));
    }
    Ok(())
}

fn check_document(validator: &SchemaValidator, path: &Path) -> Outcome {
    let name = path.display().to_string();
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return Outcome {
                path: path.to_path_buf(),
                result: Err(e.to_string()),
                violations: Vec::new(),
            }
        }
    };

    match validator.validate_yaml(&content, &name) {
        Ok(_) => {
            debug!(file = %name, "document valid");
            Outcome {
                path: path.to_path_buf(),
                result: Ok(()),
                violations: Vec::new(),
            }
        }
        Err(e) => {
            let violations = e.violations().to_vec();
            let summary = match &e {
                SchemaError::Document(_) | SchemaError::Validation { .. } => {
                    format!("{} violation(s)", violations.len())
                }
                other => other.to_string(),
            };
            Outcome {
                path: path.to_path_buf(),
                result: Err(summary),
                violations,
            }
        }
    }
}

fn print_outcome(outcome: &Outcome) {
    match &outcome.result {
        Ok(()) => println!("{} {}", style("✓").green(), outcome.path.display()),
        Err(summary) => {
            println!(
                "{} {} - {}",
                style("✗").red(),
                outcome.path.display(),
                summary
            );
            for violation in &outcome.violations {
                println!("  {}", style(violation).red());
                if let Some(help) = &violation.help {
                    println!("      {} {}", style("help:").cyan(), help);
                }
            }
        }
    }
}
