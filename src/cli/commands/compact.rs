//! `recipe compact` command - Compact representation of a JSON array

use miette::{IntoDiagnostic, Result, WrapErr};
use serde_json::{json, Value};

use crate::cli::{Context, OutputFormat};
use crate::formatting::{compact_repr_value, compact_repr_value_set};

#[derive(clap::Args, Debug)]
pub struct CompactArgs {
    /// A JSON array, e.g. '[1, 2, 3, 4, 5]'
    pub value: String,

    /// Treat the array as a set (sorted, duplicates removed)
    #[arg(long)]
    pub set: bool,
}

pub fn run(args: CompactArgs, ctx: &Context) -> Result<()> {
    let value: Value = serde_json::from_str(&args.value)
        .into_diagnostic()
        .wrap_err("argument is not valid JSON")?;

    let repr = if args.set {
        compact_repr_value_set(&value)?
    } else {
        compact_repr_value(&value)?
    };

    match ctx.format {
        OutputFormat::Json => println!("{}", json!({ "repr": repr })),
        OutputFormat::Text => println!("{}", repr),
    }
    Ok(())
}
