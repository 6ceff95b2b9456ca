//! `recipe expand` command - Every combination of candidate values

use miette::{IntoDiagnostic, Result};
use serde_json::json;

use crate::cli::helpers::parse_key_values;
use crate::cli::{Context, OutputFormat};
#[allow(deprecated)]
use crate::templating::CartesianInjector;
use crate::templating::KeyValues;

#[derive(clap::Args, Debug)]
pub struct ExpandArgs {
    /// Template with `{name}` placeholders
    pub template: String,

    /// Candidate values for a placeholder, comma separated (repeatable)
    #[arg(long = "keyvalues", short = 'k', value_name = "KEY=V1,V2", value_parser = parse_key_values)]
    pub keyvalues: Vec<KeyValues>,

    /// Print only the first combination
    #[arg(long)]
    pub first: bool,
}

#[allow(deprecated)]
pub fn run(args: ExpandArgs, ctx: &Context) -> Result<()> {
    let injector = CartesianInjector::new(&args.template)?;

    if args.first {
        let first = injector.construct_string(&args.keyvalues)?;
        match ctx.format {
            OutputFormat::Json => println!("{}", json!([first])),
            OutputFormat::Text => println!("{}", first),
        }
        return Ok(());
    }

    let expansions = injector.expansions(&args.keyvalues)?;
    match ctx.format {
        OutputFormat::Json => {
            let results: Vec<String> = expansions.collect();
            println!("{}", serde_json::to_string_pretty(&results).into_diagnostic()?);
        }
        // streamed, the product can be too large to hold
        OutputFormat::Text => {
            for line in expansions {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
