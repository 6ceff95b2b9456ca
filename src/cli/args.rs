//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    compact::CompactArgs, completions::CompletionsArgs, expand::ExpandArgs, inject::InjectArgs,
    schema::SchemaCommands, validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "recipe")]
#[command(author, version, about = "Recipe Kit")]
#[command(
    long_about = "Validate documents against schemas with built-in common schemas, and inject key/value recipes into templates."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format (default: from config, else text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate documents against a schema
    Validate(ValidateArgs),

    /// Inject key/value pairs into a template
    Inject(InjectArgs),

    /// Expand a template over every combination of candidate values
    Expand(ExpandArgs),

    /// Inspect the built-in common schemas
    #[command(subcommand)]
    Schema(SchemaCommands),

    /// Compact representation of a JSON array
    Compact(CompactArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format for command results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON (for programming)
    Json,
}

impl OutputFormat {
    /// Resolve the effective format from the flag and the configured default
    pub fn resolve(flag: Option<OutputFormat>, configured: Option<&str>) -> OutputFormat {
        flag.or_else(|| configured.and_then(|s| OutputFormat::from_str(s, true).ok()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_resolution() {
        assert_eq!(OutputFormat::resolve(None, None), OutputFormat::Text);
        assert_eq!(OutputFormat::resolve(None, Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::resolve(None, Some("bogus")), OutputFormat::Text);
        assert_eq!(
            OutputFormat::resolve(Some(OutputFormat::Text), Some("json")),
            OutputFormat::Text
        );
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
