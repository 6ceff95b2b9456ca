//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod helpers;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};

use miette::Result;

use crate::core::Config;

/// Per-invocation context shared by every command
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Context {
    pub fn new(global: &GlobalOpts, config: Config) -> Self {
        let format = OutputFormat::resolve(global.format, config.default_format.as_deref());
        Self {
            config,
            format,
            quiet: global.quiet,
        }
    }
}

/// Dispatch a parsed command line
pub fn run(cli: Cli, config: Config) -> Result<()> {
    let ctx = Context::new(&cli.global, config);

    match cli.command {
        Commands::Validate(args) => commands::validate::run(args, &ctx),
        Commands::Inject(args) => commands::inject::run(args, &ctx),
        Commands::Expand(args) => commands::expand::run(args, &ctx),
        Commands::Schema(cmd) => commands::schema::run(cmd, &ctx),
        Commands::Compact(args) => commands::compact::run(args, &ctx),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
