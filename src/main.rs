use clap::Parser;
use miette::Result;
use recipekit::cli::Cli;
use recipekit::core::Config;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const ENV_LOG: &str = "RECIPE_LOG";

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    recipekit::cli::run(cli, Config::load())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("recipekit=debug")
    } else {
        EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
