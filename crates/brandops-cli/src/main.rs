#![forbid(unsafe_code)]

mod catalog;
mod cmd;
mod output;

use brandops_core::config;
use brandops_core::error::ErrorCode;
use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "bops",
    author,
    version,
    about = "bops: bulk operations over a brand asset catalog",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides --json and FORMAT).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, environment and user config.
    fn output_mode(&self, user_output: Option<&str>) -> OutputMode {
        output::resolve_output_mode(self.format, self.json, user_output)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "List the bulk actions",
        long_about = "List every bulk action with its parameter, undo support and confirmation prompt.",
        after_help = "EXAMPLES:\n    # Show the action menu\n    bops actions\n\n    # Prompts phrased for 12 items, as JSON\n    bops actions --count 12 --json"
    )]
    Actions(cmd::actions::ActionsArgs),

    #[command(
        about = "Apply one bulk action to a catalog",
        long_about = "Select items from a catalog file, validate the request, apply the action and write the catalog back.",
        after_help = "EXAMPLES:\n    # Promote two assets\n    bops apply change-status -c assets.json --ids BA-1,BA-2 --status validated\n\n    # Tag every draft\n    bops apply assign-tags -c assets.json --where status=draft --tag core,brand\n\n    # Preview a delete without touching the file\n    bops apply delete -c assets.json --all --dry-run\n\n    # Export a selection\n    bops apply export -c assets.json --where category=voice --out voice.json --json"
    )]
    Apply(cmd::apply::ApplyArgs),

    #[command(
        about = "Run several bulk commands with shared selection and undo",
        long_about = "Read selection, apply and undo commands one per line from a script or stdin.",
        after_help = "EXAMPLES:\n    # Run a script\n    bops session -c assets.json --script cleanup.bops\n\n    # Pipe commands\n    printf 'where status=draft\\napply archive\\nundo\\nsave\\n' | bops session -c assets.json --json"
    )]
    Session(cmd::session::SessionArgs),

    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    bops completions bash > ~/.local/share/bash-completion/completions/bops\n\n    # Zsh\n    bops completions zsh > ~/.zfunc/_bops"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BRANDOPS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "brandops=debug,info"
        } else {
            "brandops=info,warn"
        })
    });

    let format = env::var("BRANDOPS_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        debug!("Verbose mode enabled");
    }

    let user = match config::load_user_config() {
        Ok(user) => user,
        Err(e) => {
            let output = cli.output_mode(None);
            return Err(output::fail(
                output,
                ErrorCode::ConfigParseError,
                format!("{e:#}"),
            ));
        }
    };
    let output = cli.output_mode(user.output.as_deref());
    let project_root = env::current_dir()?;
    info!(command = ?cli.command, "starting");

    match cli.command {
        Commands::Actions(ref args) => cmd::actions::run_actions(args, output),
        Commands::Apply(ref args) => {
            cmd::apply::run_apply(args, output, cli.quiet, &project_root)
        }
        Commands::Session(ref args) => cmd::session::run_session(args, output, &project_root),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
