use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use folio::{commands, diagnostics, logger, watch};

#[derive(Parser)]
#[command(name = "folio", about = "Render a terminal-themed portfolio from plain-text content")]
struct Cli {
    /// Site root holding folio.toml, the shell, and the content directory.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Silence status lines on stderr.
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every section and write the finished page
    Render {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Report discarded blocks and unresolved link tokens
    Check,
    /// Print the dossier for one sub-skill tile
    Reveal {
        /// Skill name, as written in `@skill:`
        parent: String,
        /// Sub-skill name
        child: String,
    },
    /// Print the dialect reference and current site state
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render, then re-render whenever content changes
    Watch {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Exit code for errors that stop a command outright.
const RUNTIME_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::set_quiet(cli.quiet);
    let root = cli.root.as_path();

    let result = match cli.command {
        Commands::Render { out } => commands::render(root, out.as_deref()),
        Commands::Check => commands::check(root),
        Commands::Reveal { parent, child } => commands::reveal(root, &parent, &child),
        Commands::Info { json } => commands::info(root, json).map(|()| ExitCode::SUCCESS),
        Commands::Watch { out } => watch::run(root, out.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(RUNTIME_ERROR)
        },
    }
}
