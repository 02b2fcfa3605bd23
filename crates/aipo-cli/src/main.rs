mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "aipo",
    about = "Operator tooling for AIPO program folders — weekly reviews, validation, command stubs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Repository root holding programs/ (default: auto-detect)
    #[arg(long, global = true, env = "AIPO_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON where supported
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the weekly review report for a program
    Review {
        /// Project directory name under programs/
        #[arg(long, conflicts_with = "path")]
        project: Option<String>,

        /// Direct path to a program folder (must contain layer.yaml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Report language for headings and labels
        #[arg(long, env = "AIPO_LANG", default_value = "auto")]
        lang: String,

        /// Output file (default: <program>/weekly_review/weekly_review_<date>.md)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Validate a program folder's descriptor files
    Validate {
        /// Project directory name under programs/
        #[arg(long, conflicts_with = "path")]
        project: Option<String>,

        /// Direct path to a program folder
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Generate command stub files from tasks.yaml
    GenerateCommands {
        /// Project directory name under programs/
        #[arg(long, conflicts_with = "path")]
        project: Option<String>,

        /// Direct path to a program folder
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite existing command files
        #[arg(long)]
        overwrite: bool,

        /// Also generate stubs for command=null tasks
        #[arg(long)]
        include_management: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Review {
            project,
            path,
            lang,
            out,
        } => cmd::review::run(
            &root,
            project.as_deref(),
            path.as_deref(),
            &lang,
            out,
            cli.json,
        ),
        Commands::Validate { project, path } => {
            cmd::validate::run(&root, project.as_deref(), path.as_deref(), cli.json)
        }
        Commands::GenerateCommands {
            project,
            path,
            overwrite,
            include_management,
        } => cmd::commands::run(
            &root,
            project.as_deref(),
            path.as_deref(),
            overwrite,
            include_management,
            cli.json,
        ),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
