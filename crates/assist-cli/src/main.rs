mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "assist",
    about = "Project assistant: check context documents for coherence and drive text generation",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .assist/, context/ or .git/)
    #[arg(long, global = true, env = "ASSIST_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .assist/config.yaml and a skeleton context document
    Init,

    /// Check the context document for coherence issues
    Analyze {
        /// Document to analyze (default: context_file from config)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Suppress advisories of this category (repeatable)
        #[arg(long = "ignore", value_name = "CATEGORY")]
        ignore: Vec<String>,
    },

    /// Write decisions into the document, then re-analyze
    Apply {
        /// Decision to apply, e.g. tech_stack_backend=Node.js (repeatable)
        #[arg(long = "choose", value_name = "CATEGORY=OPTION", required = true)]
        choose: Vec<String>,

        /// Suppress advisories of this category in the re-analysis
        #[arg(long = "ignore", value_name = "CATEGORY")]
        ignore: Vec<String>,

        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Interactive review: resolve findings one by one, then apply
    Review {
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Route a task through the prompt modules and run the generator
    Generate {
        /// Task text, e.g. "doc: ..." or "refactor: consigne :: code"
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,

        /// Write the generated text to this file instead of streaming it
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Inspect and validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
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
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Analyze { file, ignore } => {
            cmd::analyze::run(&root, file.as_deref(), &ignore, cli.json)
        }
        Commands::Apply {
            choose,
            ignore,
            file,
        } => cmd::apply::run(&root, file.as_deref(), &choose, &ignore, cli.json),
        Commands::Review { file } => cmd::review::run(&root, file.as_deref(), cli.json),
        Commands::Generate { task, output } => {
            cmd::generate::run(&root, &task.join(" "), output.as_deref(), cli.json)
        }
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
