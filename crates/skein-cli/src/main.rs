mod cmd_check;
mod cmd_extract;
mod cmd_pending;
mod cmd_resolve;
mod cmd_resolved;
mod cmd_undo;

use clap::{Parser, Subcommand};
use skein_store::Store;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skein", version, about = "Pending-thread memory across coding sessions")]
struct Cli {
    /// Storage root (defaults to $SKEIN_HOME, else the per-user data dir)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract and persist a session record (hook entrypoint)
    Extract {
        /// Session identifier supplied by the hosting runtime
        #[arg(long)]
        session_id: String,
        /// Working directory of the session
        #[arg(long)]
        cwd: PathBuf,
        /// Path to the session transcript (JSONL)
        #[arg(long)]
        transcript: PathBuf,
    },
    /// List pending threads, oldest first
    Pending {
        /// Include threads that already have a resolution
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score pending threads against recent accomplishments and resolve confirmed matches
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a pending thread by free-text search
    Resolve {
        /// Search text (matched by substring, then token overlap)
        text: Vec<String>,
    },
    /// List resolved threads grouped by project
    Resolved {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a resolution, returning its thread to pending
    Undo {
        /// Search text over existing resolutions
        text: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SKEIN_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = match cli.store {
        Some(root) => Store::new(root),
        None => Store::open_default(),
    };

    match cli.cmd {
        Command::Extract {
            session_id,
            cwd,
            transcript,
        } => cmd_extract::execute(&store, &session_id, &cwd, &transcript),
        Command::Pending { all, json } => cmd_pending::execute(&store, all, json),
        Command::Check { json } => cmd_check::execute(&store, json),
        Command::Resolve { text } => cmd_resolve::execute(&store, &text.join(" ")),
        Command::Resolved { json } => cmd_resolved::execute(&store, json),
        Command::Undo { text } => cmd_undo::execute(&store, &text.join(" ")),
    }
}
