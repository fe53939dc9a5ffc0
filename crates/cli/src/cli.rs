use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stagechain")]
#[command(author, version, about = "Supervise chains of piped processes")]
pub struct Cli {
    /// Project root containing the .stagechain directory
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a .stagechain directory from the bundled templates
    Init {
        /// Overwrite an existing .stagechain directory
        #[arg(long)]
        force: bool,

        /// Only write config.toml and a single command slot
        #[arg(long)]
        minimal: bool,
    },

    /// Show every configured slot and its configuration report
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start slots and supervise them until they exit or Ctrl-C
    Run {
        /// Slots to start (defaults to every fully configured slot)
        slots: Vec<String>,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Run one ad-hoc pipeline and exit with its status
    ///
    /// Stages follow `--`, separated by a lone `|` argument (quote it in the
    /// shell): stagechain exec -- seq 1 10 '|' wc -l
    Exec {
        /// File receiving the last stage's output
        #[arg(long)]
        stdout: Option<PathBuf>,

        /// Stage argv words, passed to each program exactly as given
        #[arg(last = true, required = true, value_name = "STAGES")]
        command: Vec<String>,
    },
}
