use std::path::{Path, PathBuf};

mod address;
mod batch;
mod compile;
mod terminal;
mod tree;

use address::Address;
use batch::Batch;
use clap::ArgAction;
use compile::Compile;
use formlogic::{Config, FormSnapshot};
use tree::Tree;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = match &self.config {
            Some(path) => Config::load(path).map_err(|e| anyhow::anyhow!("{e}"))?,
            None => Config::default(),
        };

        self.command.run(&config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Compile every rule in a snapshot
    ///
    /// Prints the relevance and constraint expressions of each item that
    /// carries logic.
    Compile(Compile),

    /// Print how one question refers to another
    Address(Address),

    /// Print the outline of a form
    Tree(Tree),

    /// Compile every snapshot below a directory
    Batch(Batch),
}

impl Command {
    fn run(self, config: &Config) -> anyhow::Result<()> {
        match self {
            Self::Compile(command) => command.run(config),
            Self::Address(command) => command.run(config),
            Self::Tree(command) => command.run(config),
            Self::Batch(command) => command.run(config),
        }
    }
}

/// Output format shared by the commands that print compiled logic.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

fn load_snapshot(path: &Path, config: &Config) -> anyhow::Result<FormSnapshot> {
    FormSnapshot::load(path, config)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {e}", path.display()))
}
