use std::path::PathBuf;

use clap::Parser;
use formlogic::Config;
use tracing::instrument;

use super::load_snapshot;

#[derive(Debug, Parser)]
#[command(about = "Print the expression one question uses to refer to another")]
pub struct Address {
    /// Path to a YAML or JSON form snapshot
    snapshot: PathBuf,

    /// Code of the item evaluating the expression
    from: String,

    /// Code of the question being referred to
    to: String,
}

impl Address {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let snapshot = load_snapshot(&self.snapshot, config)?;
        let find = |code: &str| {
            snapshot
                .tree
                .find_by_code(code)
                .ok_or_else(|| anyhow::anyhow!("No item with code '{code}'"))
        };

        let address = snapshot
            .compiler(config)
            .resolve(find(&self.from)?, find(&self.to)?)?;
        println!("{address}");
        Ok(())
    }
}
