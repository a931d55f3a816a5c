use std::path::PathBuf;

use clap::Parser;
use formlogic::{CompiledItem, Config};
use tracing::instrument;

use super::{OutputFormat, load_snapshot, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Compile the display logic, skip rules and constraints of a form")]
pub struct Compile {
    /// Path to a YAML or JSON form snapshot
    snapshot: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,

    /// Also list items without any logic
    #[arg(long)]
    all: bool,

    /// Describe each skip rule in plain words
    #[arg(long)]
    describe: bool,
}

impl Compile {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let snapshot = load_snapshot(&self.snapshot, config)?;
        let compiler = snapshot.compiler(config);

        let items: Vec<CompiledItem> = compiler
            .compile_form(&snapshot.rules)?
            .into_iter()
            .filter(|item| self.all || !item.is_empty())
            .collect();

        match self.output {
            OutputFormat::Pretty => {
                output_pretty(&items);
                if self.describe && !snapshot.rules.skip_rules().is_empty() {
                    println!("\n{}", "Skip rules".label());
                    for rule in snapshot.rules.skip_rules() {
                        let source = snapshot.tree.code_of(rule.source)?;
                        println!("  {}: {}", source.as_str().code(), compiler.describe_skip_rule(rule)?);
                    }
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        }

        Ok(())
    }
}

fn output_pretty(items: &[CompiledItem]) {
    if items.is_empty() {
        println!("{}", "No logic to compile".label());
        return;
    }

    for item in items {
        println!("{}", item.code.code());
        if let Some(relevant) = &item.relevant {
            println!("  {} {relevant}", "relevant:  ".label());
        }
        for constraint in &item.constraints {
            println!("  {} {}", "constraint:".label(), constraint.expression);
            if let Some(msg) = &constraint.rejection_msg {
                println!("  {} {}", "message:   ".label(), msg.warning());
            }
        }
    }
}
