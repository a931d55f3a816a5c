use std::path::PathBuf;

use clap::Parser;
use formlogic::{CompiledItem, Config, LoadedSnapshot, load_all};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use tracing::instrument;

use super::{OutputFormat, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Compile every snapshot below a directory")]
pub struct Batch {
    /// Directory containing YAML or JSON form snapshots
    dir: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Report {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Vec<CompiledItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Batch {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let reports: Vec<Report> = load_all(&self.dir, config)
            .into_par_iter()
            .map(|LoadedSnapshot { path, snapshot }| {
                let compiled = snapshot.map_err(|e| e.to_string()).and_then(|snapshot| {
                    snapshot
                        .compiler(config)
                        .compile_form(&snapshot.rules)
                        .map_err(|e| e.to_string())
                });
                let (items, error) = compiled.map_or_else(|e| (None, Some(e)), |i| (Some(i), None));
                Report { path, items, error }
            })
            .collect();

        let failed = reports.iter().filter(|report| report.error.is_some()).count();

        match self.output {
            OutputFormat::Pretty => output_pretty(&reports),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        }

        if failed > 0 {
            anyhow::bail!("{failed} of {} snapshots failed to compile", reports.len());
        }
        Ok(())
    }
}

fn output_pretty(reports: &[Report]) {
    if reports.is_empty() {
        println!("{}", "No snapshots found".label());
        return;
    }

    for report in reports {
        let path = report.path.display().to_string();
        match (&report.items, &report.error) {
            (_, Some(error)) => println!("{} {path}: {error}", "✗".warning()),
            (Some(items), None) => {
                let with_logic = items.iter().filter(|item| !item.is_empty()).count();
                println!(
                    "{} {path} {}",
                    "✓".success(),
                    format!("({with_logic} of {} items with logic)", items.len()).label()
                );
            }
            (None, None) => {}
        }
    }
}
