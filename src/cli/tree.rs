use std::path::PathBuf;

use clap::Parser;
use formlogic::{Config, FormTree, NodeId, NodeKind};
use tracing::instrument;

use super::{load_snapshot, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Print the outline of a form")]
pub struct Tree {
    /// Path to a YAML or JSON form snapshot
    snapshot: PathBuf,
}

impl Tree {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let snapshot = load_snapshot(&self.snapshot, config)?;
        let tree = &snapshot.tree;

        println!("{}", tree.code_of(tree.root())?.as_str().code());
        print_children(tree, tree.root(), "");
        Ok(())
    }
}

fn print_children(tree: &FormTree, parent: NodeId, prefix: &str) {
    let children = tree.children_of(parent);
    for (i, child) in children.iter().enumerate() {
        let Some(node) = tree.node(*child) else {
            continue;
        };
        let last = i + 1 == children.len();
        let branch = if last { "└── " } else { "├── " };
        let label = match node.kind() {
            NodeKind::Group(group) if group.repeatable => "repeat group".warning(),
            NodeKind::Group(_) => "group".label(),
            NodeKind::Question(question) => question.question_type.as_str().label(),
        };
        println!("{prefix}{branch}{} {label}", node.code());

        let nested = format!("{prefix}{}", if last { "    " } else { "│   " });
        print_children(tree, *child, &nested);
    }
}
