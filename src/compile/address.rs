//! Cross-question addressing.
//!
//! An expression attached to one question (the host) refers to another
//! question's value through an address. When no repeat boundary has to be
//! crossed going down from the common ancestor, a relative path is enough.
//! Otherwise `indexed-repeat` names an explicit instance for every group on
//! the way, taking the host's own instance for enclosing groups and the
//! first instance for groups the host is not inside.
//!
//! A group host is its own context node, so paths into its subtree start
//! without any `..` steps.

use std::{fmt, num::NonZeroUsize};

use tracing::instrument;

use crate::{
    compile::{CompileError, Compiler},
    domain::{NodeId, PathOptions},
};

/// An absolute path such as `/data/grp1/q3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsolutePath {
    root: String,
    segments: Vec<String>,
}

impl AbsolutePath {
    /// The codes below the instance root, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn map_leaf(mut self, f: impl FnOnce(&str) -> String) -> Self {
        if let Some(leaf) = self.segments.last_mut() {
            *leaf = f(leaf);
        }
        self
    }
}

impl fmt::Display for AbsolutePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "/{}", self.root)?;
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Which instance of a repeat group an indexed address selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The instance containing the host, found by stepping `levels` parents
    /// up from the host. Zero levels is the host itself.
    Current {
        /// Number of parent steps from the host.
        levels: usize,
    },
    /// A fixed, one-based instance number.
    Fixed(NonZeroUsize),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Current { levels: 0 } => f.write_str("position(.)"),
            Self::Current { levels } => {
                let steps = vec![".."; *levels].join("/");
                write!(f, "position({steps})")
            }
            Self::Fixed(n) => write!(f, "{n}"),
        }
    }
}

/// How one question refers to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// A path from the instance root.
    Absolute(AbsolutePath),
    /// A path from the host: `up` parent steps, then codes downward.
    Relative {
        /// Number of `..` steps.
        up: usize,
        /// Codes to descend through, the target last.
        segments: Vec<String>,
    },
    /// An `indexed-repeat` call naming an instance for each group crossed.
    Indexed {
        /// Absolute path of the target question.
        target: AbsolutePath,
        /// Group paths and instance positions, outermost first.
        levels: Vec<(AbsolutePath, Position)>,
    },
}

impl Address {
    /// Retargets the address at the generated sub-question holding one level
    /// of a multilevel selection.
    #[must_use]
    pub fn for_subquestion(self, level: NonZeroUsize) -> Self {
        let suffix = |code: &str| format!("{code}_{level}");
        match self {
            Self::Absolute(path) => Self::Absolute(path.map_leaf(suffix)),
            Self::Relative { up, mut segments } => {
                if let Some(leaf) = segments.last_mut() {
                    *leaf = suffix(leaf);
                }
                Self::Relative { up, segments }
            }
            Self::Indexed { target, levels } => Self::Indexed {
                target: target.map_leaf(suffix),
                levels,
            },
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Absolute(path) => write!(f, "{path}"),
            Self::Relative { up, segments } => {
                let mut parts = vec![".."; *up];
                parts.extend(segments.iter().map(String::as_str));
                f.write_str(&parts.join("/"))
            }
            Self::Indexed { target, levels } => {
                write!(f, "indexed-repeat({target}")?;
                for (group, position) in levels {
                    write!(f, ",{group},{position}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Compiler<'_> {
    /// Absolute path of an item: the instance root followed by the codes of
    /// every enclosing group below the form root, then the item's own code.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is unknown or its ancestry is invalid.
    pub fn absolute_path(&self, id: NodeId) -> Result<AbsolutePath, CompileError> {
        let tree = self.tree;
        let path = tree.path_from_ancestor(tree.root(), id, PathOptions::WITH_SELF)?;
        let segments = path
            .into_iter()
            .map(|node| tree.code_of(node).map(ToString::to_string))
            .collect::<Result<_, _>>()?;
        Ok(AbsolutePath {
            root: self.data_root.clone(),
            segments,
        })
    }

    /// Computes how `from` refers to the question `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if either item is unknown, `to` is not a question,
    /// the ancestry is invalid, or `from` is nested deeper than the
    /// configured limit.
    #[instrument(level = "trace", skip(self))]
    pub fn resolve(&self, from: NodeId, to: NodeId) -> Result<Address, CompileError> {
        let tree = self.tree;
        self.question(to)?;

        let depth = tree.depth_of(from)?;
        if depth > self.max_depth {
            return Err(CompileError::DepthExceeded {
                limit: self.max_depth,
            });
        }

        if tree.is_top_level(to)? {
            return Ok(Address::Absolute(self.absolute_path(to)?));
        }

        let ancestor = tree.lowest_common_ancestor(from, to)?;
        // A group host enclosing the target climbs no levels.
        let self_path = if ancestor == from {
            Vec::new()
        } else {
            tree.path_from_ancestor(ancestor, from, PathOptions::WITH_ANCESTOR)?
        };
        let dest_path = tree.path_from_ancestor(ancestor, to, PathOptions::default())?;

        if dest_path.is_empty() {
            return Ok(Address::Relative {
                up: self_path.len(),
                segments: vec![tree.code_of(to)?.to_string()],
            });
        }

        let mut levels = Vec::new();
        if ancestor != tree.root() {
            let enclosing = tree.path_from_ancestor(tree.root(), ancestor, PathOptions::WITH_SELF)?;
            for (i, group) in enclosing.into_iter().enumerate() {
                levels.push((
                    self.absolute_path(group)?,
                    Position::Current {
                        levels: depth - i - 1,
                    },
                ));
            }
        }
        for group in dest_path {
            levels.push((self.absolute_path(group)?, Position::Fixed(NonZeroUsize::MIN)));
        }

        Ok(Address::Indexed {
            target: self.absolute_path(to)?,
            levels,
        })
    }
}
