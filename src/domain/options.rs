//! Option sets for select questions.
//!
//! An [`OptionSet`] is a forest of [`OptionNode`]s. Single level sets only
//! have root nodes; multilevel (cascading) sets nest options, and each level
//! of nesting becomes its own sub-question when the form is rendered.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable identity of an option set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OptionSetId(Uuid);

impl OptionSetId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for OptionSetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OptionSetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of a node within an option set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OptionNodeId(Uuid);

impl OptionNodeId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OptionNodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OptionNodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A selectable option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionNode {
    id: OptionNodeId,
    token: String,
    name: String,
    parent: Option<OptionNodeId>,
    depth: usize,
}

impl OptionNode {
    /// The node's identifier.
    #[must_use]
    pub const fn id(&self) -> OptionNodeId {
        self.id
    }

    /// The value the rendering engine stores when this option is chosen.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Human readable label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The enclosing option, if this is not a top-level option.
    #[must_use]
    pub const fn parent(&self) -> Option<OptionNodeId> {
        self.parent
    }

    /// Zero-based level of the option within its set.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }
}

/// Errors raised while assembling an option set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionSetError {
    /// Two options in the same set share a token.
    #[error("option set '{set}' contains token '{token}' more than once")]
    DuplicateToken {
        /// Name of the option set.
        set: String,
        /// The repeated token.
        token: String,
    },
    /// An option references a parent that is not part of the set.
    #[error("option '{token}' in set '{set}' has an unknown parent")]
    UnknownParent {
        /// Name of the option set.
        set: String,
        /// Token of the orphaned option.
        token: String,
    },
    /// `close` was called more often than `open`.
    #[error("option set '{0}' closes more levels than it opens")]
    Unbalanced(String),
}

/// A hierarchical set of options shared by one or more select questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    id: OptionSetId,
    name: String,
    nodes: HashMap<OptionNodeId, OptionNode>,
    /// Children of each node in rank order; `None` holds the top level.
    children: HashMap<Option<OptionNodeId>, Vec<OptionNodeId>>,
}

impl OptionSet {
    /// Starts building a set with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> OptionSetBuilder {
        OptionSetBuilder {
            id: OptionSetId::new(),
            name: name.into(),
            entries: Vec::new(),
            open: Vec::new(),
            unbalanced: false,
        }
    }

    /// The set's identifier.
    #[must_use]
    pub const fn id(&self) -> OptionSetId {
        self.id
    }

    /// The set's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a node belonging to this set.
    #[must_use]
    pub fn node(&self, id: OptionNodeId) -> Option<&OptionNode> {
        self.nodes.get(&id)
    }

    /// Finds a node by its token.
    #[must_use]
    pub fn find_by_token(&self, token: &str) -> Option<&OptionNode> {
        self.nodes.values().find(|node| node.token == token)
    }

    /// Top-level options in rank order.
    pub fn roots(&self) -> impl Iterator<Item = &OptionNode> + '_ {
        self.children_of(None)
    }

    /// Direct children of an option (or the top level for `None`) in rank
    /// order.
    pub fn children_of(&self, parent: Option<OptionNodeId>) -> impl Iterator<Item = &OptionNode> + '_ {
        self.children
            .get(&parent)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
    }

    /// The chain of options enclosing `id`, outermost first, excluding `id`.
    #[must_use]
    pub fn ancestry(&self, id: OptionNodeId) -> Vec<OptionNodeId> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(&id).and_then(OptionNode::parent);
        while let Some(parent) = current {
            path.push(parent);
            current = self.nodes.get(&parent).and_then(OptionNode::parent);
        }
        path.reverse();
        path
    }

    /// Number of levels in the set.
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.nodes
            .values()
            .map(|node| node.depth + 1)
            .max()
            .unwrap_or(0)
    }

    /// Whether selections are made through cascading levels.
    #[must_use]
    pub fn is_multilevel(&self) -> bool {
        self.level_count() > 1
    }

    /// Number of options in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the set has no options.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A raw option record, as persisted: token, label and optional parent.
#[derive(Debug, Clone)]
pub struct OptionRecord {
    /// Identifier of the option.
    pub id: OptionNodeId,
    /// Stored value of the option.
    pub token: String,
    /// Human readable label.
    pub name: String,
    /// Enclosing option, if any.
    pub parent: Option<OptionNodeId>,
}

/// Incrementally builds an [`OptionSet`].
///
/// Options are added at the current level; [`open`](Self::open) adds an
/// option and descends into it, [`close`](Self::close) returns to the
/// enclosing level.
#[derive(Debug)]
pub struct OptionSetBuilder {
    id: OptionSetId,
    name: String,
    entries: Vec<OptionRecord>,
    open: Vec<OptionNodeId>,
    unbalanced: bool,
}

impl OptionSetBuilder {
    /// Uses a fixed identifier for the set.
    #[must_use]
    pub const fn with_id(mut self, id: OptionSetId) -> Self {
        self.id = id;
        self
    }

    /// Adds an option at the current level.
    #[must_use]
    pub fn option(mut self, token: impl Into<String>, name: impl Into<String>) -> Self {
        self.push(token.into(), name.into());
        self
    }

    /// Adds an option at the current level and descends into it.
    #[must_use]
    pub fn open(mut self, token: impl Into<String>, name: impl Into<String>) -> Self {
        let id = self.push(token.into(), name.into());
        self.open.push(id);
        self
    }

    /// Returns to the enclosing level.
    #[must_use]
    pub fn close(mut self) -> Self {
        if self.open.pop().is_none() {
            self.unbalanced = true;
        }
        self
    }

    fn push(&mut self, token: String, name: String) -> OptionNodeId {
        let id = OptionNodeId::new();
        self.entries.push(OptionRecord {
            id,
            token,
            name,
            parent: self.open.last().copied(),
        });
        id
    }

    /// Finishes the set.
    ///
    /// # Errors
    ///
    /// Returns an error if tokens repeat or levels are unbalanced.
    pub fn build(self) -> Result<OptionSet, OptionSetError> {
        if self.unbalanced {
            return Err(OptionSetError::Unbalanced(self.name));
        }
        OptionSet::from_records(self.id, self.name, self.entries)
    }
}

impl OptionSet {
    /// Assembles a set from persisted records, listed in rank order.
    ///
    /// Parents may appear after their children; depths are computed once all
    /// records are known.
    ///
    /// # Errors
    ///
    /// Returns an error if tokens repeat or a parent is missing.
    pub fn from_records(
        id: OptionSetId,
        name: String,
        records: Vec<OptionRecord>,
    ) -> Result<Self, OptionSetError> {
        let parents: HashMap<OptionNodeId, Option<OptionNodeId>> =
            records.iter().map(|r| (r.id, r.parent)).collect();

        let mut nodes = HashMap::with_capacity(records.len());
        let mut children: HashMap<Option<OptionNodeId>, Vec<OptionNodeId>> = HashMap::new();
        let mut tokens = std::collections::HashSet::new();

        for record in records {
            if !tokens.insert(record.token.clone()) {
                return Err(OptionSetError::DuplicateToken {
                    set: name,
                    token: record.token,
                });
            }

            // Walk up to the top level; the bound guards against parent loops.
            let mut depth = 0;
            let mut current = record.parent;
            while let Some(parent) = current {
                let Some(next) = parents.get(&parent) else {
                    return Err(OptionSetError::UnknownParent {
                        set: name,
                        token: record.token,
                    });
                };
                depth += 1;
                if depth > parents.len() {
                    return Err(OptionSetError::UnknownParent {
                        set: name,
                        token: record.token,
                    });
                }
                current = *next;
            }

            children.entry(record.parent).or_default().push(record.id);
            nodes.insert(
                record.id,
                OptionNode {
                    id: record.id,
                    token: record.token,
                    name: record.name,
                    parent: record.parent,
                    depth,
                },
            );
        }

        Ok(Self {
            id,
            name,
            nodes,
            children,
        })
    }
}

/// All option sets referenced by a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionCatalog {
    sets: HashMap<OptionSetId, OptionSet>,
}

impl OptionCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a set, replacing any set with the same id.
    pub fn insert(&mut self, set: OptionSet) {
        self.sets.insert(set.id, set);
    }

    /// Looks up a set.
    #[must_use]
    pub fn get(&self, id: OptionSetId) -> Option<&OptionSet> {
        self.sets.get(&id)
    }

    /// Finds a set by name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&OptionSet> {
        self.sets.values().find(|set| set.name == name)
    }

    /// Looks up a node, verifying that it belongs to the given set.
    #[must_use]
    pub fn node(&self, set: OptionSetId, node: OptionNodeId) -> Option<&OptionNode> {
        self.sets.get(&set)?.node(node)
    }

    /// Iterates over all sets.
    pub fn iter(&self) -> impl Iterator<Item = &OptionSet> + '_ {
        self.sets.values()
    }
}

impl FromIterator<OptionSet> for OptionCatalog {
    fn from_iter<T: IntoIterator<Item = OptionSet>>(iter: T) -> Self {
        Self {
            sets: iter.into_iter().map(|set| (set.id, set)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geography() -> OptionSet {
        OptionSet::builder("Geography")
            .open("on1", "Canada")
            .option("on2", "Ontario")
            .option("on3", "Quebec")
            .close()
            .open("on4", "Kenya")
            .option("on5", "Nairobi")
            .close()
            .build()
            .unwrap()
    }

    #[test]
    fn single_level_set_has_depth_zero_options() {
        let set = OptionSet::builder("Yes/No")
            .option("on1", "Yes")
            .option("on2", "No")
            .build()
            .unwrap();

        assert_eq!(set.level_count(), 1);
        assert!(!set.is_multilevel());
        assert!(set.roots().all(|node| node.depth() == 0));
        let names: Vec<_> = set.roots().map(OptionNode::name).collect();
        assert_eq!(names, ["Yes", "No"]);
    }

    #[test]
    fn nested_options_record_depth_and_ancestry() {
        let set = geography();
        assert_eq!(set.level_count(), 2);
        assert!(set.is_multilevel());

        let canada = set.find_by_token("on1").unwrap();
        let quebec = set.find_by_token("on3").unwrap();
        assert_eq!(quebec.depth(), 1);
        assert_eq!(quebec.parent(), Some(canada.id()));
        assert_eq!(set.ancestry(quebec.id()), vec![canada.id()]);

        let provinces: Vec<_> = set
            .children_of(Some(canada.id()))
            .map(OptionNode::token)
            .collect();
        assert_eq!(provinces, ["on2", "on3"]);
    }

    #[test]
    fn duplicate_tokens_are_rejected() {
        let err = OptionSet::builder("Dupes")
            .option("on1", "A")
            .option("on1", "B")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            OptionSetError::DuplicateToken {
                set: "Dupes".to_string(),
                token: "on1".to_string()
            }
        );
    }

    #[test]
    fn unbalanced_close_is_rejected() {
        let err = OptionSet::builder("Broken").close().build().unwrap_err();
        assert_eq!(err, OptionSetError::Unbalanced("Broken".to_string()));
    }

    #[test]
    fn records_with_missing_parent_are_rejected() {
        let orphan = OptionRecord {
            id: OptionNodeId::new(),
            token: "on9".to_string(),
            name: "Orphan".to_string(),
            parent: Some(OptionNodeId::new()),
        };
        let err = OptionSet::from_records(OptionSetId::new(), "Set".to_string(), vec![orphan])
            .unwrap_err();
        assert!(matches!(err, OptionSetError::UnknownParent { .. }));
    }

    #[test]
    fn catalog_only_finds_nodes_in_their_own_set() {
        let geo = geography();
        let other = OptionSet::builder("Other").option("on9", "X").build().unwrap();
        let node = geo.find_by_token("on2").unwrap().id();
        let (geo_id, other_id) = (geo.id(), other.id());

        let catalog: OptionCatalog = [geo, other].into_iter().collect();

        assert!(catalog.node(geo_id, node).is_some());
        assert!(catalog.node(other_id, node).is_none());
        assert_eq!(catalog.find_by_name("Other").unwrap().id(), other_id);
    }
}
