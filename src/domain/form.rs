//! In-memory form structure.
//!
//! The [`FormTree`] is a read-only snapshot of a form's groups and questions.
//! It knows nothing about how forms are persisted; it answers the structural
//! queries (parents, ancestry, common ancestors) that addressing needs.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    num::NonZeroUsize,
};

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap, Direction};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{options::OptionSetId, Code};

/// Stable identity of a form item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
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

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The data type collected by a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Single line of free text.
    Text,
    /// Multi-line free text.
    LongText,
    /// Whole number.
    Integer,
    /// Number with a fractional part.
    Decimal,
    /// Whole number entered with increment/decrement buttons.
    Counter,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time of day.
    Datetime,
    /// One option from an option set.
    SelectOne,
    /// Any number of options from an option set.
    SelectMultiple,
    /// GPS coordinates.
    Location,
    /// Scanned barcode.
    Barcode,
    /// Photo attachment.
    Image,
    /// Audio attachment.
    Audio,
    /// Video attachment.
    Video,
}

impl QuestionType {
    /// Whether answers are chosen from an option set.
    #[must_use]
    pub const fn is_select(self) -> bool {
        matches!(self, Self::SelectOne | Self::SelectMultiple)
    }

    /// Whether answers are numbers.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal | Self::Counter)
    }

    /// Whether answers are dates, times or both.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::Datetime)
    }

    /// The name used in human readable output and configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::LongText => "long_text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Counter => "counter",
            Self::Date => "date",
            Self::Time => "time",
            Self::Datetime => "datetime",
            Self::SelectOne => "select_one",
            Self::SelectMultiple => "select_multiple",
            Self::Location => "location",
            Self::Barcode => "barcode",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group of items, possibly repeated per response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Whether the group's subtree may be instantiated more than once.
    pub repeatable: bool,
    /// Display name.
    pub name: String,
}

/// A question placed on the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// The data type collected.
    pub question_type: QuestionType,
    /// Option set used by select questions.
    pub option_set: Option<OptionSetId>,
    /// Display name.
    pub name: String,
}

/// The two kinds of form item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An internal node holding other items.
    Group(Group),
    /// A leaf question.
    Question(Question),
}

/// A single item in the form tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormNode {
    code: Code,
    rank: NonZeroUsize,
    kind: NodeKind,
}

impl FormNode {
    /// The item's code.
    #[must_use]
    pub const fn code(&self) -> &Code {
        &self.code
    }

    /// The item's one-based position among its siblings.
    #[must_use]
    pub const fn rank(&self) -> NonZeroUsize {
        self.rank
    }

    /// The item's kind.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The question data, if this item is a question.
    #[must_use]
    pub const fn as_question(&self) -> Option<&Question> {
        match &self.kind {
            NodeKind::Question(question) => Some(question),
            NodeKind::Group(_) => None,
        }
    }

    /// The group data, if this item is a group.
    #[must_use]
    pub const fn as_group(&self) -> Option<&Group> {
        match &self.kind {
            NodeKind::Group(group) => Some(group),
            NodeKind::Question(_) => None,
        }
    }

    /// Display name of the item.
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.kind {
            NodeKind::Group(group) => &group.name,
            NodeKind::Question(question) => &question.name,
        }
    }
}

/// A persisted form item, prior to assembly into a [`FormTree`].
#[derive(Debug, Clone)]
pub struct NodeRecord {
    /// Identity of the item.
    pub id: NodeId,
    /// Enclosing group, or `None` for the root.
    pub parent: Option<NodeId>,
    /// Code of the item.
    pub code: Code,
    /// Position among siblings.
    pub rank: NonZeroUsize,
    /// Item payload.
    pub kind: NodeKind,
}

/// Errors raised while assembling or querying a form tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The id does not belong to the tree.
    #[error("node {0} is not part of the form")]
    UnknownNode(NodeId),
    /// No record without a parent was supplied.
    #[error("form has no root group")]
    MissingRoot,
    /// More than one record has no parent.
    #[error("form has more than one root: {}", join_codes(.0))]
    MultipleRoots(Vec<Code>),
    /// The root record is a question.
    #[error("form root '{0}' must be a group")]
    RootNotGroup(Code),
    /// Two items share a code.
    #[error("code '{0}' is used by more than one item")]
    DuplicateCode(Code),
    /// Two siblings share a rank.
    #[error("items '{first}' and '{second}' share rank {rank}")]
    DuplicateRank {
        /// First item holding the rank.
        first: Code,
        /// Second item holding the rank.
        second: Code,
        /// The shared rank.
        rank: NonZeroUsize,
    },
    /// A parent id does not resolve.
    #[error("parent of '{0}' is not part of the form")]
    UnknownParent(Code),
    /// A parent resolves to a question.
    #[error("'{child}' is placed inside question '{parent}'")]
    ParentNotGroup {
        /// The misplaced item.
        child: Code,
        /// The question acting as parent.
        parent: Code,
    },
    /// Parent links form a loop.
    #[error("cyclic ancestry between {}", join_codes(.0))]
    Cycle(Vec<Code>),
    /// The first node is not an ancestor of the second.
    #[error("'{ancestor}' is not an ancestor of '{node}'")]
    NotAnAncestor {
        /// The supposed ancestor.
        ancestor: Code,
        /// The descendant.
        node: Code,
    },
    /// A builder method was used out of order.
    #[error("builder closed more groups than it opened")]
    Unbalanced,
    /// A builder was given an invalid code.
    #[error(transparent)]
    InvalidCode(#[from] crate::domain::code::InvalidCodeError),
}

fn join_codes(codes: &[Code]) -> String {
    codes
        .iter()
        .map(Code::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Flags for [`FormTree::path_from_ancestor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathOptions {
    /// Include the ancestor itself as the first element.
    pub include_ancestor: bool,
    /// Include the target node itself as the last element.
    pub include_self: bool,
}

impl PathOptions {
    /// Only the ancestor is added to the path.
    pub const WITH_ANCESTOR: Self = Self {
        include_ancestor: true,
        include_self: false,
    };

    /// Only the node itself is added to the path.
    pub const WITH_SELF: Self = Self {
        include_ancestor: false,
        include_self: true,
    };
}

/// A form's structure: a single root group owning nested groups and
/// questions.
///
/// Items are stored as separate components:
/// - Item data: `HashMap<NodeId, FormNode>`
/// - Code lookup: `BTreeMap<Code, NodeId>`
/// - Structure: `DiGraphMap<NodeId, ()>` with edges pointing from child to
///   parent
#[derive(Debug, Clone)]
pub struct FormTree {
    root: NodeId,
    nodes: HashMap<NodeId, FormNode>,
    code_to_id: BTreeMap<Code, NodeId>,
    graph: DiGraphMap<NodeId, ()>,
}

impl FormTree {
    /// Starts building a tree whose root group has the given code.
    #[must_use]
    pub fn builder(root_code: &str) -> FormTreeBuilder {
        FormTreeBuilder::new(root_code)
    }

    /// Assembles a tree from persisted records.
    ///
    /// # Errors
    ///
    /// Returns an error unless the records describe exactly one root group,
    /// unique codes, unique sibling ranks, and acyclic parent links between
    /// existing groups.
    #[instrument(level = "debug", skip(records), fields(count = records.len()))]
    pub fn from_records(records: Vec<NodeRecord>) -> Result<Self, TreeError> {
        let mut nodes = HashMap::with_capacity(records.len());
        let mut code_to_id = BTreeMap::new();
        let mut graph = DiGraphMap::with_capacity(records.len(), records.len());
        let mut roots = Vec::new();
        let mut parents = Vec::new();

        for record in records {
            if code_to_id.insert(record.code.clone(), record.id).is_some() {
                return Err(TreeError::DuplicateCode(record.code));
            }
            graph.add_node(record.id);
            if record.parent.is_none() {
                roots.push(record.id);
            }
            parents.extend(record.parent.map(|parent| (record.id, parent)));
            nodes.insert(
                record.id,
                FormNode {
                    code: record.code,
                    rank: record.rank,
                    kind: record.kind,
                },
            );
        }

        let root = match roots.as_slice() {
            [] => return Err(TreeError::MissingRoot),
            [root] => *root,
            many => {
                return Err(TreeError::MultipleRoots(
                    many.iter().map(|id| nodes[id].code.clone()).collect(),
                ));
            }
        };
        if nodes[&root].as_group().is_none() {
            return Err(TreeError::RootNotGroup(nodes[&root].code.clone()));
        }

        for (child, parent) in parents {
            if child == parent {
                return Err(TreeError::Cycle(vec![nodes[&child].code.clone()]));
            }
            let Some(parent_node) = nodes.get(&parent) else {
                return Err(TreeError::UnknownParent(nodes[&child].code.clone()));
            };
            if parent_node.as_group().is_none() {
                return Err(TreeError::ParentNotGroup {
                    child: nodes[&child].code.clone(),
                    parent: parent_node.code.clone(),
                });
            }
            graph.add_edge(child, parent, ());
        }

        // With one parent per item, any loop is a strongly connected component.
        for component in tarjan_scc(&graph) {
            if component.len() > 1 {
                let mut codes: Vec<_> = component.iter().map(|id| nodes[id].code.clone()).collect();
                codes.sort();
                return Err(TreeError::Cycle(codes));
            }
        }

        let tree = Self {
            root,
            nodes,
            code_to_id,
            graph,
        };
        tree.check_ranks()?;
        Ok(tree)
    }

    fn check_ranks(&self) -> Result<(), TreeError> {
        for &group in self.nodes.keys() {
            let mut seen: HashMap<NonZeroUsize, NodeId> = HashMap::new();
            for child in self.graph.neighbors_directed(group, Direction::Incoming) {
                let rank = self.nodes[&child].rank;
                if let Some(first) = seen.insert(rank, child) {
                    let (mut a, mut b) = (self.nodes[&first].code.clone(), self.nodes[&child].code.clone());
                    if b < a {
                        std::mem::swap(&mut a, &mut b);
                    }
                    return Err(TreeError::DuplicateRank {
                        first: a,
                        second: b,
                        rank,
                    });
                }
            }
        }
        Ok(())
    }

    /// The root group.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Looks up an item.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&FormNode> {
        self.nodes.get(&id)
    }

    /// Looks up an item, failing with [`TreeError::UnknownNode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the item is not part of the tree.
    pub fn get(&self, id: NodeId) -> Result<&FormNode, TreeError> {
        self.nodes.get(&id).ok_or(TreeError::UnknownNode(id))
    }

    /// Finds an item by its code.
    #[must_use]
    pub fn find_by_code(&self, code: &str) -> Option<NodeId> {
        self.code_to_id
            .iter()
            .find_map(|(c, id)| (c.as_str() == code).then_some(*id))
    }

    /// The code of an item.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is not part of the tree.
    pub fn code_of(&self, id: NodeId) -> Result<&Code, TreeError> {
        self.get(id).map(FormNode::code)
    }

    /// The group directly containing an item, or `None` for the root.
    #[must_use]
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.graph.contains_node(id) {
            return None;
        }
        self.graph.neighbors_directed(id, Direction::Outgoing).next()
    }

    /// Direct children of an item, in rank order.
    #[must_use]
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        if !self.graph.contains_node(id) {
            return Vec::new();
        }
        let mut children: Vec<_> = self
            .graph
            .neighbors_directed(id, Direction::Incoming)
            .collect();
        children.sort_by_key(|child| self.nodes[child].rank);
        children
    }

    /// The groups enclosing an item, from the root down to (not including)
    /// the item itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is unknown or its ancestry loops.
    pub fn ancestry_path(&self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        self.get(id)?;
        let mut path = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if path.len() >= self.nodes.len() {
                return Err(TreeError::Cycle(vec![self.code_of(id)?.clone()]));
            }
            path.push(parent);
            current = self.parent_of(parent);
        }
        path.reverse();
        Ok(path)
    }

    /// Number of groups enclosing an item, the root included.
    ///
    /// # Errors
    ///
    /// See [`ancestry_path`](Self::ancestry_path).
    pub fn depth_of(&self, id: NodeId) -> Result<usize, TreeError> {
        Ok(self.ancestry_path(id)?.len())
    }

    /// Whether the item sits directly inside the root group.
    ///
    /// # Errors
    ///
    /// See [`ancestry_path`](Self::ancestry_path).
    pub fn is_top_level(&self, id: NodeId) -> Result<bool, TreeError> {
        Ok(self.ancestry_path(id)? == [self.root])
    }

    /// The deepest group that is an ancestor of (or equal to) both items.
    ///
    /// # Errors
    ///
    /// See [`ancestry_path`](Self::ancestry_path).
    pub fn lowest_common_ancestor(&self, a: NodeId, b: NodeId) -> Result<NodeId, TreeError> {
        let a_chain = self.group_chain(a)?;
        let b_chain = self.group_chain(b)?;
        a_chain
            .iter()
            .zip(&b_chain)
            .take_while(|(x, y)| x == y)
            .last()
            .map(|(x, _)| *x)
            .ok_or(TreeError::MissingRoot)
    }

    /// Ancestry of an item plus the item itself when it is a group.
    fn group_chain(&self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut chain = self.ancestry_path(id)?;
        if self.get(id)?.as_group().is_some() {
            chain.push(id);
        }
        Ok(chain)
    }

    /// The items strictly between `ancestor` and `node`, outermost first.
    ///
    /// `options` controls whether the ancestor and the node itself are added
    /// at either end. When `ancestor == node` the result holds the node once
    /// if either flag is set.
    ///
    /// # Errors
    ///
    /// Returns an error if either item is unknown or `ancestor` does not
    /// enclose `node`.
    pub fn path_from_ancestor(
        &self,
        ancestor: NodeId,
        node: NodeId,
        options: PathOptions,
    ) -> Result<Vec<NodeId>, TreeError> {
        self.get(ancestor)?;
        if ancestor == node {
            let include = options.include_ancestor || options.include_self;
            return Ok(if include { vec![node] } else { Vec::new() });
        }

        let ancestry = self.ancestry_path(node)?;
        let Some(start) = ancestry.iter().position(|id| *id == ancestor) else {
            return Err(TreeError::NotAnAncestor {
                ancestor: self.code_of(ancestor)?.clone(),
                node: self.code_of(node)?.clone(),
            });
        };

        let from = if options.include_ancestor { start } else { start + 1 };
        let mut path = ancestry[from..].to_vec();
        if options.include_self {
            path.push(node);
        }
        Ok(path)
    }

    /// All items below `id` in document order, excluding `id`.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children_of(id).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children_of(next).into_iter().rev());
        }
        out
    }

    /// Every item except the root, in document order.
    #[must_use]
    pub fn document_order(&self) -> Vec<NodeId> {
        self.descendants(self.root)
    }

    /// Every question, in document order.
    pub fn questions(&self) -> impl Iterator<Item = (NodeId, &FormNode)> + '_ {
        self.document_order().into_iter().filter_map(|id| {
            let node = &self.nodes[&id];
            node.as_question().map(|_| (id, node))
        })
    }

    /// Number of items, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

/// Incrementally builds a [`FormTree`] in document order.
///
/// ```
/// use formlogic::{FormTree, QuestionType};
///
/// let tree = FormTree::builder("form")
///     .question("q1", QuestionType::Integer)
///     .repeat_group("members")
///     .question("q2", QuestionType::Text)
///     .end()
///     .build()
///     .unwrap();
///
/// let q2 = tree.find_by_code("q2").unwrap();
/// assert_eq!(tree.depth_of(q2).unwrap(), 2);
/// ```
#[derive(Debug)]
pub struct FormTreeBuilder {
    root_code: String,
    root: NodeId,
    records: Vec<(NodeId, Option<NodeId>, String, NonZeroUsize, NodeKind)>,
    open: Vec<NodeId>,
    next_rank: HashMap<NodeId, NonZeroUsize>,
    unbalanced: bool,
}

impl FormTreeBuilder {
    fn new(root_code: &str) -> Self {
        Self {
            root_code: root_code.to_string(),
            root: NodeId::new(),
            records: Vec::new(),
            open: Vec::new(),
            next_rank: HashMap::new(),
            unbalanced: false,
        }
    }

    fn push(&mut self, code: &str, kind: NodeKind) -> NodeId {
        let id = NodeId::new();
        let parent = self.open.last().copied().unwrap_or(self.root);
        let rank = self.next_rank.entry(parent).or_insert(NonZeroUsize::MIN);
        self.records
            .push((id, Some(parent), code.to_string(), *rank, kind));
        *rank = rank.saturating_add(1);
        id
    }

    /// Adds a question to the current group.
    #[must_use]
    pub fn question(self, code: &str, question_type: QuestionType) -> Self {
        self.question_with(code, question_type, None)
    }

    /// Adds a select question backed by an option set.
    #[must_use]
    pub fn select(self, code: &str, question_type: QuestionType, option_set: OptionSetId) -> Self {
        self.question_with(code, question_type, Some(option_set))
    }

    fn question_with(
        mut self,
        code: &str,
        question_type: QuestionType,
        option_set: Option<OptionSetId>,
    ) -> Self {
        self.push(
            code,
            NodeKind::Question(Question {
                question_type,
                option_set,
                name: code.to_string(),
            }),
        );
        self
    }

    /// Opens a non-repeating group inside the current group.
    #[must_use]
    pub fn group(self, code: &str) -> Self {
        self.open_group(code, false)
    }

    /// Opens a repeat group inside the current group.
    #[must_use]
    pub fn repeat_group(self, code: &str) -> Self {
        self.open_group(code, true)
    }

    fn open_group(mut self, code: &str, repeatable: bool) -> Self {
        let id = self.push(
            code,
            NodeKind::Group(Group {
                repeatable,
                name: code.to_string(),
            }),
        );
        self.open.push(id);
        self
    }

    /// Closes the most recently opened group.
    #[must_use]
    pub fn end(mut self) -> Self {
        if self.open.pop().is_none() {
            self.unbalanced = true;
        }
        self
    }

    /// Finishes the tree. Groups still open are closed implicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if a code is invalid or duplicated, or if `end` was
    /// called without a matching group.
    pub fn build(self) -> Result<FormTree, TreeError> {
        if self.unbalanced {
            return Err(TreeError::Unbalanced);
        }
        let mut records = Vec::with_capacity(self.records.len() + 1);
        records.push(NodeRecord {
            id: self.root,
            parent: None,
            code: Code::new(self.root_code.clone())?,
            rank: NonZeroUsize::MIN,
            kind: NodeKind::Group(Group {
                repeatable: false,
                name: self.root_code,
            }),
        });
        for (id, parent, code, rank, kind) in self.records {
            records.push(NodeRecord {
                id,
                parent,
                code: Code::new(code)?,
                rank,
                kind,
            });
        }
        FormTree::from_records(records)
    }
}
