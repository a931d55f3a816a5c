use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{NodeId, OptionNodeId};

/// Comparison operators available to conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Equal to.
    Eq,
    /// Not equal to.
    Neq,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Geq,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Leq,
    /// Selection includes (select multiple).
    Inc,
    /// Selection does not include (select multiple).
    Ninc,
}

impl Operator {
    /// The infix symbol used when comparing scalar values, if the operator
    /// is a comparison.
    #[must_use]
    pub const fn symbol(self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("="),
            Self::Neq => Some("!="),
            Self::Gt => Some(">"),
            Self::Geq => Some(">="),
            Self::Lt => Some("<"),
            Self::Leq => Some("<="),
            Self::Inc | Self::Ninc => None,
        }
    }

    /// English phrase used in human readable rule descriptions.
    #[must_use]
    pub const fn phrase(self) -> &'static str {
        match self {
            Self::Eq => "is equal to",
            Self::Neq => "is not equal to",
            Self::Gt => "is greater than",
            Self::Geq => "is greater than or equal to",
            Self::Lt => "is less than",
            Self::Leq => "is less than or equal to",
            Self::Inc => "includes",
            Self::Ninc => "does not include",
        }
    }

    /// The operator's name as written in snapshot files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Geq => "geq",
            Self::Lt => "lt",
            Self::Leq => "leq",
            Self::Inc => "inc",
            Self::Ninc => "ninc",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A literal typed by the form designer.
    Value(String),
    /// An option from the left question's option set.
    Option(OptionNodeId),
    /// Another question's answer.
    Question(NodeId),
}

/// A single comparison between a question's answer and an operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// The question whose answer is tested.
    pub left: NodeId,
    /// How the answer is compared.
    pub op: Operator,
    /// What the answer is compared against.
    pub operand: Operand,
}

impl Condition {
    /// Compares `left` against a literal value.
    #[must_use]
    pub fn value(left: NodeId, op: Operator, value: impl Into<String>) -> Self {
        Self {
            left,
            op,
            operand: Operand::Value(value.into()),
        }
    }

    /// Compares `left` against an option.
    #[must_use]
    pub const fn option(left: NodeId, op: Operator, option: OptionNodeId) -> Self {
        Self {
            left,
            op,
            operand: Operand::Option(option),
        }
    }

    /// Compares `left` against another question's answer.
    #[must_use]
    pub const fn question(left: NodeId, op: Operator, right: NodeId) -> Self {
        Self {
            left,
            op,
            operand: Operand::Question(right),
        }
    }
}

/// How the members of a condition group combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrueIf {
    /// Every member must hold.
    #[default]
    AllMet,
    /// At least one member must hold.
    AnyMet,
}

impl TrueIf {
    /// The boolean operator joining compiled members.
    #[must_use]
    pub const fn joiner(self) -> &'static str {
        match self {
            Self::AllMet => " and ",
            Self::AnyMet => " or ",
        }
    }

    /// The conjunction used in human readable descriptions.
    #[must_use]
    pub const fn conjunction(self) -> &'static str {
        match self {
            Self::AllMet => "AND",
            Self::AnyMet => "OR",
        }
    }
}

/// A member of a condition group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    /// A leaf comparison.
    Condition(Condition),
    /// A nested group.
    Group(ConditionGroup),
}

impl From<Condition> for Member {
    fn from(condition: Condition) -> Self {
        Self::Condition(condition)
    }
}

impl From<ConditionGroup> for Member {
    fn from(group: ConditionGroup) -> Self {
        Self::Group(group)
    }
}

/// A boolean combination of conditions and nested groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionGroup {
    /// How members combine.
    pub true_if: TrueIf,
    /// Whether the combined result is inverted.
    pub negate: bool,
    /// Members, in authored order.
    pub members: Vec<Member>,
}

impl ConditionGroup {
    /// A group that holds when every member holds.
    #[must_use]
    pub fn all<I, M>(members: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Member>,
    {
        Self {
            true_if: TrueIf::AllMet,
            negate: false,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// A group that holds when any member holds.
    #[must_use]
    pub fn any<I, M>(members: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Member>,
    {
        Self {
            true_if: TrueIf::AnyMet,
            ..Self::all(members)
        }
    }

    /// Inverts the group.
    #[must_use]
    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Whether the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Every leaf condition in the group, depth first.
    #[must_use]
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        let mut stack: Vec<&Member> = self.members.iter().rev().collect();
        while let Some(member) = stack.pop() {
            match member {
                Member::Condition(condition) => out.push(condition),
                Member::Group(group) => stack.extend(group.members.iter().rev()),
            }
        }
        out
    }
}
