//! Rules that own condition groups.
//!
//! Every [`ConditionGroup`] on a form belongs to exactly one rule: the
//! display logic of an item, a skip rule, or a question constraint.

use std::collections::HashMap;

use crate::domain::{ConditionGroup, NodeId};

/// When an item is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DisplayLogic {
    /// The item is always shown.
    #[default]
    Always,
    /// The item is shown when the group holds.
    When(ConditionGroup),
}

/// Where a skip rule jumps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Another item later in the form.
    Item(NodeId),
    /// Past the last item of the form.
    End,
}

/// When a skip rule fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipWhen {
    /// The skip always happens.
    Always,
    /// The skip happens when the group holds.
    When(ConditionGroup),
}

/// Skips every item between `source` and `destination` once `source` has
/// been answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRule {
    /// The item carrying the rule.
    pub source: NodeId,
    /// The first item that is no longer skipped.
    pub destination: Destination,
    /// Whether the skip is conditional.
    pub when: SkipWhen,
}

/// A validation rule on a question's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// The constrained question.
    pub question: NodeId,
    /// The answer is accepted when this group holds.
    pub accept_if: ConditionGroup,
    /// Message shown when the answer is rejected.
    pub rejection_msg: Option<String>,
}

/// All rules of a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormRules {
    display: HashMap<NodeId, DisplayLogic>,
    skip_rules: Vec<SkipRule>,
    constraints: Vec<Constraint>,
}

impl FormRules {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display logic of an item.
    pub fn set_display(&mut self, item: NodeId, logic: DisplayLogic) {
        self.display.insert(item, logic);
    }

    /// Adds a skip rule.
    pub fn add_skip_rule(&mut self, rule: SkipRule) {
        self.skip_rules.push(rule);
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Display logic of an item; items without logic are always shown.
    #[must_use]
    pub fn display(&self, item: NodeId) -> &DisplayLogic {
        const ALWAYS: &DisplayLogic = &DisplayLogic::Always;
        self.display.get(&item).unwrap_or(ALWAYS)
    }

    /// Every skip rule, in the order added.
    #[must_use]
    pub fn skip_rules(&self) -> &[SkipRule] {
        &self.skip_rules
    }

    /// Constraints on one question, in the order added.
    pub fn constraints_for(&self, question: NodeId) -> impl Iterator<Item = &Constraint> + '_ {
        self.constraints
            .iter()
            .filter(move |constraint| constraint.question == question)
    }

    /// Every constraint, in the order added.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Whether the form has no rules at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display.is_empty() && self.skip_rules.is_empty() && self.constraints.is_empty()
    }
}
