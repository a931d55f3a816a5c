//! Human readable rendering of conditions and skip rules.

use crate::{
    compile::{CompileError, Compiler, OperandProblem},
    domain::{Condition, ConditionGroup, Destination, Member, NodeId, Operand, SkipRule, SkipWhen},
};

impl Compiler<'_> {
    /// Describes a condition, e.g. `[q1] is equal to 'Yes'`.
    ///
    /// Options are shown by name.
    ///
    /// # Errors
    ///
    /// Returns an error if an item or option cannot be found.
    pub fn describe_condition(&self, condition: &Condition) -> Result<String, CompileError> {
        let (left, question) = self.question(condition.left)?;
        let operand = match &condition.operand {
            Operand::Value(raw) => format!("'{raw}'"),
            Operand::Question(right) => format!("[{}]", self.tree.code_of(*right)?),
            Operand::Option(option) => {
                let malformed = |problem| CompileError::MalformedOperand {
                    condition: left.code().clone(),
                    problem,
                };
                let set = question
                    .option_set
                    .ok_or_else(|| malformed(OperandProblem::NoOptionSet))?;
                let node = self
                    .catalog
                    .node(set, *option)
                    .ok_or_else(|| malformed(OperandProblem::UnknownOption(*option)))?;
                format!("'{}'", node.name())
            }
        };
        Ok(format!("[{}] {} {operand}", left.code(), condition.op.phrase()))
    }

    /// Describes a group, joining members with `AND` or `OR`. Nested groups
    /// are parenthesized and negated groups prefixed with `NOT`. Empty groups
    /// yield `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if any member cannot be described or the groups nest
    /// deeper than the configured limit.
    pub fn describe_group(&self, group: &ConditionGroup) -> Result<Option<String>, CompileError> {
        self.describe_nested(group, 1)
    }

    fn describe_nested(
        &self,
        group: &ConditionGroup,
        depth: usize,
    ) -> Result<Option<String>, CompileError> {
        if depth > self.max_depth {
            return Err(CompileError::DepthExceeded {
                limit: self.max_depth,
            });
        }

        let mut parts = Vec::with_capacity(group.members.len());
        for member in &group.members {
            match member {
                Member::Condition(condition) => parts.push(self.describe_condition(condition)?),
                Member::Group(nested) => {
                    if let Some(text) = self.describe_nested(nested, depth + 1)? {
                        parts.push(format!("({text})"));
                    }
                }
            }
        }
        if parts.is_empty() {
            return Ok(None);
        }

        let joined = parts.join(&format!(" {} ", group.true_if.conjunction()));
        Ok(Some(if group.negate {
            format!("NOT ({joined})")
        } else {
            joined
        }))
    }

    /// Describes a skip rule, e.g.
    /// `Skip to Question #4 Age if [q1] is equal to 'Yes'`.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination or a condition cannot be
    /// described.
    pub fn describe_skip_rule(&self, rule: &SkipRule) -> Result<String, CompileError> {
        let destination = match rule.destination {
            Destination::End => "end of form".to_string(),
            Destination::Item(item) => self.describe_item(item)?,
        };
        let condition = match &rule.when {
            SkipWhen::Always => None,
            SkipWhen::When(group) => self.describe_group(group)?,
        };
        Ok(condition.map_or_else(
            || format!("Skip to {destination}"),
            |condition| format!("Skip to {destination} if {condition}"),
        ))
    }

    fn describe_item(&self, item: NodeId) -> Result<String, CompileError> {
        let node = self.tree.get(item)?;
        if node.as_group().is_some() {
            return Ok(format!("Group {}", node.name()));
        }
        let number = self
            .tree
            .questions()
            .position(|(id, _)| id == item)
            .map_or(0, |i| i + 1);
        Ok(format!("Question #{number} {}", node.name()))
    }
}
