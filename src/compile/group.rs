//! Compilation of condition groups.

use tracing::instrument;

use crate::{
    compile::{CompileError, Compiler},
    domain::{ConditionGroup, Member, NodeId},
};

impl Compiler<'_> {
    /// Compiles a condition group as evaluated from the `host` item.
    ///
    /// Members are parenthesized individually and joined in order with the
    /// group's combinator; negated groups are wrapped in `not(...)`. A group
    /// without members means "no constraint" and yields `None`, and nested
    /// groups that yield `None` are left out of their parent.
    ///
    /// # Errors
    ///
    /// Returns an error if any member fails to compile or the groups nest
    /// deeper than the configured limit.
    #[instrument(level = "debug", skip(self, group), fields(members = group.members.len()))]
    pub fn compile_group(
        &self,
        host: NodeId,
        group: &ConditionGroup,
    ) -> Result<Option<String>, CompileError> {
        self.compile_nested(host, group, 1)
    }

    fn compile_nested(
        &self,
        host: NodeId,
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
            let compiled = match member {
                Member::Condition(condition) => {
                    Some(self.compile_condition(host, condition)?.into_string())
                }
                Member::Group(nested) => self.compile_nested(host, nested, depth + 1)?,
            };
            parts.extend(compiled);
        }

        if parts.is_empty() {
            return Ok(None);
        }

        let joined = parts
            .iter()
            .map(|part| format!("({part})"))
            .collect::<Vec<_>>()
            .join(group.true_if.joiner());

        Ok(Some(if group.negate {
            format!("not({joined})")
        } else {
            joined
        }))
    }
}
