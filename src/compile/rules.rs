//! Compilation of the rules that own condition groups.
//!
//! Display logic and skip rules both feed an item's relevance expression: the
//! item is relevant when its own display logic holds and no skip rule jumping
//! over it fires. Constraints compile to acceptance expressions.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::instrument;

use crate::{
    compile::{ALWAYS_TRUE, CompileError, Compiler},
    domain::{
        Constraint, Destination, DisplayLogic, FormRules, FormTree, NodeId, SkipRule, SkipWhen,
        TreeError,
    },
};

/// A compiled constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledConstraint {
    /// The acceptance expression.
    pub expression: String,
    /// Message shown when the answer is rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_msg: Option<String>,
}

/// The compiled logic of one form item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledItem {
    /// Code of the item.
    pub code: String,
    /// Relevance expression; `None` when the item is always shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant: Option<String>,
    /// Constraints on the item's answer.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<CompiledConstraint>,
}

impl CompiledItem {
    /// Whether the item carries any logic.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relevant.is_none() && self.constraints.is_empty()
    }
}

/// Document positions of every item, used to decide which items a skip
/// rule jumps over.
struct Layout {
    /// Pre-order position of each item.
    position: HashMap<NodeId, usize>,
    /// Position of the last item in each item's subtree.
    last: HashMap<NodeId, usize>,
}

impl Layout {
    fn new(tree: &FormTree) -> Self {
        let order = tree.document_order();
        let position: HashMap<_, _> = order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let last = order
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i + tree.descendants(*id).len()))
            .collect();
        Self { position, last }
    }

    fn position(&self, id: NodeId) -> Result<usize, TreeError> {
        self.position
            .get(&id)
            .copied()
            .ok_or(TreeError::UnknownNode(id))
    }

    fn last(&self, id: NodeId) -> Result<usize, TreeError> {
        self.last.get(&id).copied().ok_or(TreeError::UnknownNode(id))
    }

    /// Whether `rule` jumps over `item`.
    ///
    /// Skipped items come after the source's subtree and before the
    /// destination. Groups enclosing the destination are never skipped.
    fn skips(&self, rule: &SkipRule, item: NodeId) -> Result<bool, TreeError> {
        let at = self.position(item)?;
        if at <= self.last(rule.source)? {
            return Ok(false);
        }
        match rule.destination {
            Destination::End => Ok(true),
            Destination::Item(dest) => {
                let dest_at = self.position(dest)?;
                let encloses_dest = at < dest_at && dest_at <= self.last(item)?;
                Ok(at < dest_at && !encloses_dest)
            }
        }
    }
}

impl Compiler<'_> {
    /// Compiles an item's own display logic. Items that are always shown
    /// yield `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the display condition fails to compile.
    pub fn compile_display(
        &self,
        rules: &FormRules,
        item: NodeId,
    ) -> Result<Option<String>, CompileError> {
        match rules.display(item) {
            DisplayLogic::Always => Ok(None),
            DisplayLogic::When(group) => self.compile_group(item, group),
        }
    }

    /// Compiles the condition under which a skip rule fires, evaluated from
    /// `host`.
    ///
    /// Unconditional rules fire with `true()`. A conditional rule whose
    /// group is empty never fires and yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the skip condition fails to compile.
    pub fn compile_skip_rule(
        &self,
        rule: &SkipRule,
        host: NodeId,
    ) -> Result<Option<String>, CompileError> {
        self.tree.get(rule.source)?;
        match &rule.when {
            SkipWhen::Always => Ok(Some(ALWAYS_TRUE.to_string())),
            SkipWhen::When(group) => self.compile_group(host, group),
        }
    }

    /// Compiles a constraint's acceptance expression. Constraints without
    /// conditions accept everything and yield `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the constrained item is not a question or the
    /// acceptance condition fails to compile.
    pub fn compile_constraint(
        &self,
        constraint: &Constraint,
    ) -> Result<Option<CompiledConstraint>, CompileError> {
        self.question(constraint.question)?;
        let expression = self.compile_group(constraint.question, &constraint.accept_if)?;
        Ok(expression.map(|expression| CompiledConstraint {
            expression,
            rejection_msg: constraint.rejection_msg.clone(),
        }))
    }

    /// Compiles the full relevance expression of an item: its display logic
    /// and `not(...)` of every skip rule that jumps over it, joined with
    /// `and`.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule references an unknown item or a condition
    /// fails to compile.
    pub fn relevance_for(
        &self,
        rules: &FormRules,
        item: NodeId,
    ) -> Result<Option<String>, CompileError> {
        self.relevance_with(&Layout::new(self.tree), rules, item)
    }

    fn relevance_with(
        &self,
        layout: &Layout,
        rules: &FormRules,
        item: NodeId,
    ) -> Result<Option<String>, CompileError> {
        let mut parts = Vec::new();
        parts.extend(self.compile_display(rules, item)?);

        for rule in rules.skip_rules() {
            if !layout.skips(rule, item)? {
                continue;
            }
            if let Some(fires) = self.compile_skip_rule(rule, item)? {
                parts.push(format!("not({fires})"));
            }
        }

        Ok(match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(
                parts
                    .iter()
                    .map(|part| format!("({part})"))
                    .collect::<Vec<_>>()
                    .join(" and "),
            ),
        })
    }

    /// Compiles the logic of every item on the form, in document order.
    ///
    /// Items are compiled in parallel; the first error aborts the whole
    /// compile.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any item.
    #[instrument(skip_all, fields(items = self.tree.len()))]
    pub fn compile_form(&self, rules: &FormRules) -> Result<Vec<CompiledItem>, CompileError> {
        let layout = Layout::new(self.tree);
        let items = self
            .tree
            .document_order()
            .into_par_iter()
            .map(|item| -> Result<CompiledItem, CompileError> {
                let code = self.tree.code_of(item)?.to_string();
                let relevant = self.relevance_with(&layout, rules, item)?;
                let mut constraints = Vec::new();
                for constraint in rules.constraints_for(item) {
                    constraints.extend(self.compile_constraint(constraint)?);
                }
                Ok(CompiledItem {
                    code,
                    relevant,
                    constraints,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            with_logic = items.iter().filter(|item| !item.is_empty()).count(),
            "compiled form"
        );
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compile::fixtures::id,
        domain::{Condition, ConditionGroup, OptionCatalog, Operator, QuestionType},
    };

    /// ```text
    /// form
    /// ├── q1 (integer)
    /// ├── q2 (integer)
    /// ├── grp1
    /// │   ├── q3 (text)
    /// │   └── q4 (text)
    /// ├── q5 (integer)
    /// └── q6 (integer)
    /// ```
    fn flat_form() -> FormTree {
        FormTree::builder("form")
            .question("q1", QuestionType::Integer)
            .question("q2", QuestionType::Integer)
            .group("grp1")
            .question("q3", QuestionType::Text)
            .question("q4", QuestionType::Text)
            .end()
            .question("q5", QuestionType::Integer)
            .question("q6", QuestionType::Integer)
            .build()
            .unwrap()
    }

    fn skip(tree: &FormTree, source: &str, destination: Destination, value: &str) -> SkipRule {
        SkipRule {
            source: id(tree, source),
            destination,
            when: SkipWhen::When(ConditionGroup::all([Condition::value(
                id(tree, source),
                Operator::Eq,
                value,
            )])),
        }
    }

    #[test]
    fn display_logic_compiles_relative_to_the_item() {
        let tree = flat_form();
        let catalog = OptionCatalog::new();
        let mut rules = FormRules::new();
        rules.set_display(
            id(&tree, "q4"),
            DisplayLogic::When(ConditionGroup::any([Condition::value(
                id(&tree, "q3"),
                Operator::Eq,
                "yes",
            )])),
        );
        let compiler = Compiler::new(&tree, &catalog);

        assert_eq!(
            compiler.relevance_for(&rules, id(&tree, "q4")).unwrap(),
            Some("(../q3 = 'yes')".to_string())
        );
        assert_eq!(compiler.relevance_for(&rules, id(&tree, "q3")).unwrap(), None);
    }

    #[test]
    fn skip_rules_hide_items_between_source_and_destination() {
        let tree = flat_form();
        let catalog = OptionCatalog::new();
        let mut rules = FormRules::new();
        rules.add_skip_rule(skip(&tree, "q1", Destination::Item(id(&tree, "q5")), "1"));
        let compiler = Compiler::new(&tree, &catalog);

        let relevance = |code| compiler.relevance_for(&rules, id(&tree, code)).unwrap();
        assert_eq!(relevance("q1"), None);
        assert_eq!(relevance("q2"), Some("not((/data/q1 = 1))".to_string()));
        assert_eq!(relevance("grp1"), Some("not((/data/q1 = 1))".to_string()));
        assert_eq!(relevance("q3"), Some("not((/data/q1 = 1))".to_string()));
        assert_eq!(relevance("q5"), None);
        assert_eq!(relevance("q6"), None);
    }

    #[test]
    fn groups_enclosing_the_destination_are_not_skipped() {
        let tree = flat_form();
        let catalog = OptionCatalog::new();
        let mut rules = FormRules::new();
        rules.add_skip_rule(skip(&tree, "q2", Destination::Item(id(&tree, "q4")), "2"));
        let compiler = Compiler::new(&tree, &catalog);

        assert_eq!(compiler.relevance_for(&rules, id(&tree, "grp1")).unwrap(), None);
        assert_eq!(
            compiler.relevance_for(&rules, id(&tree, "q3")).unwrap(),
            Some("not((/data/q2 = 2))".to_string())
        );
        assert_eq!(compiler.relevance_for(&rules, id(&tree, "q4")).unwrap(), None);
    }

    #[test]
    fn skip_to_end_combines_with_display_logic() {
        let tree = flat_form();
        let catalog = OptionCatalog::new();
        let mut rules = FormRules::new();
        rules.add_skip_rule(SkipRule {
            source: id(&tree, "q5"),
            destination: Destination::End,
            when: SkipWhen::Always,
        });
        rules.set_display(
            id(&tree, "q6"),
            DisplayLogic::When(ConditionGroup::all([Condition::value(
                id(&tree, "q1"),
                Operator::Gt,
                "3",
            )])),
        );
        let compiler = Compiler::new(&tree, &catalog);

        assert_eq!(
            compiler.relevance_for(&rules, id(&tree, "q6")).unwrap(),
            Some("((/data/q1 > 3)) and (not(true()))".to_string())
        );
    }

    #[test]
    fn skip_conditions_on_grouped_sources_are_addressed_from_the_skipped_item() {
        let tree = flat_form();
        let catalog = OptionCatalog::new();
        let mut rules = FormRules::new();
        rules.add_skip_rule(skip(&tree, "q3", Destination::End, "no"));
        let compiler = Compiler::new(&tree, &catalog);

        assert_eq!(
            compiler.relevance_for(&rules, id(&tree, "q4")).unwrap(),
            Some("not((../q3 = 'no'))".to_string())
        );
    }

    #[test]
    fn constraints_compile_with_their_messages() {
        let tree = flat_form();
        let catalog = OptionCatalog::new();
        let q1 = id(&tree, "q1");
        let constraint = Constraint {
            question: q1,
            accept_if: ConditionGroup::all([Condition::value(q1, Operator::Lt, "100")]),
            rejection_msg: Some("Too many".to_string()),
        };
        let compiler = Compiler::new(&tree, &catalog);

        assert_eq!(
            compiler.compile_constraint(&constraint).unwrap(),
            Some(CompiledConstraint {
                expression: "(/data/q1 < 100)".to_string(),
                rejection_msg: Some("Too many".to_string()),
            })
        );
    }

    #[test]
    fn compile_form_lists_every_item_in_document_order() {
        let tree = flat_form();
        let catalog = OptionCatalog::new();
        let q1 = id(&tree, "q1");
        let mut rules = FormRules::new();
        rules.add_skip_rule(skip(&tree, "q5", Destination::End, "0"));
        rules.add_constraint(Constraint {
            question: q1,
            accept_if: ConditionGroup::all([Condition::value(q1, Operator::Geq, "0")]),
            rejection_msg: None,
        });

        let items = Compiler::new(&tree, &catalog).compile_form(&rules).unwrap();

        let codes: Vec<_> = items.iter().map(|item| item.code.as_str()).collect();
        assert_eq!(codes, ["q1", "q2", "grp1", "q3", "q4", "q5", "q6"]);
        assert_eq!(items[0].constraints[0].expression, "(/data/q1 >= 0)");
        assert_eq!(items[6].relevant.as_deref(), Some("not((/data/q5 = 0))"));
        assert!(items[1].is_empty());
    }

    #[test]
    fn compile_form_stops_at_the_first_error() {
        let tree = flat_form();
        let catalog = OptionCatalog::new();
        let mut rules = FormRules::new();
        rules.set_display(
            id(&tree, "q2"),
            DisplayLogic::When(ConditionGroup::all([Condition::value(
                id(&tree, "q1"),
                Operator::Eq,
                "lots",
            )])),
        );

        let err = Compiler::new(&tree, &catalog).compile_form(&rules).unwrap_err();
        assert!(matches!(err, CompileError::MalformedOperand { .. }));
    }
}
