//! Compilation of form logic into XForms expressions.
//!
//! The [`Compiler`] borrows an immutable form snapshot (tree and option
//! catalog) and turns conditions, condition groups and the rules that own
//! them into expression strings. It holds no mutable state, so one snapshot
//! can be compiled from many threads at once.

mod address;
pub use address::{AbsolutePath, Address, Position};

mod condition;

mod describe;

mod group;

/// Literal parsing and rendering.
pub mod literal;
pub use literal::LiteralError;

mod rules;
pub use rules::{CompiledConstraint, CompiledItem};

use std::fmt;

use thiserror::Error;

use crate::domain::{
    Code, Config, FormNode, FormTree, NodeId, OptionCatalog, OptionNodeId, OptionSetId, Operator,
    Question, QuestionType, TreeError,
};

/// The expression emitted for constructs the compiler does not support yet.
pub const ALWAYS_TRUE: &str = "true()";

/// Errors raised while compiling form logic.
///
/// All of these are validation failures of the supplied data; retrying will
/// not help.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    /// The form structure is invalid or an item is unknown.
    #[error(transparent)]
    Structure(#[from] TreeError),

    /// An item used as a question is a group.
    #[error("'{0}' is a group, not a question")]
    NotAQuestion(Code),

    /// A condition's operand cannot be used with its question.
    #[error("condition on '{condition}' has a malformed operand: {problem}")]
    MalformedOperand {
        /// Code of the condition's left question.
        condition: Code,
        /// What is wrong with the operand.
        #[source]
        problem: OperandProblem,
    },

    /// The operator does not apply to the question type.
    #[error("condition on '{condition}' cannot use operator '{operator}' with a {question_type} question")]
    UnsupportedOperator {
        /// Code of the condition's left question.
        condition: Code,
        /// The offending operator.
        operator: Operator,
        /// Type of the left question.
        question_type: QuestionType,
    },

    /// Conditions cannot test questions of this type.
    #[error("condition on '{condition}' tests a {question_type} question, which has no comparable value")]
    UnsupportedQuestionType {
        /// Code of the condition's left question.
        condition: Code,
        /// Type of the left question.
        question_type: QuestionType,
    },

    /// Nesting went deeper than the configured limit.
    #[error("nesting exceeds the maximum depth of {limit}")]
    DepthExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// The construct has no translation yet and strict mode is on.
    #[error("condition on '{condition}' compares against another question, which is not supported")]
    NotImplemented {
        /// Code of the condition's left question.
        condition: Code,
    },
}

/// Reasons an operand is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperandProblem {
    /// The option is not in the question's option set.
    #[error("option {0} is not in the question's option set")]
    UnknownOption(OptionNodeId),
    /// A select question has no option set.
    #[error("the question has no option set")]
    NoOptionSet,
    /// The question's option set is missing from the catalog.
    #[error("option set {0} is not in the catalog")]
    UnknownOptionSet(OptionSetId),
    /// An option was given for a question without options.
    #[error("options cannot be compared with a {0} question")]
    OptionOnNonSelect(QuestionType),
    /// A literal was given for a select question.
    #[error("select questions are compared against options, not literal values")]
    ValueOnSelect,
    /// The literal does not parse as the question's type.
    #[error(transparent)]
    InvalidLiteral(#[from] LiteralError),
}

/// The result of compiling a single condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compiled {
    /// A real boolean expression.
    Expression(String),
    /// A stand-in that is always true, for constructs without a translation.
    NotImplemented,
}

impl Compiled {
    /// The expression text; [`ALWAYS_TRUE`] for placeholders.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Expression(expr) => expr,
            Self::NotImplemented => ALWAYS_TRUE,
        }
    }

    /// Whether this is a real translation rather than a placeholder.
    #[must_use]
    pub const fn is_implemented(&self) -> bool {
        matches!(self, Self::Expression(_))
    }

    /// Consumes the result, yielding the expression text.
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Expression(expr) => expr,
            Self::NotImplemented => ALWAYS_TRUE.to_string(),
        }
    }
}

impl fmt::Display for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiles form logic against one form snapshot.
#[derive(Debug, Clone)]
pub struct Compiler<'a> {
    tree: &'a FormTree,
    catalog: &'a OptionCatalog,
    data_root: String,
    max_depth: usize,
    strict: bool,
}

impl<'a> Compiler<'a> {
    /// Creates a compiler with the default configuration.
    #[must_use]
    pub fn new(tree: &'a FormTree, catalog: &'a OptionCatalog) -> Self {
        Self::with_config(tree, catalog, &Config::default())
    }

    /// Creates a compiler with the given configuration.
    #[must_use]
    pub fn with_config(tree: &'a FormTree, catalog: &'a OptionCatalog, config: &Config) -> Self {
        Self {
            tree,
            catalog,
            data_root: config.data_root().to_string(),
            max_depth: config.max_depth(),
            strict: config.strict,
        }
    }

    /// The form being compiled.
    #[must_use]
    pub const fn tree(&self) -> &'a FormTree {
        self.tree
    }

    /// The option catalog in use.
    #[must_use]
    pub const fn catalog(&self) -> &'a OptionCatalog {
        self.catalog
    }

    /// Looks up an item that must be a question.
    fn question(&self, id: NodeId) -> Result<(&'a FormNode, &'a Question), CompileError> {
        let node = self.tree.get(id)?;
        node.as_question()
            .map(|question| (node, question))
            .ok_or_else(|| CompileError::NotAQuestion(node.code().clone()))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::{FormTree, NodeId, QuestionType};

    /// ```text
    /// form
    /// ├── q1 (integer)
    /// └── grp1 (repeat)
    ///     ├── q2 (text)
    ///     ├── q3 (text)
    ///     ├── grp2 (repeat)
    ///     │   └── q4 (text)
    ///     └── grp3
    ///         └── grp4 (repeat)
    ///             ├── q5 (integer)
    ///             └── q6 (integer)
    /// ```
    pub fn nested_form() -> FormTree {
        FormTree::builder("form")
            .question("q1", QuestionType::Integer)
            .repeat_group("grp1")
            .question("q2", QuestionType::Text)
            .question("q3", QuestionType::Text)
            .repeat_group("grp2")
            .question("q4", QuestionType::Text)
            .end()
            .group("grp3")
            .repeat_group("grp4")
            .question("q5", QuestionType::Integer)
            .question("q6", QuestionType::Integer)
            .end()
            .end()
            .end()
            .build()
            .unwrap()
    }

    pub fn id(tree: &FormTree, code: &str) -> NodeId {
        tree.find_by_code(code)
            .unwrap_or_else(|| panic!("no item coded {code}"))
    }
}
