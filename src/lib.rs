//! Form Logic Compilation
//!
//! Forms are trees of groups and questions. Designers attach condition
//! groups to items as display logic, skip rules and answer constraints; this
//! crate compiles them into the boolean expressions an XForms rendering
//! engine evaluates, addressing questions across nested and repeating groups.
//!
//! ```
//! use formlogic::{Compiler, Condition, ConditionGroup, FormTree, Operator, OptionCatalog, QuestionType};
//!
//! let tree = FormTree::builder("form")
//!     .question("age", QuestionType::Integer)
//!     .repeat_group("children")
//!     .question("name", QuestionType::Text)
//!     .end()
//!     .build()
//!     .unwrap();
//! let catalog = OptionCatalog::new();
//! let compiler = Compiler::new(&tree, &catalog);
//!
//! let age = tree.find_by_code("age").unwrap();
//! let name = tree.find_by_code("name").unwrap();
//! let group = ConditionGroup::all([Condition::value(age, Operator::Geq, "18")]);
//!
//! let relevant = compiler.compile_group(name, &group).unwrap();
//! assert_eq!(relevant.as_deref(), Some("(/data/age >= 18)"));
//! ```

pub mod domain;
pub use domain::{
    Code, Condition, ConditionGroup, Config, Constraint, Destination, DisplayLogic, FormNode,
    FormRules, FormTree, Member, NodeId, NodeKind, Operand, Operator, OptionCatalog, OptionSet,
    QuestionType, SkipRule, SkipWhen, TreeError, TrueIf,
};

/// Compilation of conditions and rules into XForms expressions.
pub mod compile;
pub use compile::{Address, CompileError, Compiled, CompiledConstraint, CompiledItem, Compiler};

/// Loading form snapshots from disk.
pub mod storage;
pub use storage::{FormSnapshot, LoadedSnapshot, SnapshotError, load_all};
