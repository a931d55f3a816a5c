//! Domain models for form logic.
//!
//! This module contains the form structure, option sets, conditions and the
//! rules that own them, plus configuration.

/// Item codes.
pub mod code;
pub use code::{Code, InvalidCodeError};

mod condition;
pub use condition::{Condition, ConditionGroup, Member, Operand, Operator, TrueIf};

mod config;
pub use config::Config;

pub mod form;
pub use form::{
    FormNode, FormTree, FormTreeBuilder, Group, NodeId, NodeKind, NodeRecord, PathOptions,
    Question, QuestionType, TreeError,
};

pub mod options;
pub use options::{
    OptionCatalog, OptionNode, OptionNodeId, OptionRecord, OptionSet, OptionSetError,
    OptionSetId,
};

pub mod rules;
pub use rules::{Constraint, Destination, DisplayLogic, FormRules, SkipRule, SkipWhen};
