//! Form snapshots on disk.
//!
//! A snapshot holds everything the compiler needs for one form: option sets,
//! the item tree, and the rules attached to items. Items and options are
//! referenced by code and token, and resolved to identifiers on load.
//!
//! Condition values and option keys are kept exactly as written, so numbers
//! reach the compiled expression with their original digits.
//!
//! ```yaml
//! _version: "1"
//! option_sets:
//!   - name: Yes/No
//!     options:
//!       - { key: 42, name: "Yes" }
//!       - { key: 43, name: "No" }
//! items:
//!   - { code: q1, type: select_one, option_set: Yes/No }
//!   - group: household
//!     repeatable: true
//!     items:
//!       - { code: q2, type: integer }
//! display:
//!   household:
//!     members:
//!       - { question: q1, op: eq, option: on42 }
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    ffi::OsStr,
    io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::{
    compile::Compiler,
    domain::{
        Code, Condition, ConditionGroup, Config, Constraint, Destination, DisplayLogic, FormRules,
        FormTree, Group, InvalidCodeError, Member, NodeId, NodeKind, NodeRecord, Operand,
        Operator, OptionCatalog, OptionNodeId, OptionRecord, OptionSet, OptionSetError,
        OptionSetId, Question, QuestionType, SkipRule, SkipWhen, TreeError, TrueIf,
    },
};

/// Errors raised while loading a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// The file extension is not `yaml`, `yml` or `json`.
    #[error("unsupported snapshot format: {0}")]
    UnsupportedFormat(PathBuf),
    /// The YAML could not be parsed.
    #[error("invalid YAML snapshot: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The JSON could not be parsed.
    #[error("invalid JSON snapshot: {0}")]
    Json(#[from] serde_json::Error),
    /// An item code is not a valid identifier.
    #[error(transparent)]
    InvalidCode(#[from] InvalidCodeError),
    /// The item tree is invalid.
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// An option set is invalid.
    #[error(transparent)]
    OptionSet(#[from] OptionSetError),
    /// Two option sets share a name.
    #[error("option set '{0}' is defined more than once")]
    DuplicateOptionSet(String),
    /// An option has neither a token nor a key.
    #[error("option '{option}' in set '{set}' needs a token or a key")]
    MissingToken {
        /// Name of the option set.
        set: String,
        /// Name of the option.
        option: String,
    },
    /// A question names an option set that is not defined.
    #[error("question '{question}' uses unknown option set '{set}'")]
    UnknownOptionSet {
        /// Code of the question.
        question: String,
        /// The missing set's name.
        set: String,
    },
    /// A rule references an item code that is not in the tree.
    #[error("no item with code '{0}'")]
    UnknownItem(String),
    /// A condition names an option token its question does not offer.
    #[error("question '{question}' has no option with token '{token}'")]
    UnknownOption {
        /// Code of the question.
        question: String,
        /// The missing token.
        token: String,
    },
    /// A condition does not name exactly one of `value`, `option` or `right`.
    #[error("condition on '{0}' must have exactly one of `value`, `option` or `right`")]
    Operand(String),
    /// A condition has no `op`.
    #[error("condition on '{0}' has no operator")]
    MissingOperator(String),
    /// The `_version` tag names a format this build cannot read.
    #[error("unsupported snapshot version '{0}'")]
    UnsupportedVersion(String),
}

/// One form with its option sets and rules.
#[derive(Debug, Clone)]
pub struct FormSnapshot {
    /// The form structure.
    pub tree: FormTree,
    /// Option sets used by select questions.
    pub catalog: OptionCatalog,
    /// Display logic, skip rules and constraints.
    pub rules: FormRules,
}

impl FormSnapshot {
    /// Loads a snapshot, choosing the format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not YAML or JSON, or
    /// does not describe a valid form.
    #[instrument(level = "debug", skip(config))]
    pub fn load(path: &Path, config: &Config) -> Result<Self, SnapshotError> {
        let read = || {
            std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        match path.extension().and_then(OsStr::to_str) {
            Some("yaml" | "yml") => Self::from_yaml_str(&read()?, config),
            Some("json") => Self::from_json_str(&read()?, config),
            _ => Err(SnapshotError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Parses a YAML snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid snapshot.
    pub fn from_yaml_str(text: &str, config: &Config) -> Result<Self, SnapshotError> {
        let VersionTag { version } = serde_yaml::from_str(text)?;
        match version.as_str() {
            V1 => Assembler::new(config).assemble(serde_yaml::from_str(text)?),
            _ => Err(SnapshotError::UnsupportedVersion(version)),
        }
    }

    /// Parses a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid snapshot.
    pub fn from_json_str(text: &str, config: &Config) -> Result<Self, SnapshotError> {
        let value = numbers_as_text(serde_json::from_str(text)?);
        let VersionTag { version } = VersionTag::deserialize(&value)?;
        match version.as_str() {
            V1 => Assembler::new(config).assemble(SnapshotV1::deserialize(value)?),
            _ => Err(SnapshotError::UnsupportedVersion(version)),
        }
    }

    /// A compiler over this snapshot.
    #[must_use]
    pub fn compiler(&self, config: &Config) -> Compiler<'_> {
        Compiler::with_config(&self.tree, &self.catalog, config)
    }
}

const V1: &str = "1";

/// The `_version` tag, read before the body.
///
/// The body is read in a second pass. A tagged enum would buffer every
/// scalar and lose the digits of numbers that do not fit an `f64`.
#[derive(Debug, Deserialize)]
struct VersionTag {
    #[serde(rename = "_version")]
    version: String,
}

/// Replaces JSON numbers by their source digits.
fn numbers_as_text(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::Number(number) => Value::String(number.to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(numbers_as_text).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key, numbers_as_text(value)))
                .collect(),
        ),
        other => other,
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotV1 {
    #[serde(default = "default_root")]
    root: String,
    #[serde(default)]
    option_sets: Vec<OptionSetDto>,
    items: Vec<ItemDto>,
    #[serde(default)]
    display: BTreeMap<String, GroupDto>,
    #[serde(default)]
    skip_rules: Vec<SkipRuleDto>,
    #[serde(default)]
    constraints: Vec<ConstraintDto>,
}

fn default_root() -> String {
    "form".to_string()
}

#[derive(Debug, Deserialize)]
struct OptionSetDto {
    name: String,
    options: Vec<OptionDto>,
}

#[derive(Debug, Deserialize)]
struct OptionDto {
    name: String,
    token: Option<String>,
    key: Option<String>,
    #[serde(default)]
    options: Vec<OptionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemDto {
    Group {
        group: String,
        #[serde(default)]
        repeatable: bool,
        name: Option<String>,
        #[serde(default)]
        items: Vec<ItemDto>,
    },
    Question {
        code: String,
        #[serde(rename = "type")]
        question_type: QuestionType,
        option_set: Option<String>,
        name: Option<String>,
    },
}

/// A condition when `question` is present, otherwise a nested group.
///
/// Kept flat rather than untagged so `value` is read straight from the
/// source text.
#[derive(Debug, Deserialize)]
struct MemberDto {
    question: Option<String>,
    op: Option<Operator>,
    value: Option<String>,
    option: Option<String>,
    right: Option<String>,
    #[serde(default)]
    true_if: TrueIf,
    #[serde(default)]
    negate: bool,
    #[serde(default)]
    members: Vec<MemberDto>,
}

#[derive(Debug, Default, Deserialize)]
struct GroupDto {
    #[serde(default)]
    true_if: TrueIf,
    #[serde(default)]
    negate: bool,
    #[serde(default)]
    members: Vec<MemberDto>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SkipIf {
    Always,
    AllMet,
    AnyMet,
}

#[derive(Debug, Deserialize)]
struct SkipRuleDto {
    source: String,
    /// Absent means the end of the form.
    destination: Option<String>,
    skip_if: SkipIf,
    #[serde(default)]
    members: Vec<MemberDto>,
}

#[derive(Debug, Deserialize)]
struct ConstraintDto {
    question: String,
    #[serde(default)]
    accept_if: TrueIf,
    #[serde(default)]
    members: Vec<MemberDto>,
    rejection_msg: Option<String>,
}

/// Converts a parsed snapshot into domain types.
struct Assembler<'c> {
    config: &'c Config,
    set_ids: HashMap<String, OptionSetId>,
}

impl<'c> Assembler<'c> {
    fn new(config: &'c Config) -> Self {
        Self {
            config,
            set_ids: HashMap::new(),
        }
    }

    fn assemble(mut self, raw: SnapshotV1) -> Result<FormSnapshot, SnapshotError> {
        let mut catalog = OptionCatalog::new();
        for set in raw.option_sets {
            catalog.insert(self.option_set(set)?);
        }

        let mut records = Vec::new();
        let root = NodeId::new();
        records.push(NodeRecord {
            id: root,
            parent: None,
            code: Code::new(raw.root.clone())?,
            rank: NonZeroUsize::MIN,
            kind: NodeKind::Group(Group {
                repeatable: false,
                name: raw.root,
            }),
        });
        self.items(root, raw.items, &mut records)?;
        let tree = FormTree::from_records(records)?;

        let resolver = Resolver {
            tree: &tree,
            catalog: &catalog,
        };
        let mut rules = FormRules::new();
        for (code, group) in raw.display {
            let item = resolver.item(&code)?;
            rules.set_display(item, DisplayLogic::When(resolver.group(group)?));
        }
        for rule in raw.skip_rules {
            rules.add_skip_rule(resolver.skip_rule(rule)?);
        }
        for constraint in raw.constraints {
            rules.add_constraint(Constraint {
                question: resolver.item(&constraint.question)?,
                accept_if: resolver.group(GroupDto {
                    true_if: constraint.accept_if,
                    negate: false,
                    members: constraint.members,
                })?,
                rejection_msg: constraint.rejection_msg,
            });
        }

        tracing::debug!(items = tree.len(), sets = self.set_ids.len(), "assembled snapshot");
        Ok(FormSnapshot {
            tree,
            catalog,
            rules,
        })
    }

    fn option_set(&mut self, set: OptionSetDto) -> Result<OptionSet, SnapshotError> {
        if self.set_ids.contains_key(&set.name) {
            return Err(SnapshotError::DuplicateOptionSet(set.name));
        }
        let id = OptionSetId::new();
        let mut records = Vec::new();
        self.options(&set.name, None, set.options, &mut records)?;
        self.set_ids.insert(set.name.clone(), id);
        Ok(OptionSet::from_records(id, set.name, records)?)
    }

    fn options(
        &self,
        set: &str,
        parent: Option<OptionNodeId>,
        options: Vec<OptionDto>,
        records: &mut Vec<OptionRecord>,
    ) -> Result<(), SnapshotError> {
        for option in options {
            let token = match (option.token, option.key) {
                (Some(token), _) => token,
                (None, Some(key)) => format!("{}{key}", self.config.option_prefix()),
                (None, None) => {
                    return Err(SnapshotError::MissingToken {
                        set: set.to_string(),
                        option: option.name,
                    });
                }
            };
            let id = OptionNodeId::new();
            records.push(OptionRecord {
                id,
                token,
                name: option.name,
                parent,
            });
            self.options(set, Some(id), option.options, records)?;
        }
        Ok(())
    }

    fn items(
        &self,
        parent: NodeId,
        items: Vec<ItemDto>,
        records: &mut Vec<NodeRecord>,
    ) -> Result<(), SnapshotError> {
        for (i, item) in items.into_iter().enumerate() {
            let id = NodeId::new();
            let rank = NonZeroUsize::MIN.saturating_add(i);
            match item {
                ItemDto::Group {
                    group,
                    repeatable,
                    name,
                    items,
                } => {
                    records.push(NodeRecord {
                        id,
                        parent: Some(parent),
                        code: Code::new(group.clone())?,
                        rank,
                        kind: NodeKind::Group(Group {
                            repeatable,
                            name: name.unwrap_or(group),
                        }),
                    });
                    self.items(id, items, records)?;
                }
                ItemDto::Question {
                    code,
                    question_type,
                    option_set,
                    name,
                } => {
                    let option_set = option_set
                        .map(|set| {
                            self.set_ids.get(&set).copied().ok_or_else(|| {
                                SnapshotError::UnknownOptionSet {
                                    question: code.clone(),
                                    set,
                                }
                            })
                        })
                        .transpose()?;
                    records.push(NodeRecord {
                        id,
                        parent: Some(parent),
                        code: Code::new(code.clone())?,
                        rank,
                        kind: NodeKind::Question(Question {
                            question_type,
                            option_set,
                            name: name.unwrap_or(code),
                        }),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Resolves codes and tokens in rules against an assembled form.
struct Resolver<'a> {
    tree: &'a FormTree,
    catalog: &'a OptionCatalog,
}

impl Resolver<'_> {
    fn item(&self, code: &str) -> Result<NodeId, SnapshotError> {
        self.tree
            .find_by_code(code)
            .ok_or_else(|| SnapshotError::UnknownItem(code.to_string()))
    }

    fn group(&self, group: GroupDto) -> Result<ConditionGroup, SnapshotError> {
        let members = group
            .members
            .into_iter()
            .map(|member| self.member(member))
            .collect::<Result<_, _>>()?;
        Ok(ConditionGroup {
            true_if: group.true_if,
            negate: group.negate,
            members,
        })
    }

    fn member(&self, member: MemberDto) -> Result<Member, SnapshotError> {
        let Some(question) = member.question else {
            return self
                .group(GroupDto {
                    true_if: member.true_if,
                    negate: member.negate,
                    members: member.members,
                })
                .map(Member::from);
        };
        let left = self.item(&question)?;
        let Some(op) = member.op else {
            return Err(SnapshotError::MissingOperator(question));
        };
        let operand = match (member.value, member.option, member.right) {
            (Some(value), None, None) => Operand::Value(value),
            (None, Some(token), None) => Operand::Option(self.option(left, &question, token)?),
            (None, None, Some(right)) => Operand::Question(self.item(&right)?),
            _ => return Err(SnapshotError::Operand(question)),
        };
        Ok(Member::from(Condition { left, op, operand }))
    }

    fn option(&self, left: NodeId, code: &str, token: String) -> Result<OptionNodeId, SnapshotError> {
        self.tree
            .node(left)
            .and_then(|node| node.as_question())
            .and_then(|question| question.option_set)
            .and_then(|set| self.catalog.get(set))
            .and_then(|set| set.find_by_token(&token))
            .map(|node| node.id())
            .ok_or_else(|| SnapshotError::UnknownOption {
                question: code.to_string(),
                token,
            })
    }

    fn skip_rule(&self, rule: SkipRuleDto) -> Result<SkipRule, SnapshotError> {
        let destination = match rule.destination {
            Some(code) => Destination::Item(self.item(&code)?),
            None => Destination::End,
        };
        let when = match rule.skip_if {
            SkipIf::Always => SkipWhen::Always,
            SkipIf::AllMet | SkipIf::AnyMet => {
                let true_if = if matches!(rule.skip_if, SkipIf::AnyMet) {
                    TrueIf::AnyMet
                } else {
                    TrueIf::AllMet
                };
                SkipWhen::When(self.group(GroupDto {
                    true_if,
                    negate: false,
                    members: rule.members,
                })?)
            }
        };
        Ok(SkipRule {
            source: self.item(&rule.source)?,
            destination,
            when,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const HOUSEHOLD: &str = r#"
_version: "1"
option_sets:
  - name: Yes/No
    options:
      - { key: 42, name: "Yes" }
      - { key: 43, name: "No" }
  - name: Geography
    options:
      - token: ca
        name: Canada
        options:
          - { token: ont, name: Ontario }
items:
  - { code: q7, type: select_one, option_set: Yes/No }
  - { code: q3, type: integer }
  - group: members
    repeatable: true
    items:
      - { code: age, type: integer }
      - { code: region, type: select_one, option_set: Geography }
  - { code: notes, type: long_text }
display:
  members:
    members:
      - { question: q7, op: eq, option: on42 }
skip_rules:
  - source: q3
    destination: notes
    skip_if: any_met
    members:
      - { question: q3, op: lt, value: 0 }
      - true_if: all_met
        negate: true
        members:
          - { question: q3, op: gt, value: 10 }
constraints:
  - question: age
    members:
      - { question: age, op: geq, value: 0 }
    rejection_msg: Age cannot be negative
"#;

    fn load(text: &str) -> Result<FormSnapshot, SnapshotError> {
        FormSnapshot::from_yaml_str(text, &Config::default())
    }

    #[test]
    fn yaml_snapshot_builds_form_and_rules() {
        let snapshot = load(HOUSEHOLD).unwrap();
        let config = Config::default();
        let compiler = snapshot.compiler(&config);
        let tree = &snapshot.tree;
        let id = |code| tree.find_by_code(code).unwrap();

        assert_eq!(tree.len(), 7);
        assert_eq!(
            compiler.relevance_for(&snapshot.rules, id("members")).unwrap(),
            Some(
                "((selected(/data/q7, 'on42'))) and (not((/data/q3 < 0) or (not((/data/q3 > 10)))))"
                    .to_string()
            )
        );
        assert_eq!(
            compiler.relevance_for(&snapshot.rules, id("age")).unwrap(),
            Some("not((/data/q3 < 0) or (not((/data/q3 > 10))))".to_string())
        );

        let constraint = &snapshot.rules.constraints()[0];
        assert_eq!(
            constraint.rejection_msg.as_deref(),
            Some("Age cannot be negative")
        );
        assert_eq!(
            compiler.compile_constraint(constraint).unwrap().unwrap().expression,
            "(../age >= 0)"
        );
    }

    #[test]
    fn option_keys_use_the_configured_prefix() {
        let mut config = Config::default();
        let text = HOUSEHOLD.replace("_version: \"1\"", "_version: \"1\"\nroot: survey");
        let snapshot = FormSnapshot::from_yaml_str(&text, &config).unwrap();
        let set = snapshot.catalog.find_by_name("Yes/No").unwrap();
        assert!(set.find_by_token("on42").is_some());
        assert!(snapshot.tree.find_by_code("survey").is_some());

        config = toml::from_str("_version = \"1\"\noption_prefix = \"opt\"").unwrap();
        let snapshot = FormSnapshot::from_yaml_str(HOUSEHOLD, &config);
        // The display rule names `on42`, which no longer exists.
        assert!(matches!(
            snapshot,
            Err(SnapshotError::UnknownOption { token, .. }) if token == "on42"
        ));
    }

    #[test]
    fn json_snapshots_are_accepted() {
        let text = r#"{
            "_version": "1",
            "items": [
                { "code": "q1", "type": "decimal" },
                { "group": "g", "items": [ { "code": "q2", "type": "text" } ] }
            ],
            "display": {
                "q2": { "members": [ { "question": "q1", "op": "gt", "value": 2.5 } ] }
            }
        }"#;
        let snapshot = FormSnapshot::from_json_str(text, &Config::default()).unwrap();
        let q2 = snapshot.tree.find_by_code("q2").unwrap();
        let config = Config::default();
        assert_eq!(
            snapshot
                .compiler(&config)
                .compile_display(&snapshot.rules, q2)
                .unwrap(),
            Some("(/data/q1 > 2.5)".to_string())
        );
    }

    #[test]
    fn conditions_need_exactly_one_operand() {
        let text = r#"
_version: "1"
items:
  - { code: q1, type: integer }
display:
  q1:
    members:
      - { question: q1, op: eq, value: 1, right: q1 }
"#;
        assert!(matches!(load(text), Err(SnapshotError::Operand(code)) if code == "q1"));
    }

    #[test]
    fn unknown_references_are_reported() {
        let text = r#"
_version: "1"
items:
  - { code: q1, type: integer }
skip_rules:
  - { source: q1, destination: q9, skip_if: always }
"#;
        assert!(matches!(load(text), Err(SnapshotError::UnknownItem(code)) if code == "q9"));

        let text = r#"
_version: "1"
items:
  - { code: q1, type: select_one, option_set: Colours }
"#;
        assert!(matches!(load(text), Err(SnapshotError::UnknownOptionSet { .. })));
    }

    #[test]
    fn invalid_structure_is_reported() {
        let text = r#"
_version: "1"
items:
  - { code: q1, type: integer }
  - { code: q1, type: text }
"#;
        assert!(matches!(load(text), Err(SnapshotError::Tree(TreeError::DuplicateCode(_)))));

        let text = r#"
_version: "1"
items:
  - { code: "1st", type: integer }
"#;
        assert!(matches!(load(text), Err(SnapshotError::InvalidCode(_))));
    }

    #[test]
    fn numeric_values_keep_their_digits() {
        let expected = Some(
            "(/data/q1 = 12345678901234567891) and (/data/q2 > 0.1000000000000000055511151231257827)"
                .to_string(),
        );
        let config = Config::default();

        let yaml = r#"
_version: "1"
items:
  - { code: q1, type: integer }
  - { code: q2, type: decimal }
display:
  q2:
    members:
      - { question: q1, op: eq, value: 12345678901234567891 }
      - { question: q2, op: gt, value: 0.1000000000000000055511151231257827 }
"#;
        let snapshot = load(yaml).unwrap();
        let q2 = snapshot.tree.find_by_code("q2").unwrap();
        assert_eq!(
            snapshot.compiler(&config).compile_display(&snapshot.rules, q2).unwrap(),
            expected
        );

        let json = r#"{
            "_version": "1",
            "items": [
                { "code": "q1", "type": "integer" },
                { "code": "q2", "type": "decimal" }
            ],
            "display": {
                "q2": { "members": [
                    { "question": "q1", "op": "eq", "value": 12345678901234567891 },
                    { "question": "q2", "op": "gt", "value": 0.1000000000000000055511151231257827 }
                ] }
            }
        }"#;
        let snapshot = FormSnapshot::from_json_str(json, &config).unwrap();
        let q2 = snapshot.tree.find_by_code("q2").unwrap();
        assert_eq!(
            snapshot.compiler(&config).compile_display(&snapshot.rules, q2).unwrap(),
            expected
        );
    }

    #[test]
    fn conditions_need_an_operator() {
        let text = r#"
_version: "1"
items:
  - { code: q1, type: integer }
display:
  q1:
    members:
      - { question: q1, value: 1 }
"#;
        assert!(matches!(load(text), Err(SnapshotError::MissingOperator(code)) if code == "q1"));
    }

    #[test]
    fn unknown_versions_are_rejected() {
        assert!(matches!(
            load("_version: \"2\"\nitems: []"),
            Err(SnapshotError::UnsupportedVersion(version)) if version == "2"
        ));
    }

    #[test]
    fn snapshots_without_a_version_are_rejected() {
        assert!(matches!(
            load("items: []"),
            Err(SnapshotError::Yaml(_))
        ));
    }

    #[test]
    fn load_dispatches_on_extension() {
        let mut yaml = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        yaml.write_all(HOUSEHOLD.as_bytes()).unwrap();
        assert!(FormSnapshot::load(yaml.path(), &Config::default()).is_ok());

        let text = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(
            FormSnapshot::load(text.path(), &Config::default()),
            Err(SnapshotError::UnsupportedFormat(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FormSnapshot::load(&dir.path().join("missing.yaml"), &Config::default()),
            Err(SnapshotError::Io { .. })
        ));
    }
}
