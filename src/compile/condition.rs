//! Compilation of single conditions.

use std::num::NonZeroUsize;

use tracing::instrument;

use crate::{
    compile::{CompileError, Compiled, Compiler, OperandProblem, literal},
    domain::{Code, Condition, NodeId, Operand, Operator, OptionNodeId, Question, QuestionType},
};

impl Compiler<'_> {
    /// Compiles one condition as evaluated from the `host` item.
    ///
    /// The left question is addressed relative to `host`; when they are the
    /// same item the address degenerates to the question's own path.
    ///
    /// Conditions comparing against another question have no translation.
    /// They yield [`Compiled::NotImplemented`] with a warning, or
    /// [`CompileError::NotImplemented`] in strict mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the left question is unknown or a group, the
    /// operand does not fit the question, or the operator does not apply to
    /// the question type.
    #[instrument(level = "debug", skip(self, condition), fields(left = %condition.left, op = %condition.op))]
    pub fn compile_condition(
        &self,
        host: NodeId,
        condition: &Condition,
    ) -> Result<Compiled, CompileError> {
        let (left, question) = self.question(condition.left)?;
        let code = left.code();

        match &condition.operand {
            Operand::Question(right) => {
                self.question(*right)?;
                if self.strict {
                    return Err(CompileError::NotImplemented {
                        condition: code.clone(),
                    });
                }
                tracing::warn!(
                    condition = %code,
                    "comparison against another question is not supported, compiling to {}",
                    super::ALWAYS_TRUE
                );
                Ok(Compiled::NotImplemented)
            }
            Operand::Option(option) => self
                .compile_selection(host, condition.left, code, question, condition.op, *option)
                .map(Compiled::Expression),
            Operand::Value(raw) => self
                .compile_comparison(host, condition.left, code, question, condition.op, raw)
                .map(Compiled::Expression),
        }
    }

    fn compile_selection(
        &self,
        host: NodeId,
        left: NodeId,
        code: &Code,
        question: &Question,
        op: Operator,
        option: OptionNodeId,
    ) -> Result<String, CompileError> {
        let question_type = question.question_type;
        let malformed = |problem| CompileError::MalformedOperand {
            condition: code.clone(),
            problem,
        };
        let unsupported = || CompileError::UnsupportedOperator {
            condition: code.clone(),
            operator: op,
            question_type,
        };

        if !question_type.is_select() {
            return Err(malformed(OperandProblem::OptionOnNonSelect(question_type)));
        }
        let set_id = question
            .option_set
            .ok_or_else(|| malformed(OperandProblem::NoOptionSet))?;
        let set = self
            .catalog
            .get(set_id)
            .ok_or_else(|| malformed(OperandProblem::UnknownOptionSet(set_id)))?;
        let node = set
            .node(option)
            .ok_or_else(|| malformed(OperandProblem::UnknownOption(option)))?;

        let negate = match op {
            Operator::Eq | Operator::Inc => false,
            Operator::Neq | Operator::Ninc => true,
            Operator::Gt | Operator::Geq | Operator::Lt | Operator::Leq => {
                return Err(unsupported());
            }
        };

        let mut address = self.resolve(host, left)?;
        if question_type == QuestionType::SelectOne && set.is_multilevel() {
            // Each level of a cascading selection is stored in its own sub-question.
            if op != Operator::Eq {
                return Err(unsupported());
            }
            address = address.for_subquestion(NonZeroUsize::MIN.saturating_add(node.depth()));
        }

        let selected = format!("selected({address}, {})", literal::string(node.token()));
        Ok(if negate {
            format!("not({selected})")
        } else {
            selected
        })
    }

    fn compile_comparison(
        &self,
        host: NodeId,
        left: NodeId,
        code: &Code,
        question: &Question,
        op: Operator,
        raw: &str,
    ) -> Result<String, CompileError> {
        let question_type = question.question_type;
        let malformed = |problem| CompileError::MalformedOperand {
            condition: code.clone(),
            problem,
        };
        let unsupported = || CompileError::UnsupportedOperator {
            condition: code.clone(),
            operator: op,
            question_type,
        };

        let symbol = op.symbol().ok_or_else(unsupported)?;
        let (value, format) = match question_type {
            QuestionType::Integer | QuestionType::Counter => (literal::integer(raw), None),
            QuestionType::Decimal => (literal::decimal(raw), None),
            QuestionType::Text | QuestionType::LongText | QuestionType::Barcode => {
                if !matches!(op, Operator::Eq | Operator::Neq) {
                    return Err(unsupported());
                }
                (Ok(literal::string(raw)), None)
            }
            QuestionType::Date => (literal::date(raw).map(literal::date_key), Some("%Y%m%d")),
            QuestionType::Time => (literal::time(raw).map(literal::time_key), Some("%H%M")),
            QuestionType::Datetime => (
                literal::datetime(raw).map(literal::datetime_key),
                Some("%Y%m%d%H%M"),
            ),
            QuestionType::SelectOne | QuestionType::SelectMultiple => {
                return Err(malformed(OperandProblem::ValueOnSelect));
            }
            QuestionType::Location | QuestionType::Image | QuestionType::Audio | QuestionType::Video => {
                return Err(CompileError::UnsupportedQuestionType {
                    condition: code.clone(),
                    question_type,
                });
            }
        };
        let value = value.map_err(|e| malformed(e.into()))?;

        let address = self.resolve(host, left)?;
        Ok(format.map_or_else(
            || format!("{address} {symbol} {value}"),
            |format| format!("format-date({address}, '{format}') {symbol} {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::{
        compile::{LiteralError, fixtures::id},
        domain::{Config, FormTree, OptionCatalog, OptionSet},
    };

    struct Fixture {
        tree: FormTree,
        catalog: OptionCatalog,
    }

    impl Fixture {
        fn new() -> Self {
            let yes_no = OptionSet::builder("Yes/No")
                .option("on42", "Yes")
                .option("on43", "No")
                .build()
                .unwrap();
            let geography = OptionSet::builder("Geography")
                .open("on1", "Canada")
                .option("on2", "Ontario")
                .close()
                .build()
                .unwrap();

            let tree = FormTree::builder("form")
                .select("q7", QuestionType::SelectOne, yes_no.id())
                .select("q8", QuestionType::SelectMultiple, yes_no.id())
                .question("q3", QuestionType::Integer)
                .question("q_dec", QuestionType::Decimal)
                .question("q_date", QuestionType::Date)
                .question("q_time", QuestionType::Time)
                .question("q_dt", QuestionType::Datetime)
                .question("q_text", QuestionType::Text)
                .question("q_loc", QuestionType::Location)
                .question("q_bare", QuestionType::SelectOne)
                .select("q_geo", QuestionType::SelectOne, geography.id())
                .repeat_group("grp1")
                .question("q2", QuestionType::Text)
                .select("q_geo2", QuestionType::SelectOne, geography.id())
                .end()
                .build()
                .unwrap();

            Self {
                tree,
                catalog: [yes_no, geography].into_iter().collect(),
            }
        }

        fn id(&self, code: &str) -> NodeId {
            id(&self.tree, code)
        }

        fn option(&self, set: &str, token: &str) -> OptionNodeId {
            self.catalog
                .find_by_name(set)
                .and_then(|set| set.find_by_token(token))
                .unwrap()
                .id()
        }

        fn compile(&self, host: &str, condition: &Condition) -> Result<Compiled, CompileError> {
            Compiler::new(&self.tree, &self.catalog).compile_condition(self.id(host), condition)
        }

        fn value(&self, code: &str, op: Operator, value: &str) -> Result<Compiled, CompileError> {
            self.compile(code, &Condition::value(self.id(code), op, value))
        }

        fn choice(&self, code: &str, op: Operator, set: &str, token: &str) -> Result<Compiled, CompileError> {
            self.compile(code, &Condition::option(self.id(code), op, self.option(set, token)))
        }
    }

    #[test_case("q7", Operator::Eq, "selected(/data/q7, 'on42')"; "select one eq")]
    #[test_case("q7", Operator::Neq, "not(selected(/data/q7, 'on42'))"; "select one neq")]
    #[test_case("q8", Operator::Inc, "selected(/data/q8, 'on42')"; "select multiple inc")]
    #[test_case("q8", Operator::Ninc, "not(selected(/data/q8, 'on42'))"; "select multiple ninc")]
    fn selections(code: &str, op: Operator, expected: &str) {
        let fixture = Fixture::new();
        let compiled = fixture.choice(code, op, "Yes/No", "on42").unwrap();
        assert_eq!(compiled, Compiled::Expression(expected.to_string()));
    }

    #[test_case("q3", Operator::Eq, "5", "/data/q3 = 5"; "integer eq")]
    #[test_case("q3", Operator::Geq, "-2", "/data/q3 >= -2"; "integer geq")]
    #[test_case("q_dec", Operator::Lt, "2.5", "/data/q_dec < 2.5"; "decimal lt")]
    #[test_case("q_text", Operator::Neq, "foo", "/data/q_text != 'foo'"; "text neq")]
    #[test_case("q_text", Operator::Eq, "it's", r#"/data/q_text = "it's""#; "text with quote")]
    #[test_case("q_date", Operator::Geq, "1981-10-26", "format-date(/data/q_date, '%Y%m%d') >= '19811026'"; "date geq")]
    #[test_case("q_time", Operator::Leq, "3:56pm", "format-date(/data/q_time, '%H%M') <= '1556'"; "time leq")]
    #[test_case("q_dt", Operator::Gt, "Dec 3 2003 11:56", "format-date(/data/q_dt, '%Y%m%d%H%M') > '200312031156'"; "datetime gt")]
    fn comparisons(code: &str, op: Operator, value: &str, expected: &str) {
        let fixture = Fixture::new();
        let compiled = fixture.value(code, op, value).unwrap();
        assert_eq!(compiled.as_str(), expected);
        assert!(compiled.is_implemented());
    }

    #[test]
    fn conditions_inside_a_group_use_relative_addresses() {
        let fixture = Fixture::new();
        let compiled = fixture.value("q2", Operator::Eq, "foo").unwrap();
        assert_eq!(compiled.as_str(), "../q2 = 'foo'");
    }

    #[test]
    fn host_in_group_reaches_top_level_question_absolutely() {
        let fixture = Fixture::new();
        let condition = Condition::value(fixture.id("q3"), Operator::Gt, "1");
        let compiled = fixture.compile("q2", &condition).unwrap();
        assert_eq!(compiled.as_str(), "/data/q3 > 1");
    }

    #[test_case("q_geo", "on1", "selected(/data/q_geo_1, 'on1')"; "first level")]
    #[test_case("q_geo", "on2", "selected(/data/q_geo_2, 'on2')"; "second level")]
    #[test_case("q_geo2", "on2", "selected(../q_geo2_2, 'on2')"; "second level in group")]
    fn multilevel_selections_address_level_subquestions(code: &str, token: &str, expected: &str) {
        let fixture = Fixture::new();
        let compiled = fixture.choice(code, Operator::Eq, "Geography", token).unwrap();
        assert_eq!(compiled.as_str(), expected);
    }

    #[test]
    fn multilevel_selections_only_support_equality() {
        let fixture = Fixture::new();
        let err = fixture
            .choice("q_geo", Operator::Neq, "Geography", "on2")
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnsupportedOperator {
                operator: Operator::Neq,
                ..
            }
        ));
    }

    #[test_case("q3", Operator::Inc; "integer inc")]
    #[test_case("q_text", Operator::Gt; "text gt")]
    #[test_case("q_date", Operator::Ninc; "date ninc")]
    fn operators_outside_the_type_are_rejected(code: &str, op: Operator) {
        let fixture = Fixture::new();
        let err = fixture.value(code, op, "1").unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedOperator { operator, .. } if operator == op));
    }

    #[test]
    fn comparison_operators_do_not_apply_to_selections() {
        let fixture = Fixture::new();
        let err = fixture.choice("q7", Operator::Gt, "Yes/No", "on42").unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedOperator { .. }));
    }

    #[test]
    fn unparsable_literals_are_malformed_operands() {
        let fixture = Fixture::new();
        let err = fixture.value("q3", Operator::Eq, "five").unwrap_err();
        assert_eq!(
            err,
            CompileError::MalformedOperand {
                condition: Code::new("q3".to_string()).unwrap(),
                problem: OperandProblem::InvalidLiteral(LiteralError::Integer("five".to_string())),
            }
        );
    }

    #[test]
    fn options_from_another_set_are_malformed_operands() {
        let fixture = Fixture::new();
        let foreign = fixture.option("Geography", "on1");
        let condition = Condition::option(fixture.id("q7"), Operator::Eq, foreign);
        let err = fixture.compile("q7", &condition).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MalformedOperand {
                problem: OperandProblem::UnknownOption(option),
                ..
            } if option == foreign
        ));
    }

    #[test]
    fn select_without_option_set_is_malformed() {
        let fixture = Fixture::new();
        let err = fixture.choice("q_bare", Operator::Eq, "Yes/No", "on42").unwrap_err();
        assert!(matches!(
            err,
            CompileError::MalformedOperand {
                problem: OperandProblem::NoOptionSet,
                ..
            }
        ));
    }

    #[test]
    fn operand_kind_must_match_question_type() {
        let fixture = Fixture::new();

        let err = fixture.value("q7", Operator::Eq, "Yes").unwrap_err();
        assert!(matches!(
            err,
            CompileError::MalformedOperand {
                problem: OperandProblem::ValueOnSelect,
                ..
            }
        ));

        let err = fixture.choice("q3", Operator::Eq, "Yes/No", "on42").unwrap_err();
        assert!(matches!(
            err,
            CompileError::MalformedOperand {
                problem: OperandProblem::OptionOnNonSelect(QuestionType::Integer),
                ..
            }
        ));
    }

    #[test]
    fn media_and_location_questions_cannot_be_tested() {
        let fixture = Fixture::new();
        let err = fixture.value("q_loc", Operator::Eq, "x").unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnsupportedQuestionType {
                question_type: QuestionType::Location,
                ..
            }
        ));
    }

    #[test]
    fn groups_cannot_be_the_left_question() {
        let fixture = Fixture::new();
        let condition = Condition::value(fixture.id("grp1"), Operator::Eq, "1");
        let err = fixture.compile("q3", &condition).unwrap_err();
        assert!(matches!(err, CompileError::NotAQuestion(code) if code.as_str() == "grp1"));
    }

    #[test]
    fn question_operands_compile_to_placeholder() {
        let fixture = Fixture::new();
        let condition = Condition::question(fixture.id("q3"), Operator::Eq, fixture.id("q_dec"));
        let compiled = fixture.compile("q3", &condition).unwrap();
        assert_eq!(compiled, Compiled::NotImplemented);
        assert_eq!(compiled.as_str(), "true()");
        assert!(!compiled.is_implemented());
    }

    #[test]
    fn strict_mode_rejects_question_operands() {
        let fixture = Fixture::new();
        let mut config = Config::default();
        config.strict = true;
        let compiler = Compiler::with_config(&fixture.tree, &fixture.catalog, &config);
        let condition = Condition::question(fixture.id("q3"), Operator::Eq, fixture.id("q_dec"));
        let err = compiler
            .compile_condition(fixture.id("q3"), &condition)
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::NotImplemented {
                condition: Code::new("q3".to_string()).unwrap()
            }
        );
    }

    #[test]
    fn question_operands_must_be_questions() {
        let fixture = Fixture::new();
        let condition = Condition::question(fixture.id("q3"), Operator::Eq, fixture.id("grp1"));
        let err = fixture.compile("q3", &condition).unwrap_err();
        assert_eq!(
            err,
            CompileError::NotAQuestion(Code::new("grp1".to_string()).unwrap())
        );
    }

    #[test]
    fn unknown_left_question_is_a_structural_error() {
        let fixture = Fixture::new();
        let condition = Condition::value(NodeId::new(), Operator::Eq, "1");
        let err = fixture.compile("q3", &condition).unwrap_err();
        assert!(matches!(err, CompileError::Structure(_)));
    }
}
