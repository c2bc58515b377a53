//! Fatal-first-error diagnostics.
//!
//! Unlike accumulate-then-report diagnostic models, every SPL compile
//! error is fatal: the first one encountered halts the pipeline. Each
//! carries the exact numeric exit code and message text of the rule it
//! violates.

use miette::{Diagnostic, LabeledSpan, Severity};
use std::fmt;

/// The exit-code taxonomy. Numeric values match the ones the pipeline
/// process exits with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Host,
    Lexical,
    Syntax,
    UndefinedType,
    NotAType,
    RedeclarationAsType,
    MustBeAReferenceParameter,
    RedeclarationAsProcedure,
    RedeclarationAsParameter,
    RedeclarationAsVariable,
    AssignmentHasDifferentTypes,
    AssignmentRequiresIntegers,
    IfConditionMustBeBoolean,
    WhileConditionMustBeBoolean,
    UndefinedProcedure,
    CallOfNonProcedure,
    ArgumentTypeMismatch,
    ArgumentMustBeAVariable,
    TooFewArguments,
    TooManyArguments,
    OperatorDifferentTypes,
    ComparisonNonInteger,
    ArithmeticOperatorNonInteger,
    UndefinedVariable,
    NotAVariable,
    IndexingNonArray,
    IndexingWithNonInteger,
    MainIsMissing,
    MainIsNotAProcedure,
    MainMustNotHaveParameters,
    RegisterOverflow,
}

impl ExitCode {
    pub const fn code(self) -> i32 {
        match self {
            ExitCode::Host => 1,
            ExitCode::Lexical => 99,
            ExitCode::Syntax => 100,
            ExitCode::UndefinedType => 101,
            ExitCode::NotAType => 102,
            ExitCode::RedeclarationAsType => 103,
            ExitCode::MustBeAReferenceParameter => 104,
            ExitCode::RedeclarationAsProcedure => 105,
            ExitCode::RedeclarationAsParameter => 106,
            ExitCode::RedeclarationAsVariable => 107,
            ExitCode::AssignmentHasDifferentTypes => 108,
            ExitCode::AssignmentRequiresIntegers => 109,
            ExitCode::IfConditionMustBeBoolean => 110,
            ExitCode::WhileConditionMustBeBoolean => 111,
            ExitCode::UndefinedProcedure => 112,
            ExitCode::CallOfNonProcedure => 113,
            ExitCode::ArgumentTypeMismatch => 114,
            ExitCode::ArgumentMustBeAVariable => 115,
            ExitCode::TooFewArguments => 116,
            ExitCode::TooManyArguments => 117,
            ExitCode::OperatorDifferentTypes => 118,
            ExitCode::ComparisonNonInteger => 119,
            ExitCode::ArithmeticOperatorNonInteger => 120,
            ExitCode::UndefinedVariable => 121,
            ExitCode::NotAVariable => 122,
            ExitCode::IndexingNonArray => 123,
            ExitCode::IndexingWithNonInteger => 124,
            ExitCode::MainIsMissing => 125,
            ExitCode::MainIsNotAProcedure => 126,
            ExitCode::MainMustNotHaveParameters => 127,
            ExitCode::RegisterOverflow => 140,
        }
    }
}

/// A single fatal compile error: the code the process exits with, the
/// line it was raised on (if any), and the rendered message.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub code: ExitCode,
    pub line: Option<u32>,
    pub message: String,
}

impl CompileError {
    fn new(code: ExitCode, line: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            code,
            line,
            message: message.into(),
        }
    }

    pub fn host(message: impl Into<String>) -> Self {
        Self::new(ExitCode::Host, None, message)
    }

    pub fn lexical(line: u32, message: impl Into<String>) -> Self {
        Self::new(ExitCode::Lexical, Some(line), message)
    }

    pub fn syntax(line: u32, message: impl Into<String>) -> Self {
        Self::new(ExitCode::Syntax, Some(line), message)
    }

    pub fn undefined_type(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::UndefinedType,
            Some(line),
            format!("type '{name}' is not defined"),
        )
    }

    pub fn not_a_type(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::NotAType,
            Some(line),
            format!("'{name}' is not a type"),
        )
    }

    pub fn redeclaration_as_type(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::RedeclarationAsType,
            Some(line),
            format!("redeclaration of '{name}' as type"),
        )
    }

    pub fn must_be_a_reference_parameter(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::MustBeAReferenceParameter,
            Some(line),
            format!("array parameter '{name}' must be a reference parameter"),
        )
    }

    pub fn redeclaration_as_procedure(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::RedeclarationAsProcedure,
            Some(line),
            format!("redeclaration of '{name}' as procedure"),
        )
    }

    pub fn redeclaration_as_parameter(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::RedeclarationAsParameter,
            Some(line),
            format!("redeclaration of '{name}' as parameter"),
        )
    }

    pub fn redeclaration_as_variable(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::RedeclarationAsVariable,
            Some(line),
            format!("redeclaration of '{name}' as variable"),
        )
    }

    pub fn assignment_has_different_types(line: u32) -> Self {
        Self::new(
            ExitCode::AssignmentHasDifferentTypes,
            Some(line),
            "assignment has different types on left and right side",
        )
    }

    pub fn assignment_requires_integers(line: u32) -> Self {
        Self::new(
            ExitCode::AssignmentRequiresIntegers,
            Some(line),
            "assignment requires integer types on both sides",
        )
    }

    pub fn if_condition_must_be_boolean(line: u32) -> Self {
        Self::new(
            ExitCode::IfConditionMustBeBoolean,
            Some(line),
            "if condition must have type boolean",
        )
    }

    pub fn while_condition_must_be_boolean(line: u32) -> Self {
        Self::new(
            ExitCode::WhileConditionMustBeBoolean,
            Some(line),
            "while condition must have type boolean",
        )
    }

    pub fn undefined_procedure(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::UndefinedProcedure,
            Some(line),
            format!("procedure '{name}' is not defined"),
        )
    }

    pub fn call_of_non_procedure(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::CallOfNonProcedure,
            Some(line),
            format!("'{name}' is not a procedure"),
        )
    }

    pub fn argument_type_mismatch(line: u32, name: &str, arg_index: usize) -> Self {
        Self::new(
            ExitCode::ArgumentTypeMismatch,
            Some(line),
            format!("argument {arg_index} of call to '{name}' has wrong type"),
        )
    }

    pub fn argument_must_be_a_variable(line: u32, name: &str, arg_index: usize) -> Self {
        Self::new(
            ExitCode::ArgumentMustBeAVariable,
            Some(line),
            format!("argument {arg_index} of call to '{name}' must be a variable"),
        )
    }

    pub fn too_few_arguments(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::TooFewArguments,
            Some(line),
            format!("too few arguments in call to '{name}'"),
        )
    }

    pub fn too_many_arguments(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::TooManyArguments,
            Some(line),
            format!("too many arguments in call to '{name}'"),
        )
    }

    pub fn operator_different_types(line: u32) -> Self {
        Self::new(
            ExitCode::OperatorDifferentTypes,
            Some(line),
            "operands of operator have different types",
        )
    }

    pub fn comparison_non_integer(line: u32) -> Self {
        Self::new(
            ExitCode::ComparisonNonInteger,
            Some(line),
            "comparison requires integer operands",
        )
    }

    pub fn arithmetic_operator_non_integer(line: u32) -> Self {
        Self::new(
            ExitCode::ArithmeticOperatorNonInteger,
            Some(line),
            "arithmetic operator requires integer operands",
        )
    }

    pub fn undefined_variable(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::UndefinedVariable,
            Some(line),
            format!("variable '{name}' is not defined"),
        )
    }

    pub fn not_a_variable(line: u32, name: &str) -> Self {
        Self::new(
            ExitCode::NotAVariable,
            Some(line),
            format!("'{name}' is not a variable"),
        )
    }

    pub fn indexing_non_array(line: u32) -> Self {
        Self::new(
            ExitCode::IndexingNonArray,
            Some(line),
            "cannot index a non-array variable",
        )
    }

    pub fn indexing_with_non_integer(line: u32) -> Self {
        Self::new(
            ExitCode::IndexingWithNonInteger,
            Some(line),
            "array index must have type integer",
        )
    }

    pub fn main_is_missing() -> Self {
        Self::new(ExitCode::MainIsMissing, None, "procedure 'main' is missing")
    }

    pub fn main_is_not_a_procedure() -> Self {
        Self::new(
            ExitCode::MainIsNotAProcedure,
            None,
            "'main' must be a procedure",
        )
    }

    pub fn main_must_not_have_parameters() -> Self {
        Self::new(
            ExitCode::MainMustNotHaveParameters,
            None,
            "procedure 'main' must not have parameters",
        )
    }

    pub fn register_overflow(line: u32) -> Self {
        Self::new(
            ExitCode::RegisterOverflow,
            Some(line),
            "expression is too complex to evaluate with the available registers",
        )
    }

    /// Renders this error the way the original tool does:
    /// `An error occurred:\nLine N: message\n` (or without the line
    /// prefix when there is no line).
    pub fn render_plain(&self) -> String {
        match self.line {
            Some(line) => format!("An error occurred:\nLine {line}: {}\n", self.message),
            None => format!("An error occurred:\n{}\n", self.message),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompileError {}

impl Diagnostic for CompileError {
    fn severity(&self) -> Option<Severity> {
        Some(Severity::Error)
    }

    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code.code()))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
