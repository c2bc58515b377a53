//! The closed AST node family produced by the parser and annotated by
//! the semantic stages.

use super::span::Line;
use crate::ident::Identifier;
use crate::types::Type;
use std::cell::RefCell;
use std::rc::Rc;

/// A lazily-filled type annotation slot, written once by the stages that
/// resolve types (table builder, body checker) and read afterwards by
/// the allocator, code generator, and pretty printer.
#[derive(Debug, Default)]
pub struct TypeCell(RefCell<Option<Rc<Type>>>);

impl TypeCell {
    pub fn empty() -> Self {
        Self(RefCell::new(None))
    }

    pub fn set(&self, ty: Rc<Type>) {
        *self.0.borrow_mut() = Some(ty);
    }

    pub fn get(&self) -> Rc<Type> {
        self.0
            .borrow()
            .clone()
            .expect("type queried before semantic analysis resolved it")
    }

    pub fn try_get(&self) -> Option<Rc<Type>> {
        self.0.borrow().clone()
    }
}

impl PartialEq for TypeCell {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}
impl Eq for TypeCell {}
impl Clone for TypeCell {
    fn clone(&self) -> Self {
        Self(RefCell::new(self.0.borrow().clone()))
    }
}

/// A reference to a named or constructed type, as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpressionKind {
    Named(Identifier),
    ArrayOf(Box<TypeExpression>, u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpression {
    pub kind: TypeExpressionKind,
    pub line: Line,
    pub resolved: TypeCell,
}

impl TypeExpression {
    pub fn named(name: Identifier, line: Line) -> Self {
        Self {
            kind: TypeExpressionKind::Named(name),
            line,
            resolved: TypeCell::empty(),
        }
    }

    pub fn array_of(inner: TypeExpression, length: u32, line: Line) -> Self {
        Self {
            kind: TypeExpressionKind::ArrayOf(Box::new(inner), length),
            line,
            resolved: TypeCell::empty(),
        }
    }
}

/// A reference to a storage location: a named variable or an indexed
/// array element (possibly nested).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableKind {
    Named(Identifier),
    ArrayAccess(Box<Variable>, Box<Expression>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub kind: VariableKind,
    pub line: Line,
    pub resolved: TypeCell,
}

impl Variable {
    pub fn named(name: Identifier, line: Line) -> Self {
        Self {
            kind: VariableKind::Named(name),
            line,
            resolved: TypeCell::empty(),
        }
    }

    pub fn array_access(base: Variable, index: Expression, line: Line) -> Self {
        Self {
            kind: VariableKind::ArrayAccess(Box::new(base), Box::new(index)),
            line,
            resolved: TypeCell::empty(),
        }
    }
}

/// A binary operator. The first six are comparisons (result type
/// `boolean`); the last four are arithmetic (result type `int`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Equ,
    Neq,
    Lst,
    Lse,
    Grt,
    Gre,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Equ | BinOp::Neq | BinOp::Lst | BinOp::Lse | BinOp::Grt | BinOp::Gre
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Equ => "=",
            BinOp::Neq => "#",
            BinOp::Lst => "<",
            BinOp::Lse => "<=",
            BinOp::Grt => ">",
            BinOp::Gre => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionKind {
    Binary(BinOp, Box<Expression>, Box<Expression>),
    IntLiteral(i64),
    Var(Box<Variable>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub line: Line,
    pub resolved: TypeCell,
}

impl Expression {
    pub fn int_literal(value: i64, line: Line) -> Self {
        Self {
            kind: ExpressionKind::IntLiteral(value),
            line,
            resolved: TypeCell::empty(),
        }
    }

    pub fn var(variable: Variable, line: Line) -> Self {
        Self {
            kind: ExpressionKind::Var(Box::new(variable)),
            line,
            resolved: TypeCell::empty(),
        }
    }

    pub fn binary(op: BinOp, left: Expression, right: Expression, line: Line) -> Self {
        Self {
            kind: ExpressionKind::Binary(op, Box::new(left), Box::new(right)),
            line,
            resolved: TypeCell::empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Empty,
    Compound(Vec<Statement>),
    Assign {
        target: Variable,
        value: Expression,
    },
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Box<Statement>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    Call {
        proc_name: Identifier,
        args: Vec<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: Line,
}

impl Statement {
    pub fn empty(line: Line) -> Self {
        Self {
            kind: StatementKind::Empty,
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDecl {
    pub name: Identifier,
    pub type_expr: TypeExpression,
    pub is_reference: bool,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDecl {
    pub name: Identifier,
    pub type_expr: TypeExpression,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalDecl {
    Type {
        name: Identifier,
        type_expr: TypeExpression,
        line: Line,
    },
    Procedure {
        name: Identifier,
        params: Vec<ParameterDecl>,
        locals: Vec<VariableDecl>,
        body: Vec<Statement>,
        line: Line,
    },
}

impl GlobalDecl {
    pub fn name(&self) -> Identifier {
        match self {
            GlobalDecl::Type { name, .. } => *name,
            GlobalDecl::Procedure { name, .. } => *name,
        }
    }

    pub fn line(&self) -> Line {
        match self {
            GlobalDecl::Type { line, .. } => *line,
            GlobalDecl::Procedure { line, .. } => *line,
        }
    }
}

/// A complete SPL source file: an ordered list of global declarations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program(pub Vec<GlobalDecl>);
