//! Stage 4b: type-checks procedure bodies against the symbol table
//! built by stage 3.

use crate::ast::*;
use crate::diag::{CompileError, CompileResult};
use crate::ir::symbol_table::{Entry, Scope, SymbolTable};
use crate::types::Type;
use std::rc::Rc;

/// Type-checks every procedure body in `program` against `global`.
pub fn check_bodies(program: &Program, global: &SymbolTable) -> CompileResult<()> {
    for decl in &program.0 {
        if let GlobalDecl::Procedure { name, body, .. } = decl {
            let local_table = match global.lookup_local(*name) {
                Some(Entry::Proc { local_table, .. }) => local_table,
                _ => unreachable!("table builder always enters a Proc entry for a procedure"),
            };
            let frames: Vec<&SymbolTable> = vec![global, local_table];
            let scope = Scope::new(&frames);
            for stmt in body {
                check_statement(&scope, stmt)?;
            }
        }
    }
    Ok(())
}

fn check_statement(scope: &Scope, stmt: &Statement) -> CompileResult<()> {
    match &stmt.kind {
        StatementKind::Empty => Ok(()),
        StatementKind::Compound(statements) => {
            for s in statements {
                check_statement(scope, s)?;
            }
            Ok(())
        }
        StatementKind::Assign { target, value } => {
            let target_ty = check_variable(scope, target)?;
            let value_ty = check_expression(scope, value)?;
            if target_ty != value_ty {
                return Err(CompileError::assignment_has_different_types(stmt.line));
            }
            if !target_ty.is_int() {
                return Err(CompileError::assignment_requires_integers(stmt.line));
            }
            Ok(())
        }
        StatementKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let cond_ty = check_expression(scope, condition)?;
            if !cond_ty.is_boolean() {
                return Err(CompileError::if_condition_must_be_boolean(stmt.line));
            }
            check_statement(scope, then_branch)?;
            check_statement(scope, else_branch)
        }
        StatementKind::While { condition, body } => {
            let cond_ty = check_expression(scope, condition)?;
            if !cond_ty.is_boolean() {
                return Err(CompileError::while_condition_must_be_boolean(stmt.line));
            }
            check_statement(scope, body)
        }
        StatementKind::Call { proc_name, args } => check_call(scope, *proc_name, args, stmt.line),
    }
}

fn check_call(
    scope: &Scope,
    proc_name: crate::ident::Identifier,
    args: &[Expression],
    line: u32,
) -> CompileResult<()> {
    let param_types = match scope.lookup(proc_name) {
        None => return Err(CompileError::undefined_procedure(line, &proc_name.to_string())),
        Some(Entry::Proc { param_types, .. }) => param_types,
        Some(_) => return Err(CompileError::call_of_non_procedure(line, &proc_name.to_string())),
    };

    if args.len() < param_types.len() {
        return Err(CompileError::too_few_arguments(line, &proc_name.to_string()));
    }
    if args.len() > param_types.len() {
        return Err(CompileError::too_many_arguments(line, &proc_name.to_string()));
    }

    for (i, (arg, param)) in args.iter().zip(param_types.iter()).enumerate() {
        let arg_ty = check_expression(scope, arg)?;
        if arg_ty != param.ty {
            return Err(CompileError::argument_type_mismatch(
                line,
                &proc_name.to_string(),
                i + 1,
            ));
        }
        if param.is_ref && !matches!(arg.kind, ExpressionKind::Var(_)) {
            return Err(CompileError::argument_must_be_a_variable(
                line,
                &proc_name.to_string(),
                i + 1,
            ));
        }
    }
    Ok(())
}

fn check_expression(scope: &Scope, expr: &Expression) -> CompileResult<Rc<Type>> {
    let ty = match &expr.kind {
        ExpressionKind::IntLiteral(_) => Type::int(),
        ExpressionKind::Var(var) => check_variable(scope, var)?,
        ExpressionKind::Binary(op, left, right) => {
            let left_ty = check_expression(scope, left)?;
            let right_ty = check_expression(scope, right)?;
            if left_ty != right_ty {
                return Err(CompileError::operator_different_types(expr.line));
            }
            if op.is_arithmetic() {
                if !left_ty.is_int() {
                    return Err(CompileError::arithmetic_operator_non_integer(expr.line));
                }
                Type::int()
            } else {
                debug_assert!(op.is_comparison());
                if !left_ty.is_int() {
                    return Err(CompileError::comparison_non_integer(expr.line));
                }
                Type::boolean()
            }
        }
    };
    expr.resolved.set(ty.clone());
    Ok(ty)
}

fn check_variable(scope: &Scope, var: &Variable) -> CompileResult<Rc<Type>> {
    let ty = match &var.kind {
        VariableKind::Named(name) => match scope.lookup(*name) {
            None => return Err(CompileError::undefined_variable(var.line, &name.to_string())),
            Some(Entry::Var { ty, .. }) => ty.clone(),
            Some(_) => return Err(CompileError::not_a_variable(var.line, &name.to_string())),
        },
        VariableKind::ArrayAccess(base, index) => {
            let base_ty = check_variable(scope, base)?;
            let index_ty = check_expression(scope, index)?;
            let element = match base_ty.element() {
                Some(element) => element.clone(),
                None => return Err(CompileError::indexing_non_array(var.line)),
            };
            if !index_ty.is_int() {
                return Err(CompileError::indexing_with_non_integer(var.line));
            }
            element
        }
    };
    var.resolved.set(ty.clone());
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::semantic::tablebuild::build_table;

    fn check(src: &str) -> CompileResult<()> {
        let tokens = tokenize(src).unwrap();
        let program = parse(&tokens).unwrap();
        let global = build_table(&program)?;
        check_bodies(&program, &global)
    }

    #[test]
    fn scenario_if_with_integer_condition_is_rejected() {
        let err = check("proc main() { if (1) { } }").unwrap_err();
        assert_eq!(err.code.code(), 110);
    }

    #[test]
    fn comparison_yields_boolean_and_is_accepted_by_if() {
        check("proc main() { if (1 = 1) { } }").unwrap();
    }

    #[test]
    fn call_arity_mismatch_is_rejected() {
        let err = check("proc p(i: int) { } proc main() { p(1, 2); }").unwrap_err();
        assert_eq!(err.code.code(), 117);
        let err = check("proc p(i: int) { } proc main() { p(); }").unwrap_err();
        assert_eq!(err.code.code(), 116);
    }

    #[test]
    fn reference_argument_must_be_a_variable() {
        let err = check("proc q(ref a: int) { } proc main() { q(1); }").unwrap_err();
        assert_eq!(err.code.code(), 115);
    }

    #[test]
    fn reference_argument_variable_is_accepted() {
        check("proc q(ref a: int) { } proc main() { var x: int; q(x); }").unwrap();
    }

    #[test]
    fn array_index_on_non_array_is_rejected() {
        let err = check("proc main() { var x: int; x[0] := 1; }").unwrap_err();
        assert_eq!(err.code.code(), 123);
    }

    #[test]
    fn non_array_base_is_reported_before_a_non_integer_index() {
        let err = check("proc main() { var x: int; var a: int; x[a = a] := 1; }").unwrap_err();
        assert_eq!(err.code.code(), 123);
    }

    #[test]
    fn array_index_with_non_integer_is_rejected() {
        let err =
            check("proc main() { var a: array [2] of int; a[a[0] = a[0]] := 1; }").unwrap_err();
        assert_eq!(err.code.code(), 124);
    }

    #[test]
    fn undefined_variable_is_rejected() {
        let err = check("proc main() { y := 1; }").unwrap_err();
        assert_eq!(err.code.code(), 121);
    }

    #[test]
    fn recursive_call_is_accepted() {
        check("proc main() { main(); }").unwrap();
    }
}
