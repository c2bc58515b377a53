//! Stage 3: populates the symbol table from global declarations.

use crate::ast::*;
use crate::diag::{CompileError, CompileResult};
use crate::ident::intern;
use crate::ir::symbol_table::{Entry, SymbolTable};
use crate::types::{ParamType, Type};
use std::rc::Rc;

/// Builds the global symbol table for `program`, entering every type
/// and procedure declaration and checking the `main` requirements.
/// Resolved types are written back into each [`TypeExpression`]'s
/// `resolved` cell as a side effect.
pub fn build_table(program: &Program) -> CompileResult<SymbolTable> {
    let mut global = crate::ir::initialize_global_table();

    for decl in &program.0 {
        match decl {
            GlobalDecl::Type {
                name, type_expr, line,
            } => {
                let ty = resolve_type_expression(type_expr, &global)?;
                if !global.enter(*name, Entry::Type(ty)) {
                    return Err(CompileError::redeclaration_as_type(*line, &name.to_string()));
                }
            }
            GlobalDecl::Procedure {
                name,
                params,
                locals,
                body: _,
                line,
            } => {
                let (local_table, param_types) = build_procedure_scope(params, locals, &global)?;
                let argument_area = param_types.len() as u32 * 4;
                let entry = Entry::Proc {
                    param_types,
                    local_table: Box::new(local_table),
                    argument_area,
                    localvar_area: 0,
                    outgoing_area: 0,
                    is_leaf: true,
                };
                if !global.enter(*name, entry) {
                    return Err(CompileError::redeclaration_as_procedure(
                        *line,
                        &name.to_string(),
                    ));
                }
            }
        }
    }

    check_main(&global)?;
    Ok(global)
}

fn build_procedure_scope(
    params: &[ParameterDecl],
    locals: &[VariableDecl],
    global: &SymbolTable,
) -> CompileResult<(SymbolTable, Vec<ParamType>)> {
    let mut local_table = SymbolTable::new();
    let mut param_types = Vec::new();

    for param in params {
        let ty = resolve_type_expression(&param.type_expr, global)?;
        if ty.is_array() && !param.is_reference {
            return Err(CompileError::must_be_a_reference_parameter(
                param.line,
                &param.name.to_string(),
            ));
        }
        param_types.push(ParamType {
            ty: ty.clone(),
            is_ref: param.is_reference,
            offset: 0,
        });
        let entry = Entry::Var {
            ty,
            is_ref: param.is_reference,
            is_param: true,
            offset: 0,
        };
        if !local_table.enter(param.name, entry) {
            return Err(CompileError::redeclaration_as_parameter(
                param.line,
                &param.name.to_string(),
            ));
        }
    }

    for local in locals {
        let ty = resolve_type_expression(&local.type_expr, global)?;
        let entry = Entry::Var {
            ty,
            is_ref: false,
            is_param: false,
            offset: 0,
        };
        if !local_table.enter(local.name, entry) {
            return Err(CompileError::redeclaration_as_variable(
                local.line,
                &local.name.to_string(),
            ));
        }
    }

    Ok((local_table, param_types))
}

/// Resolves a [`TypeExpression`] against the global scope (SPL has no
/// locally-scoped type declarations), writing the result into the
/// node's `resolved` cell.
pub fn resolve_type_expression(
    te: &TypeExpression,
    global: &SymbolTable,
) -> CompileResult<Rc<Type>> {
    let ty = match &te.kind {
        TypeExpressionKind::Named(name) => match global.lookup_local(*name) {
            None => return Err(CompileError::undefined_type(te.line, &name.to_string())),
            Some(Entry::Type(ty)) => ty.clone(),
            Some(_) => return Err(CompileError::not_a_type(te.line, &name.to_string())),
        },
        TypeExpressionKind::ArrayOf(inner, length) => {
            let element = resolve_type_expression(inner, global)?;
            Rc::new(Type::array(element, *length))
        }
    };
    te.resolved.set(ty.clone());
    Ok(ty)
}

fn check_main(global: &SymbolTable) -> CompileResult<()> {
    match global.lookup_local(intern("main")) {
        None => Err(CompileError::main_is_missing()),
        Some(Entry::Proc { param_types, .. }) => {
            if !param_types.is_empty() {
                Err(CompileError::main_must_not_have_parameters())
            } else {
                Ok(())
            }
        }
        Some(_) => Err(CompileError::main_is_not_a_procedure()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn build(src: &str) -> CompileResult<SymbolTable> {
        let tokens = tokenize(src).unwrap();
        let program = parse(&tokens).unwrap();
        build_table(&program)
    }

    #[test]
    fn scenario_empty_main_with_unused_array_type() {
        let global = build("type t = array [3] of int; proc main() { }").unwrap();
        match global.lookup_local(intern("main")) {
            Some(Entry::Proc {
                argument_area,
                local_table,
                ..
            }) => {
                assert_eq!(*argument_area, 0);
                assert_eq!(local_table.entries().count(), 0);
            }
            _ => panic!("expected main"),
        }
    }

    #[test]
    fn scenario_reference_array_parameter() {
        let global = build(
            "proc q(ref a: array [2] of int) { } proc main() { var x: array [2] of int; q(x); }",
        )
        .unwrap();
        match global.lookup_local(intern("q")) {
            Some(Entry::Proc { param_types, .. }) => {
                assert_eq!(param_types.len(), 1);
                assert!(param_types[0].is_ref);
            }
            _ => panic!("expected q"),
        }
    }

    #[test]
    fn array_parameter_without_ref_is_rejected() {
        let err = build("proc p(a: array [2] of int) { } proc main() { }").unwrap_err();
        assert_eq!(err.code.code(), 104);
    }

    #[test]
    fn main_missing_is_rejected() {
        let err = build("proc p() { }").unwrap_err();
        assert_eq!(err.code.code(), 125);
    }

    #[test]
    fn main_with_parameters_is_rejected() {
        let err = build("proc main(x: int) { }").unwrap_err();
        assert_eq!(err.code.code(), 127);
    }

    #[test]
    fn type_referencing_previously_declared_named_type() {
        let global =
            build("type a = array [2] of int; type b = array [3] of a; proc main() { }").unwrap();
        match global.lookup_local(intern("b")) {
            Some(Entry::Type(ty)) => {
                assert!(ty.is_array());
                assert_eq!(ty.byte_size(), 3 * 2 * 4);
            }
            _ => panic!("expected type b"),
        }
    }

    #[test]
    fn duplicate_procedure_declaration_is_rejected() {
        let err = build("proc main() { } proc main() { }").unwrap_err();
        assert_eq!(err.code.code(), 105);
    }
}
